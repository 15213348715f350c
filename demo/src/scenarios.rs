//! Built-in account-service scenarios.
//!
//! `AccountService` guards each of its methods with a `MethodInterceptor`
//! configured from `policies/accounts.toml`. The scenario run exercises
//! every outcome the interceptor can produce and records each decision in a
//! hash-chained log behind a buffered sink.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::info;

use rolegate_audit::{BufferedSink, InMemoryDecisionLog};
use rolegate_contracts::{
    error::{RolegateError, RolegateResult},
    principal::Principal,
    target::MethodKey,
};
use rolegate_core::{traits::SecurityContext, MethodInterceptor, StaticSecurityContext};
use rolegate_policy::{jsr250_interceptor, SecurityPolicy};

const ACCOUNTS_POLICY: &str = include_str!("../policies/accounts.toml");

const SERVICE: &str = "AccountService";

/// Business errors of the account service. These pass through the
/// interceptor untouched.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unknown account '{0}'")]
    UnknownAccount(String),

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("ledger unavailable")]
    Unavailable,
}

/// A toy ledger whose methods are guarded by declarative rules.
pub struct AccountService {
    interceptor: MethodInterceptor,
    balances: Mutex<BTreeMap<String, u64>>,
}

impl AccountService {
    pub fn new(interceptor: MethodInterceptor) -> Self {
        let balances = [("acc-1", 100), ("acc-2", 2_500)]
            .into_iter()
            .map(|(id, amount)| (id.to_string(), amount))
            .collect();
        Self { interceptor, balances: Mutex::new(balances) }
    }

    fn key(method: &str) -> MethodKey {
        MethodKey::new(SERVICE, method)
    }

    pub fn balance(&self, ctx: &dyn SecurityContext, account: &str) -> RolegateResult<Result<u64, LedgerError>> {
        self.interceptor.invoke(&Self::key("balance"), ctx, || {
            let balances = self.balances.lock().map_err(|_| LedgerError::Unavailable)?;
            balances
                .get(account)
                .copied()
                .ok_or_else(|| LedgerError::UnknownAccount(account.to_string()))
        })
    }

    pub fn withdraw(
        &self,
        ctx: &dyn SecurityContext,
        account: &str,
        amount: u64,
    ) -> RolegateResult<Result<u64, LedgerError>> {
        self.interceptor.invoke(&Self::key("withdraw"), ctx, || {
            let mut balances = self.balances.lock().map_err(|_| LedgerError::Unavailable)?;
            let available = balances
                .get_mut(account)
                .ok_or_else(|| LedgerError::UnknownAccount(account.to_string()))?;
            if *available < amount {
                return Err(LedgerError::InsufficientFunds { requested: amount, available: *available });
            }
            *available -= amount;
            Ok(*available)
        })
    }

    pub fn audit_trail(&self, ctx: &dyn SecurityContext) -> RolegateResult<Result<Vec<(String, u64)>, LedgerError>> {
        self.interceptor.invoke(&Self::key("audit_trail"), ctx, || {
            let balances = self.balances.lock().map_err(|_| LedgerError::Unavailable)?;
            Ok(balances.iter().map(|(id, amount)| (id.clone(), *amount)).collect())
        })
    }

    pub fn close_account(&self, ctx: &dyn SecurityContext, account: &str) -> RolegateResult<bool> {
        self.interceptor.invoke(&Self::key("close_account"), ctx, || {
            self.balances
                .lock()
                .map(|mut balances| balances.remove(account).is_some())
                .unwrap_or(false)
        })
    }
}

fn user(name: &str, authorities: &[&str]) -> StaticSecurityContext {
    StaticSecurityContext::authenticated(Principal::with_authorities(name, authorities.iter().copied()))
}

/// Print one scenario line. Access failures are outcomes here, anything
/// else aborts the run.
fn report<T: std::fmt::Debug>(label: &str, result: RolegateResult<T>) -> RolegateResult<()> {
    match result {
        Ok(value) => println!("  [granted] {label:<44} -> {value:?}"),
        Err(e) if e.is_access_denied() => println!("  [denied ] {label:<44} -> {e}"),
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Run every account-service scenario and verify the decision log.
pub fn run_scenarios() -> RolegateResult<()> {
    let policy = SecurityPolicy::from_toml_str(ACCOUNTS_POLICY)?;
    let log = Arc::new(InMemoryDecisionLog::new("accounts-demo"));
    let sink = BufferedSink::spawn(Box::new(log.clone()), 256)?;
    let interceptor = jsr250_interceptor(&policy.settings, Box::new(policy.declarations), Some(Box::new(sink)))?;
    let service = AccountService::new(interceptor);

    let teller = user("tess", &["ROLE_TELLER"]);
    let guest = user("gus", &["ROLE_GUEST"]);
    let admin = user("ada", &["ROLE_ADMIN"]);
    let auditor = user("audra", &["ROLE_ADMIN", "ROLE_AUDITOR"]);
    let nobody = StaticSecurityContext::unauthenticated();

    println!("Account service scenarios");
    println!("-------------------------");
    report("teller withdraws 40 from acc-1", service.withdraw(&teller, "acc-1", 40))?;
    report("teller withdraws 500 from acc-1", service.withdraw(&teller, "acc-1", 500))?;
    report("guest withdraws 10 from acc-2", service.withdraw(&guest, "acc-2", 10))?;
    report("unauthenticated withdraw", service.withdraw(&nobody, "acc-2", 10))?;
    report("unauthenticated balance (permit-all)", service.balance(&nobody, "acc-1"))?;
    report("admin reads audit trail", service.audit_trail(&admin))?;
    report("admin+auditor reads audit trail", service.audit_trail(&auditor))?;
    report("admin closes acc-2 (deny-all)", service.close_account(&admin, "acc-2"))?;
    println!();

    // Dropping the service drops the buffered sink, flushing the recorder.
    drop(service);

    let exported = log.export_log()?;
    info!(events = exported.events.len(), "scenario run complete");
    if !log.verify_integrity() {
        return Err(RolegateError::ObservationFailed {
            reason: "decision log failed integrity verification".to_string(),
        });
    }
    println!(
        "Decision log '{}': {} events, chain intact, terminal hash {}",
        exported.log_id,
        exported.events.len(),
        exported.terminal_hash
    );
    println!();

    Ok(())
}
