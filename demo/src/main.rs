//! ROLEGATE — Method Security Demo CLI
//!
//! Checks single calls against a TOML security policy, validates policies,
//! and runs the built-in account-service scenarios.
//!
//! Usage:
//!   cargo run -p demo -- scenarios
//!   cargo run -p demo -- validate --policy demo/policies/accounts.toml
//!   cargo run -p demo -- check --policy demo/policies/accounts.toml \
//!       --target AccountService::withdraw --principal tess --authority ROLE_TELLER

mod scenarios;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rolegate_contracts::{
    decision::Decision,
    error::{RolegateError, RolegateResult},
    principal::Principal,
    target::MethodKey,
};
use rolegate_core::StaticSecurityContext;
use rolegate_policy::{jsr250_interceptor, SecurityPolicy};

// ── CLI definition ────────────────────────────────────────────────────────────

/// ROLEGATE — declarative method authorization.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "ROLEGATE method-security demo",
    long_about = "Evaluates JSR-250 style declarations (roles allowed, permit-all, deny-all)\n\
                  against principals, and runs the account-service scenarios."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide a single call without running anything.
    Check {
        /// Path to the TOML security policy.
        #[arg(long)]
        policy: PathBuf,
        /// Guarded method as `Type::method`.
        #[arg(long)]
        target: String,
        /// Name of the calling principal.
        #[arg(long, default_value = "anonymous")]
        principal: String,
        /// Granted authority; repeat for several.
        #[arg(long = "authority")]
        authorities: Vec<String>,
        /// Call with no authenticated principal at all.
        #[arg(long, conflicts_with_all = ["principal", "authorities"])]
        unauthenticated: bool,
    },
    /// Load a policy and resolve every declared method.
    Validate {
        #[arg(long)]
        policy: PathBuf,
    },
    /// Run the built-in account-service scenarios.
    Scenarios,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-decision output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check { policy, target, principal, authorities, unauthenticated } => {
            run_check(&policy, &target, &principal, authorities, unauthenticated)
        }
        Command::Validate { policy } => run_validate(&policy),
        Command::Scenarios => scenarios::run_scenarios(),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_check(
    policy_path: &Path,
    target: &str,
    principal: &str,
    authorities: Vec<String>,
    unauthenticated: bool,
) -> RolegateResult<()> {
    let policy = SecurityPolicy::from_file(policy_path)?;
    let key = MethodKey::parse(target).ok_or_else(|| RolegateError::ConfigError {
        reason: format!("target '{target}' is not of the form Type::method"),
    })?;

    let ctx = if unauthenticated {
        StaticSecurityContext::unauthenticated()
    } else {
        StaticSecurityContext::authenticated(Principal::with_authorities(principal, authorities))
    };

    let interceptor = jsr250_interceptor(&policy.settings, Box::new(policy.declarations), None)?;
    let evaluation = interceptor.evaluate(&key, &ctx)?;

    println!("method    : {key}");
    match &evaluation.rule {
        Some(rule) => println!("rule      : {rule}"),
        None => println!("rule      : none (default: {:?})", interceptor.default_when_no_rule()),
    }
    println!("principal : {}", evaluation.principal.as_deref().unwrap_or("-"));
    match &evaluation.decision {
        Decision::Granted => println!("decision  : GRANTED"),
        Decision::Denied { reason } => println!("decision  : DENIED ({reason})"),
    }

    Ok(())
}

fn run_validate(policy_path: &Path) -> RolegateResult<()> {
    let policy = SecurityPolicy::from_file(policy_path)?;
    let types = policy.declarations.type_count();
    let methods = policy.declarations.method_count();
    let settings = policy.settings.clone();

    // Building the interceptor preloads every declared method.
    jsr250_interceptor(&settings, Box::new(policy.declarations), None)?;

    println!(
        "{}: OK ({} type declarations, {} method declarations, role prefix '{}', default {:?})",
        policy_path.display(),
        types,
        methods,
        settings.role_prefix,
        settings.default_when_no_rule
    );
    Ok(())
}
