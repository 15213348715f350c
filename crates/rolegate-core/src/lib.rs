//! # rolegate-core
//!
//! The interception core of ROLEGATE, decoupled from any DI container or
//! proxy mechanism.
//!
//! This crate provides:
//! - The collaborator traits (`AuthorizationManager`, `RuleResolver`,
//!   `DeclarationSource`, `SecurityContext`, `ObservationSink`)
//! - `MethodInterceptor`, which wires them together around a guarded call
//! - Static and thread-local `SecurityContext` implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rolegate_core::{MethodInterceptor, StaticSecurityContext};
//!
//! let balance = interceptor.invoke(&key, &ctx, || ledger.balance(account))?;
//! ```

pub mod context;
pub mod interceptor;
pub mod traits;

pub use context::{StaticSecurityContext, ThreadLocalSecurityContext};
pub use interceptor::{Evaluation, MethodInterceptor};
