//! Security context implementations.
//!
//! `StaticSecurityContext` carries its principal explicitly and is what most
//! callers and all tests use. `ThreadLocalSecurityContext` reads a principal
//! bound to the current thread by a scoped guard, for hosts whose
//! authentication layer sets the caller once per request thread.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use rolegate_contracts::principal::Principal;

use crate::traits::SecurityContext;

/// A security context holding a fixed principal (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticSecurityContext {
    principal: Option<Arc<Principal>>,
}

impl StaticSecurityContext {
    pub fn authenticated(principal: Principal) -> Self {
        Self { principal: Some(Arc::new(principal)) }
    }

    /// A context with no authenticated caller.
    pub fn unauthenticated() -> Self {
        Self { principal: None }
    }
}

impl From<Arc<Principal>> for StaticSecurityContext {
    fn from(principal: Arc<Principal>) -> Self {
        Self { principal: Some(principal) }
    }
}

impl SecurityContext for StaticSecurityContext {
    fn current_principal(&self) -> Option<Arc<Principal>> {
        self.principal.clone()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<Principal>>> = const { RefCell::new(None) };
}

/// Reads the principal bound to the calling thread.
///
/// ```rust,ignore
/// let _guard = ThreadLocalSecurityContext::enter(alice);
/// interceptor.invoke(&key, &ThreadLocalSecurityContext, || service.balance())?;
/// // guard dropped: the previous principal (if any) is restored
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalSecurityContext;

impl ThreadLocalSecurityContext {
    /// Bind `principal` to the current thread until the guard is dropped.
    pub fn enter(principal: Principal) -> ContextGuard {
        Self::enter_shared(Arc::new(principal))
    }

    /// Like `enter`, without cloning an already shared principal.
    pub fn enter_shared(principal: Arc<Principal>) -> ContextGuard {
        let previous = CURRENT.with(|cell| cell.borrow_mut().replace(principal));
        ContextGuard { previous, _not_send: PhantomData }
    }
}

impl SecurityContext for ThreadLocalSecurityContext {
    fn current_principal(&self) -> Option<Arc<Principal>> {
        CURRENT.with(|cell| cell.borrow().clone())
    }
}

/// Restores the thread's previous principal when dropped.
///
/// Tied to the thread that created it.
#[must_use = "the principal is unbound as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: Option<Arc<Principal>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|cell| *cell.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_context_returns_its_principal() {
        let ctx = StaticSecurityContext::authenticated(Principal::new("alice"));
        assert_eq!(ctx.current_principal().unwrap().name(), "alice");
        assert!(StaticSecurityContext::unauthenticated().current_principal().is_none());
    }

    #[test]
    fn thread_local_guard_restores_previous_principal() {
        let ctx = ThreadLocalSecurityContext;
        assert!(ctx.current_principal().is_none());

        {
            let _outer = ThreadLocalSecurityContext::enter(Principal::new("alice"));
            assert_eq!(ctx.current_principal().unwrap().name(), "alice");

            {
                let _inner = ThreadLocalSecurityContext::enter(Principal::new("bob"));
                assert_eq!(ctx.current_principal().unwrap().name(), "bob");
            }

            assert_eq!(ctx.current_principal().unwrap().name(), "alice");
        }

        assert!(ctx.current_principal().is_none());
    }

    #[test]
    fn thread_local_binding_is_not_visible_to_other_threads() {
        let _guard = ThreadLocalSecurityContext::enter(Principal::new("alice"));

        let seen = std::thread::spawn(|| ThreadLocalSecurityContext.current_principal().is_some())
            .join()
            .unwrap();
        assert!(!seen);
    }
}
