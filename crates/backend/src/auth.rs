use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct Credential {
    bearer: Option<String>,
    invalidated: bool,
}

/// Explicitly constructed authentication context shared by one user session.
///
/// Cloning is cheap and clones observe the same credential, so the HTTP client
/// and the exam controller agree on whether the session is still valid.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Credential>>,
}

impl SessionContext {
    #[must_use]
    pub fn new(bearer: Option<String>) -> Self {
        let bearer = bearer.filter(|token| !token.trim().is_empty());
        Self {
            inner: Arc::new(RwLock::new(Credential {
                bearer,
                invalidated: false,
            })),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.bearer.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.bearer.is_some() && !guard.invalidated
    }

    /// Drops the credential after the backend rejected it.
    ///
    /// Returns `true` only for the call that actually invalidated the session.
    pub fn invalidate(&self) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.invalidated {
            return false;
        }
        guard.bearer = None;
        guard.invalidated = true;
        tracing::warn!("backend rejected credential; session invalidated");
        true
    }

    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.invalidated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_anonymous() {
        let ctx = SessionContext::new(Some("  ".into()));
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.bearer_token(), None);
    }

    #[test]
    fn invalidation_is_shared_between_clones() {
        let ctx = SessionContext::new(Some("secret".into()));
        let clone = ctx.clone();
        assert!(clone.is_authenticated());

        assert!(ctx.invalidate());
        assert!(!ctx.invalidate());
        assert!(clone.is_invalidated());
        assert_eq!(clone.bearer_token(), None);
    }
}
