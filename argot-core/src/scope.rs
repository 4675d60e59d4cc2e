//! Acquire/release discipline around a single dispatch.

use tracing::{debug, instrument};

use crate::error::{BoxError, DispatchError, Result};

/// A resource that must be opened before a dispatch and released after it.
///
/// Both hooks default to no-ops, so implementors only override what they
/// need.
///
/// # Examples
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use argot_core::{DispatchError, Scope, with_scope};
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl Scope for Counter {
///     fn exit(&self, _failure: Option<&DispatchError>) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let counter = Counter::default();
/// let value = with_scope(Some(&counter), "demo", || Ok(5))?;
/// assert_eq!(value, 5);
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// # Ok::<(), DispatchError>(())
/// ```
pub trait Scope: Send + Sync {
    /// Called before parsing and invocation.
    ///
    /// # Errors
    /// A failure aborts the dispatch before anything runs; [`Scope::exit`]
    /// is not called.
    fn enter(&self) -> core::result::Result<(), BoxError> {
        Ok(())
    }

    /// Called once the dispatch finished. `failure` carries the error that
    /// is about to propagate, or `None` on success.
    fn exit(&self, _failure: Option<&DispatchError>) {}
}

/// Runs `body` between `scope.enter()` and `scope.exit(..)`.
///
/// Exit always runs once enter succeeded, and the original error is
/// returned unchanged afterwards. Without a scope, `body` runs bare.
///
/// # Errors
/// Returns [`DispatchError::ScopeEnter`] when the scope refuses to open, and
/// otherwise whatever `body` returns.
#[instrument(name = "scope.with_scope", skip(scope, body), fields(scoped = scope.is_some()))]
pub fn with_scope<T>(
    scope: Option<&dyn Scope>,
    target: &str,
    body: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let Some(scope) = scope else {
        return body();
    };

    scope.enter().map_err(|source| DispatchError::ScopeEnter {
        target: target.to_owned(),
        source,
    })?;
    debug!("scope entered");

    let outcome = body();
    scope.exit(outcome.as_ref().err());
    debug!(failed = outcome.is_err(), "scope released");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use crate::error::DispatchErrorCode;

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
        refuse: bool,
    }

    impl Journal {
        fn entries(&self) -> Vec<String> {
            self.entries.lock().expect("journal lock").clone()
        }

        fn push(&self, entry: String) {
            self.entries.lock().expect("journal lock").push(entry);
        }
    }

    impl Scope for Journal {
        fn enter(&self) -> core::result::Result<(), BoxError> {
            if self.refuse {
                return Err("locked".into());
            }
            self.push("enter".to_owned());
            Ok(())
        }

        fn exit(&self, failure: Option<&DispatchError>) {
            let entry = match failure {
                Some(err) => format!("exit:{}", err.code()),
                None => "exit".to_owned(),
            };
            self.push(entry);
        }
    }

    #[test]
    fn success_enters_then_exits() {
        let journal = Journal::default();
        let value = with_scope(Some(&journal), "t", || {
            journal.push("body".to_owned());
            Ok(1)
        })
        .expect("body succeeds");
        assert_eq!(value, 1);
        assert_eq!(journal.entries(), ["enter", "body", "exit"]);
    }

    #[test]
    fn failure_is_reported_to_exit_and_reraised() {
        let journal = Journal::default();
        let err = with_scope(Some(&journal), "t", || -> Result<()> {
            Err(DispatchError::CollidingKeywords {
                names: vec!["x".into()],
            })
        })
        .expect_err("body fails");
        assert_eq!(err.code(), DispatchErrorCode::CollidingKeywords);
        assert_eq!(
            journal.entries(),
            ["enter", "exit:DISPATCH_COLLIDING_KEYWORDS"]
        );
    }

    #[test]
    fn refused_enter_skips_body_and_exit() {
        let journal = Journal {
            refuse: true,
            ..Journal::default()
        };
        let err = with_scope(Some(&journal), "t", || Ok(()))
            .expect_err("enter refuses");
        assert!(matches!(err, DispatchError::ScopeEnter { ref target, .. } if target == "t"));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn missing_scope_runs_body_directly() {
        let value = with_scope(None, "t", || Ok("bare")).expect("body succeeds");
        assert_eq!(value, "bare");
    }
}
