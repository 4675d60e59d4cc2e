//! Resolves a command token against the names a container exposes.

use tracing::trace;

use crate::error::{DispatchError, Result};

/// Maps `token` to one of `known`, accepting unambiguous prefixes.
///
/// An exact match always wins, even when the token also prefixes other
/// names. Otherwise a single prefix match is returned, and no match yields
/// `Ok(None)` so the caller can consult a fallback.
///
/// # Errors
/// Returns [`DispatchError::AmbiguousCommand`] when two or more names start
/// with `token` and none equals it.
///
/// # Examples
/// ```
/// use argot_core::resolve;
///
/// let names = ["push", "pull", "pull-request"];
/// assert_eq!(resolve("push", names)?, Some("push"));
/// assert_eq!(resolve("pull-r", names)?, Some("pull-request"));
/// assert_eq!(resolve("fetch", names)?, None);
/// assert!(resolve("pu", names).is_err());
/// # Ok::<(), argot_core::DispatchError>(())
/// ```
pub fn resolve<'a, I>(token: &str, known: I) -> Result<Option<&'a str>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates = Vec::new();
    for name in known {
        if name == token {
            trace!(token, "exact command match");
            return Ok(Some(name));
        }
        if name.starts_with(token) {
            candidates.push(name);
        }
    }

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => {
            trace!(token, command = *only, "prefix command match");
            Ok(Some(*only))
        }
        _ => Err(DispatchError::AmbiguousCommand {
            token: token.to_owned(),
            candidates: candidates.into_iter().map(ToOwned::to_owned).collect(),
        }),
    }
}
