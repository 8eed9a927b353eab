//! Cooperative retry helper exposed to operation implementations.

use std::time::Duration;

/// Outcome of a [`retry`] loop that ran out of attempts without an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("exiting retry loop: attempts exhausted without a truthy result")]
pub struct RetryExhausted;

/// Error surfaced by [`retry`]: either the wrapped operation's own error, or
/// plain exhaustion when every attempt returned `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The wrapped operation raised an error that was not swallowed, or was
    /// still raising once attempts ran out.
    #[error(transparent)]
    Operation(E),
    /// Every attempt returned a falsy result; no error was ever raised.
    #[error(transparent)]
    Exhausted(#[from] RetryExhausted),
}

/// Polls `fn` until it returns `Ok(Some(_))` or `attempts` is exhausted.
///
/// Mirrors the retry contract plugin authors rely on: between attempts the
/// helper sleeps cooperatively for `interval`, and any error not matched by
/// `should_swallow` aborts the retry loop immediately.
///
/// # Errors
///
/// Returns [`RetryError::Exhausted`] if `attempts` run out without ever
/// seeing a truthy result, or [`RetryError::Operation`] on an error
/// `should_swallow` rejects (or on the final attempt).
pub async fn retry<F, Fut, T, E>(
    mut attempts: u32,
    interval: Duration,
    mut f: F,
    should_swallow: impl Fn(&E) -> bool,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    while attempts > 0 {
        attempts -= 1;
        match f().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) => {
                if attempts == 0 || !should_swallow(&err) {
                    return Err(RetryError::Operation(err));
                }
            }
        }
        if attempts > 0 {
            tokio::time::sleep(interval).await;
        }
    }
    Err(RetryError::Exhausted(RetryExhausted))
}
