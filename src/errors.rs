//! Error classification shared by every layer.

use std::time::Duration;

/// Trait for errors that can be classified as retryable or permanent.
///
/// The client never retries on its own. This trait tells callers which
/// failures are worth another attempt and, when the service said so, how
/// long to wait first.
///
/// 1. **Same request** (`is_retryable`): repeating the identical call may
///    succeed, e.g. after a network timeout or once a rate limit expires.
///
/// 2. **Fresh flow** (`should_retry_operation`): the current step is dead,
///    but starting over (requesting a new code) might work.
///
/// # Examples
///
/// ```rust
/// use wa_registration::RetryableError;
/// use std::time::Duration;
///
/// enum MyError {
///     Timeout,
///     WrongCode,
///     Blocked,
///     TooRecent(u64),
/// }
///
/// impl RetryableError for MyError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, MyError::Timeout | MyError::TooRecent(_))
///     }
///
///     fn should_retry_operation(&self) -> bool {
///         match self {
///             MyError::Timeout | MyError::TooRecent(_) => true,
///             MyError::WrongCode => true, // a new code might work
///             MyError::Blocked => false,  // number is banned
///         }
///     }
///
///     fn retry_after(&self) -> Option<Duration> {
///         match self {
///             MyError::TooRecent(secs) => Some(Duration::from_secs(*secs)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait RetryableError {
    /// Returns true if repeating the same request might succeed.
    ///
    /// Examples: network timeouts, expired rate limits.
    fn is_retryable(&self) -> bool;

    /// Returns true if restarting the flow might succeed.
    ///
    /// Default implementation returns the same as `is_retryable()`.
    fn should_retry_operation(&self) -> bool {
        self.is_retryable()
    }

    /// How long the service asked the caller to wait, if it said.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
