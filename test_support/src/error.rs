//! Error formatting for stable assertions.

use std::error::Error;

/// Render an error and its sources, outermost first, joined by `": "`.
///
/// ```
/// use test_support::error::display_error_chain;
///
/// let err = std::io::Error::other("oops");
/// assert_eq!(display_error_chain(&err), "oops");
/// ```
pub fn display_error_chain(e: &(dyn Error + 'static)) -> String {
    let mut messages = Vec::new();
    let mut current = Some(e);
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages.join(": ")
}
