//! Cooperative cancellation for in-flight decodes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DecodeError, Result};

/// Cancellation flag shared between a decode and its caller.
///
/// Cloning the token shares the underlying flag. The decoder polls the flag
/// between load commands and between batches of symbol rows; once set, the
/// decode returns [`DecodeError::Cancelled`] and all partial state is
/// discarded. Timeouts are the caller's business: run the decode in a task
/// and cancel the token when the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the decode holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DecodeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_passes_check() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancelled_token_fails_check_from_clone() {
        let token = CancelToken::new();
        let shared = token.clone();
        token.cancel();
        assert!(shared.is_cancelled());
        assert!(matches!(shared.check(), Err(DecodeError::Cancelled)));
    }
}
