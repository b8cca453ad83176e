//! Autosave constants.

use std::time::Duration;

/// Quiet period after the last edit before a write is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
