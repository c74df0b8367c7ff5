//! Result type alias for cascade operations

use crate::error::CascadeError;

/// Standard Result type for cascade operations
pub type Result<T> = std::result::Result<T, CascadeError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Log the error and continue with None
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn log_and_continue(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!("{}", err);
                None
            }
        }
    }
}
