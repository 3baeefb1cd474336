//! # Core Error Types
//!
//! Errors raised by the handle layer. Absent slot map lookups are not
//! errors; they return `None`.

use thiserror::Error;

use crate::memory::SlotMapHandle;

/// Errors that can occur when working with shared handles.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    /// A weak handle was promoted after its last strong reference dropped.
    #[error("cannot promote {handle}: resource already destroyed")]
    Expired {
        /// The handle that could not be promoted.
        handle: SlotMapHandle,
    },
}

/// Result type for handle operations.
pub type HandleResult<T> = Result<T, HandleError>;
