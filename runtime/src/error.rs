//! Error types for the Store runtime.

use storelet_core::AdapterError;
use thiserror::Error;

/// Errors that can occur while assembling or reading a
/// [`Store`](crate::Store).
///
/// All variants are developer-facing construction-time conditions; once a
/// store is built its transitions cannot fail, they can only be logged and
/// skipped.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An adapter-level error (unknown name, type mismatch, collision).
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// A source was bound to a reducer name the adapter does not define.
    #[error("cannot bind source '{source_name}': no reducer named '{reducer}'")]
    UnknownReducer {
        /// Diagnostic name of the offending source.
        source_name: String,
        /// The reducer name that was requested.
        reducer: String,
    },

    /// A source's payload type does not match the bound reducer's payload
    /// type.
    #[error(
        "cannot bind source '{source_name}' to reducer '{reducer}': \
         source carries {actual}, reducer expects {expected}"
    )]
    BindingTypeMismatch {
        /// Diagnostic name of the offending source.
        source_name: String,
        /// The reducer name the source was bound to.
        reducer: String,
        /// The payload type the reducer was registered with.
        expected: &'static str,
        /// The payload type the source carries.
        actual: &'static str,
    },
}
