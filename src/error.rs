use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by picofm.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A parameter value or increment did not fit the parameter's type or range.
    ParameterError(String),
    /// A patch document field is missing, malformed or out of range.
    PatchError(String),
    /// Patch storage could not be read or written.
    StorageError(String),
    /// A transient failure on the shared hardware bus (display, encoder).
    BusError(String),
    /// A sampled wave had an unexpected length.
    SampleError(usize),
    /// An event could not be queued.
    SendError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::PatchError(str) => write!(f, "Invalid patch: {str}"),
            Self::StorageError(str) => write!(f, "Patch storage failed: {str}"),
            Self::BusError(str) => write!(f, "Bus access failed: {str}"),
            Self::SampleError(len) => {
                write!(f, "Sampled wave has {len} samples, expected a full wavetable")
            }
            Self::SendError(str) => write!(f, "Failed to queue event: {str}"),
        }
    }
}
