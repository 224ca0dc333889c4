//! Error types and handling

use std::path::PathBuf;

use thiserror::Error;

use crate::format::FourCC;

#[derive(Debug, Error)]
pub enum Error {
    /// The native allocator returned a null resource
    #[error("out of memory")]
    Allocation,

    /// Attempt to wrap a null native image handle
    #[error("invalid (null) image handle")]
    InvalidHandle,

    /// The native reader returned no image
    #[error("failed to load image from {}", path.display())]
    Load { path: PathBuf },

    /// The native converter returned no image
    #[error("unsupported conversion from {from} to {to}")]
    Conversion { from: FourCC, to: FourCC },

    /// No pixel buffer has been installed
    #[error("image has no data")]
    NullBuffer,

    /// The image was already disposed
    #[error("image used after dispose")]
    UseAfterDispose,

    #[error("failed to dump image to {}: {source}", path.display())]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("invalid fourcc {0:?}")]
    InvalidFourCC(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
