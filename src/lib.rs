//! ZBar image handles (Rust port)
//!
//! This crate provides the reference counted image object used by the ZBar
//! scanner: an owning [`Image`] handle over a native `zbar_image_t`, buffers
//! copied into native memory and freed by a cleanup handler, format
//! conversion, access to attached decode results, and the `.zimg` dump
//! format.

pub mod error;
pub mod format;
pub mod handle;
pub mod image;
pub mod symbol;
pub mod zimg;

// Re-export main types
pub use error::{Error, Result};
pub use format::FourCC;
pub use handle::RawImage;
pub use image::Image;
pub use symbol::{Symbol, SymbolList, SymbolSet, SymbolType, Symbols};

// The native engine, kept C-shaped behind the safe types above
mod convert;
pub mod ffi;
mod image_ffi;
mod symbol_ffi;

#[cfg(test)]
mod proptest_image;
