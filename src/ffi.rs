//! C-layout structures shared by the native image engine
//!
//! The engine in `image_ffi` and `symbol_ffi` manipulates these through raw
//! pointers only. The safe wrappers never touch the fields directly.

use libc::{c_char, c_int, c_uint, c_ulong, c_void};

/// Callback used to release an image's data buffer.
///
/// Invoked by the engine when the buffer is replaced or the image is freed.
#[allow(non_camel_case_types)]
pub type zbar_image_cleanup_handler_t = unsafe extern "C" fn(img: *mut zbar_image_t);

#[repr(C)]
#[allow(non_camel_case_types)]
pub struct zbar_image_t {
    pub format: u32,
    pub width: c_uint,
    pub height: c_uint,
    pub data: *mut c_void,
    pub datalen: c_ulong,
    pub cleanup: Option<zbar_image_cleanup_handler_t>,
    pub refcnt: c_int,
    pub seq: c_uint,
    pub syms: *mut zbar_symbol_set_t,
}

#[repr(C)]
#[allow(non_camel_case_types)]
pub struct zbar_symbol_t {
    pub symbol_type: c_int,
    pub datalen: c_uint,
    pub data: *mut c_char,
    pub quality: c_int,
    pub next: *mut zbar_symbol_t,
}

#[repr(C)]
#[allow(non_camel_case_types)]
pub struct zbar_symbol_set_t {
    pub refcnt: c_int,
    pub nsyms: c_int,
    pub head: *mut zbar_symbol_t,
    pub tail: *mut zbar_symbol_t,
}

// Reference counting helper
pub(crate) unsafe fn refcnt(cnt: *mut c_int, delta: c_int) -> c_int {
    let rc = *cnt + delta;
    *cnt = rc;
    debug_assert!(rc >= 0);
    rc
}

pub use crate::convert::{zbar_image_convert, zbar_image_convert_resize};
pub use crate::image_ffi::*;
pub use crate::symbol_ffi::*;
