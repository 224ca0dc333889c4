//! Native image engine
//!
//! A C-shaped, manually reference counted image object. Every function here
//! takes raw pointers and trusts its caller; the safe API lives in
//! [`crate::image`] and [`crate::handle`].

use std::{
    ffi::c_void,
    ptr::{null, null_mut},
};

use libc::{c_int, c_uint, c_ulong};

use crate::ffi::{
    refcnt, zbar_image_cleanup_handler_t, zbar_image_t, zbar_symbol_set_t, zbar_symbol_t,
};
use crate::symbol_ffi::zbar_symbol_set_ref;

/// Allocate a new, uninitialized image with a reference count of one.
///
/// Returns null if the allocation fails.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_create() -> *mut zbar_image_t {
    let img = libc::calloc(1, std::mem::size_of::<zbar_image_t>()) as *mut zbar_image_t;
    if img.is_null() {
        return null_mut();
    }
    refcnt(&mut (*img).refcnt, 1);
    img
}

unsafe fn _zbar_image_free(img: *mut zbar_image_t) {
    if !(*img).syms.is_null() {
        zbar_symbol_set_ref((*img).syms, -1);
        (*img).syms = null_mut();
    }
    libc::free(img as *mut c_void);
}

/// Drop one reference; the image and its data are released at zero.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_destroy(img: *mut zbar_image_t) {
    _zbar_image_refcnt(img, -1);
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_ref(img: *mut zbar_image_t, refs: c_int) {
    _zbar_image_refcnt(img, refs);
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_refcnt(img: *const zbar_image_t) -> c_int {
    (*img).refcnt
}

pub(crate) unsafe fn _zbar_image_refcnt(img: *mut zbar_image_t, delta: c_int) {
    if refcnt(&mut (*img).refcnt, delta) == 0 && delta <= 0 {
        if let Some(cleanup) = (*img).cleanup.take() {
            cleanup(img);
        }
        _zbar_image_free(img);
    }
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_format(img: *const zbar_image_t) -> u32 {
    (*img).format
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_sequence(img: *const zbar_image_t) -> c_uint {
    (*img).seq
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_width(img: *const zbar_image_t) -> c_uint {
    (*img).width
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_height(img: *const zbar_image_t) -> c_uint {
    (*img).height
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_size(
    img: *const zbar_image_t,
    w: *mut c_uint,
    h: *mut c_uint,
) {
    if !w.is_null() {
        *w = (*img).width;
    }
    if !h.is_null() {
        *h = (*img).height;
    }
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_data(img: *const zbar_image_t) -> *const c_void {
    (*img).data
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_data_length(img: *const zbar_image_t) -> c_ulong {
    (*img).datalen
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_set_format(img: *mut zbar_image_t, fmt: u32) {
    (*img).format = fmt;
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_set_sequence(img: *mut zbar_image_t, seq: c_uint) {
    (*img).seq = seq;
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_set_size(img: *mut zbar_image_t, w: c_uint, h: c_uint) {
    (*img).width = w;
    (*img).height = h;
}

/// Cleanup handler for buffers allocated with `malloc`.
///
/// Frees whatever buffer is currently installed. A null image or null data
/// pointer is a no-op.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_free_data(img: *mut zbar_image_t) {
    if img.is_null() {
        return;
    }
    if !(*img).data.is_null() {
        libc::free((*img).data);
    }
    (*img).data = null_mut();
    (*img).datalen = 0;
}

/// Run the installed cleanup handler (if any) and detach the buffer.
///
/// Without a handler the buffer belongs to whoever installed it and is only
/// forgotten.
unsafe fn _zbar_image_release_data(img: *mut zbar_image_t) {
    if let Some(cleanup) = (*img).cleanup.take() {
        cleanup(img);
    }
    (*img).data = null_mut();
    (*img).datalen = 0;
}

/// Install a new buffer, releasing the previous one first.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_set_data(
    img: *mut zbar_image_t,
    data: *mut c_void,
    len: c_ulong,
    cleanup: Option<zbar_image_cleanup_handler_t>,
) {
    _zbar_image_release_data(img);
    (*img).data = data;
    (*img).datalen = len;
    (*img).cleanup = cleanup;
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_get_symbols(
    img: *const zbar_image_t,
) -> *const zbar_symbol_set_t {
    (*img).syms
}

/// Attach a result set, taking a new reference to it and dropping the
/// reference held on the previous one.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_set_symbols(
    img: *mut zbar_image_t,
    syms: *const zbar_symbol_set_t,
) {
    if !syms.is_null() {
        zbar_symbol_set_ref(syms as *mut zbar_symbol_set_t, 1);
    }
    if !(*img).syms.is_null() {
        zbar_symbol_set_ref((*img).syms, -1);
    }
    (*img).syms = syms as *mut zbar_symbol_set_t;
}

#[no_mangle]
pub unsafe extern "C" fn zbar_image_first_symbol(img: *const zbar_image_t) -> *const zbar_symbol_t {
    if (*img).syms.is_null() {
        null()
    } else {
        (*(*img).syms).head as *const zbar_symbol_t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static CLEANUPS: Cell<usize> = const { Cell::new(0) };
    }

    unsafe extern "C" fn counting_cleanup(img: *mut zbar_image_t) {
        CLEANUPS.with(|c| c.set(c.get() + 1));
        zbar_image_free_data(img);
    }

    fn cleanups() -> usize {
        CLEANUPS.with(|c| c.get())
    }

    unsafe fn install(img: *mut zbar_image_t, bytes: &[u8]) {
        let data = libc::malloc(bytes.len().max(1));
        assert!(!data.is_null());
        libc::memcpy(data, bytes.as_ptr() as *const c_void, bytes.len());
        zbar_image_set_data(img, data, bytes.len() as c_ulong, Some(counting_cleanup));
    }

    #[test]
    fn test_create_is_uninitialized() {
        unsafe {
            let img = zbar_image_create();
            assert!(!img.is_null());
            assert_eq!(zbar_image_get_refcnt(img), 1);
            assert_eq!(zbar_image_get_width(img), 0);
            assert_eq!(zbar_image_get_height(img), 0);
            assert_eq!(zbar_image_get_format(img), 0);
            assert!(zbar_image_get_data(img).is_null());
            assert!(zbar_image_first_symbol(img).is_null());
            zbar_image_destroy(img);
        }
    }

    #[test]
    fn test_cleanup_runs_on_replace_and_destroy() {
        unsafe {
            let before = cleanups();
            let img = zbar_image_create();
            install(img, &[1, 2, 3]);
            assert_eq!(cleanups(), before);

            install(img, &[4, 5]);
            assert_eq!(cleanups(), before + 1);
            assert_eq!(zbar_image_get_data_length(img), 2);

            zbar_image_destroy(img);
            assert_eq!(cleanups(), before + 2);
        }
    }

    #[test]
    fn test_cleanup_deferred_until_last_reference() {
        unsafe {
            let before = cleanups();
            let img = zbar_image_create();
            install(img, &[9; 16]);
            zbar_image_ref(img, 1);
            assert_eq!(zbar_image_get_refcnt(img), 2);

            zbar_image_destroy(img);
            assert_eq!(cleanups(), before);
            assert_eq!(zbar_image_get_data_length(img), 16);

            zbar_image_destroy(img);
            assert_eq!(cleanups(), before + 1);
        }
    }

    #[test]
    fn test_free_data_is_null_safe() {
        unsafe {
            zbar_image_free_data(null_mut());
            let img = zbar_image_create();
            zbar_image_free_data(img);
            assert!(zbar_image_get_data(img).is_null());
            zbar_image_destroy(img);
        }
    }
}
