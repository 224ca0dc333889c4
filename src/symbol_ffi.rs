//! Native decode result lists
//!
//! Results are kept in a reference counted set holding a singly linked list
//! of symbols. The list is append only; symbols are freed together with the
//! set that owns them.

use std::{
    ffi::c_void,
    ptr::{null, null_mut},
};

use libc::{c_char, c_int, c_uint};

use crate::ffi::{refcnt, zbar_symbol_set_t, zbar_symbol_t};

/// Allocate an empty result set with a reference count of one.
#[no_mangle]
pub unsafe extern "C" fn _zbar_symbol_set_create() -> *mut zbar_symbol_set_t {
    let syms = libc::calloc(1, std::mem::size_of::<zbar_symbol_set_t>()) as *mut zbar_symbol_set_t;
    if syms.is_null() {
        return null_mut();
    }
    refcnt(&mut (*syms).refcnt, 1);
    syms
}

unsafe fn _zbar_symbol_set_free(syms: *mut zbar_symbol_set_t) {
    let mut sym = (*syms).head;
    while !sym.is_null() {
        let next = (*sym).next;
        _zbar_symbol_free(sym);
        sym = next;
    }
    libc::free(syms as *mut c_void);
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_set_ref(syms: *mut zbar_symbol_set_t, delta: c_int) {
    if refcnt(&mut (*syms).refcnt, delta) == 0 && delta <= 0 {
        _zbar_symbol_set_free(syms);
    }
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_set_get_size(syms: *const zbar_symbol_set_t) -> c_int {
    (*syms).nsyms
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_set_first_symbol(
    syms: *const zbar_symbol_set_t,
) -> *const zbar_symbol_t {
    (*syms).head
}

/// Allocate a detached symbol holding a copy of `data`.
///
/// Returns null if allocation fails.
#[no_mangle]
pub unsafe extern "C" fn _zbar_symbol_create(
    symbol_type: c_int,
    data: *const c_char,
    datalen: c_uint,
    quality: c_int,
) -> *mut zbar_symbol_t {
    let sym = libc::calloc(1, std::mem::size_of::<zbar_symbol_t>()) as *mut zbar_symbol_t;
    if sym.is_null() {
        return null_mut();
    }
    let buf = libc::malloc((datalen as usize).max(1)) as *mut c_char;
    if buf.is_null() {
        libc::free(sym as *mut c_void);
        return null_mut();
    }
    if datalen > 0 {
        libc::memcpy(buf as *mut c_void, data as *const c_void, datalen as usize);
    }
    (*sym).symbol_type = symbol_type;
    (*sym).data = buf;
    (*sym).datalen = datalen;
    (*sym).quality = quality;
    sym
}

unsafe fn _zbar_symbol_free(sym: *mut zbar_symbol_t) {
    if !(*sym).data.is_null() {
        libc::free((*sym).data as *mut c_void);
    }
    libc::free(sym as *mut c_void);
}

/// Append a detached symbol; the set takes ownership of it.
#[no_mangle]
pub unsafe extern "C" fn _zbar_symbol_set_add(
    syms: *mut zbar_symbol_set_t,
    sym: *mut zbar_symbol_t,
) {
    (*sym).next = null_mut();
    if (*syms).tail.is_null() {
        (*syms).head = sym;
    } else {
        (*(*syms).tail).next = sym;
    }
    (*syms).tail = sym;
    (*syms).nsyms += 1;
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_next(sym: *const zbar_symbol_t) -> *const zbar_symbol_t {
    if sym.is_null() {
        null()
    } else {
        (*sym).next as *const zbar_symbol_t
    }
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_get_type(sym: *const zbar_symbol_t) -> c_int {
    (*sym).symbol_type
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_get_data(sym: *const zbar_symbol_t) -> *const c_char {
    (*sym).data
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_get_data_length(sym: *const zbar_symbol_t) -> c_uint {
    (*sym).datalen
}

#[no_mangle]
pub unsafe extern "C" fn zbar_symbol_get_quality(sym: *const zbar_symbol_t) -> c_int {
    (*sym).quality
}
