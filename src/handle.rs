//! Counted references to native images

use std::ptr::NonNull;

use crate::ffi::{self, zbar_image_t};
use crate::{Error, Result};

/// One counted reference to a native image.
///
/// Every `RawImage` stands for exactly one reference held on the native
/// resource. [`acquire`](Self::acquire) takes another reference and
/// [`release`](Self::release) gives this one back. There is no `Drop`: a
/// `RawImage` that is forgotten leaks its reference. Use [`crate::Image`]
/// for scoped ownership.
#[must_use = "a RawImage leaks its reference unless released"]
#[derive(Debug)]
pub struct RawImage {
    ptr: NonNull<zbar_image_t>,
}

impl RawImage {
    /// Allocate a new native image (reference count one).
    pub fn create() -> Result<Self> {
        let ptr = unsafe { ffi::zbar_image_create() };
        let ptr = NonNull::new(ptr).ok_or(Error::Allocation)?;
        log::trace!("created native image {ptr:p}");
        Ok(Self { ptr })
    }

    /// Adopt a native image pointer.
    ///
    /// With `acquire` set a new reference is taken for the returned handle;
    /// otherwise the caller's reference is transferred to it.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live native image on which the caller
    /// holds a reference (transferred when `acquire` is false).
    pub unsafe fn from_ptr(ptr: *mut zbar_image_t, acquire: bool) -> Result<Self> {
        let ptr = NonNull::new(ptr).ok_or(Error::InvalidHandle)?;
        if acquire {
            ffi::zbar_image_ref(ptr.as_ptr(), 1);
        }
        Ok(Self { ptr })
    }

    /// Take an additional reference, returned as a separate handle.
    pub fn acquire(&self) -> RawImage {
        unsafe { ffi::zbar_image_ref(self.ptr.as_ptr(), 1) };
        RawImage { ptr: self.ptr }
    }

    /// Give this reference back. The native image (and its buffer, through
    /// its cleanup handler) is freed when the last reference goes.
    pub fn release(self) {
        log::trace!("releasing native image {:p}", self.ptr);
        unsafe { ffi::zbar_image_destroy(self.ptr.as_ptr()) };
    }

    /// Hand the reference over to the caller as a raw pointer.
    pub fn into_ptr(self) -> *mut zbar_image_t {
        self.ptr.as_ptr()
    }

    pub fn as_ptr(&self) -> *mut zbar_image_t {
        self.ptr.as_ptr()
    }

    /// Current native reference count (shared by all holders).
    pub fn ref_count(&self) -> i32 {
        unsafe { ffi::zbar_image_get_refcnt(self.ptr.as_ptr()) }
    }
}
