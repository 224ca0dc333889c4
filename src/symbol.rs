//! Decode results attached to an image
//!
//! Results are produced by a scanner and stored natively as a reference
//! counted, singly linked list. This module gives read access to that list
//! and lets callers build one to attach to an image.

use std::fmt::Display;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use libc::{c_char, c_int, c_uint};

use crate::ffi::{self, zbar_symbol_set_t, zbar_symbol_t};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum SymbolType {
    #[default]
    None = 0,
    Partial = 1,
    Ean2 = 2,
    Ean5 = 5,
    Ean8 = 8,
    Upce = 9,
    Isbn10 = 10,
    Upca = 12,
    Ean13 = 13,
    Isbn13 = 14,
    Composite = 15,
    I25 = 25,
    Databar = 34,
    DatabarExp = 35,
    Codabar = 38,
    Code39 = 39,
    QrCode = 64,
    SqCode = 80,
    Code93 = 93,
    Code128 = 128,
}

impl Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "None",
                Self::Partial => "Partial",
                Self::Ean2 => "EAN-2",
                Self::Ean5 => "EAN-5",
                Self::Ean8 => "EAN-8",
                Self::Upce => "UPC-E",
                Self::Isbn10 => "ISBN-10",
                Self::Upca => "UPC-A",
                Self::Ean13 => "EAN-13",
                Self::Isbn13 => "ISBN-13",
                Self::Composite => "COMPOSITE",
                Self::I25 => "I2/5",
                Self::Databar => "DataBar",
                Self::DatabarExp => "DataBar-Exp",
                Self::Codabar => "Codabar",
                Self::Code39 => "CODE-39",
                Self::Code93 => "CODE-93",
                Self::Code128 => "CODE-128",
                Self::QrCode => "QR-Code",
                Self::SqCode => "SQ-Code",
            }
        )
    }
}

impl From<SymbolType> for i32 {
    fn from(value: SymbolType) -> Self {
        value as i32
    }
}

impl From<i32> for SymbolType {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Partial,
            2 => Self::Ean2,
            5 => Self::Ean5,
            8 => Self::Ean8,
            9 => Self::Upce,
            10 => Self::Isbn10,
            12 => Self::Upca,
            13 => Self::Ean13,
            14 => Self::Isbn13,
            15 => Self::Composite,
            25 => Self::I25,
            34 => Self::Databar,
            35 => Self::DatabarExp,
            38 => Self::Codabar,
            39 => Self::Code39,
            64 => Self::QrCode,
            80 => Self::SqCode,
            93 => Self::Code93,
            128 => Self::Code128,
            _ => Self::None,
        }
    }
}

/// A reference to a decoded barcode symbol
///
/// Borrowed from the [`SymbolList`] or [`SymbolSet`] holding the native list.
#[derive(Clone, Copy)]
pub struct Symbol<'a> {
    inner: &'a zbar_symbol_t,
}

impl<'a> Symbol<'a> {
    /// Get the symbol type
    pub fn symbol_type(&self) -> SymbolType {
        SymbolType::from(unsafe { ffi::zbar_symbol_get_type(self.inner) })
    }

    /// Get the decoded data as bytes
    pub fn data(&self) -> &'a [u8] {
        unsafe {
            let len = ffi::zbar_symbol_get_data_length(self.inner) as usize;
            let data = ffi::zbar_symbol_get_data(self.inner);
            if data.is_null() || len == 0 {
                &[]
            } else {
                std::slice::from_raw_parts(data as *const u8, len)
            }
        }
    }

    /// Get the decoded data as a string (if valid UTF-8)
    pub fn data_string(&self) -> Option<&'a str> {
        std::str::from_utf8(self.data()).ok()
    }

    pub fn quality(&self) -> i32 {
        unsafe { ffi::zbar_symbol_get_quality(self.inner) }
    }
}

impl std::fmt::Debug for Symbol<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbol")
            .field("symbol_type", &self.symbol_type())
            .field("data", &self.data())
            .field("quality", &self.quality())
            .finish()
    }
}

/// Forward-only walk over a native result list.
///
/// Each value of this type can be consumed once; ask the owner for a new one
/// to start over. It borrows the owner, so the list outlives the walk.
pub struct Symbols<'a> {
    next: *const zbar_symbol_t,
    _owner: PhantomData<&'a zbar_symbol_t>,
}

impl<'a> Symbols<'a> {
    /// # Safety
    /// `first` must be null or the head of a list that stays alive and
    /// unmodified for `'a`.
    pub(crate) unsafe fn from_head(first: *const zbar_symbol_t) -> Self {
        Symbols {
            next: first,
            _owner: PhantomData,
        }
    }
}

impl<'a> Iterator for Symbols<'a> {
    type Item = Symbol<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = unsafe { self.next.as_ref()? };
        self.next = unsafe { ffi::zbar_symbol_next(current) };
        Some(Symbol { inner: current })
    }
}

impl FusedIterator for Symbols<'_> {}

/// A read-only reference to the results attached to an image.
///
/// Holds its own count on the native list, so the list stays alive while
/// this value exists even if an owner of the image replaces or detaches it.
pub struct SymbolList {
    ptr: Option<NonNull<zbar_symbol_set_t>>,
}

impl SymbolList {
    /// Take a reference on `syms` (null for an image without results).
    ///
    /// # Safety
    /// `syms` must be null or a live native result list.
    pub(crate) unsafe fn acquire(syms: *const zbar_symbol_set_t) -> Self {
        let ptr = NonNull::new(syms as *mut zbar_symbol_set_t);
        if let Some(ptr) = ptr {
            ffi::zbar_symbol_set_ref(ptr.as_ptr(), 1);
        }
        Self { ptr }
    }

    pub fn len(&self) -> usize {
        self.ptr.map_or(0, |ptr| unsafe {
            ffi::zbar_symbol_set_get_size(ptr.as_ptr()) as usize
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Symbols<'_> {
        let head = self.ptr.map_or(std::ptr::null(), |ptr| unsafe {
            ffi::zbar_symbol_set_first_symbol(ptr.as_ptr())
        });
        unsafe { Symbols::from_head(head) }
    }
}

impl Drop for SymbolList {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            unsafe { ffi::zbar_symbol_set_ref(ptr.as_ptr(), -1) };
        }
    }
}

impl<'a> IntoIterator for &'a SymbolList {
    type Item = Symbol<'a>;
    type IntoIter = Symbols<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owned reference to a native result list.
///
/// Built by pushing results, then handed to
/// [`Image::set_symbols`](crate::Image::set_symbols).
pub struct SymbolSet {
    ptr: NonNull<zbar_symbol_set_t>,
}

impl SymbolSet {
    pub fn new() -> Result<Self> {
        let ptr = unsafe { ffi::_zbar_symbol_set_create() };
        NonNull::new(ptr)
            .map(|ptr| Self { ptr })
            .ok_or(Error::Allocation)
    }

    /// Append a result holding a copy of `data`.
    pub fn push(&mut self, symbol_type: SymbolType, data: &[u8], quality: i32) -> Result<()> {
        let len = c_uint::try_from(data.len())
            .map_err(|_| Error::Invalid(format!("symbol data too long: {}", data.len())))?;
        unsafe {
            let sym = ffi::_zbar_symbol_create(
                c_int::from(symbol_type),
                data.as_ptr() as *const c_char,
                len,
                quality,
            );
            if sym.is_null() {
                return Err(Error::Allocation);
            }
            ffi::_zbar_symbol_set_add(self.ptr.as_ptr(), sym);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        unsafe { ffi::zbar_symbol_set_get_size(self.ptr.as_ptr()) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Symbols<'_> {
        unsafe { Symbols::from_head(ffi::zbar_symbol_set_first_symbol(self.ptr.as_ptr())) }
    }

    pub(crate) fn as_ptr(&self) -> *const zbar_symbol_set_t {
        self.ptr.as_ptr()
    }
}

impl Drop for SymbolSet {
    fn drop(&mut self) {
        unsafe { ffi::zbar_symbol_set_ref(self.ptr.as_ptr(), -1) };
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = Symbol<'a>;
    type IntoIter = Symbols<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_type_roundtrip() {
        for ty in [SymbolType::Ean13, SymbolType::QrCode, SymbolType::Code128] {
            assert_eq!(SymbolType::from(i32::from(ty)), ty);
        }
        assert_eq!(SymbolType::from(7), SymbolType::None);
        assert_eq!(SymbolType::QrCode.to_string(), "QR-Code");
    }

    #[test]
    fn test_empty_set() {
        let set = SymbolSet::new().unwrap();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn test_push_and_iterate() {
        let mut set = SymbolSet::new().unwrap();
        set.push(SymbolType::QrCode, b"hello", 1).unwrap();
        set.push(SymbolType::Ean13, b"9780201379624", 2).unwrap();
        assert_eq!(set.len(), 2);

        let collected: Vec<_> = set
            .iter()
            .map(|s| (s.symbol_type(), s.data_string().unwrap().to_string(), s.quality()))
            .collect();
        assert_eq!(
            collected,
            vec![
                (SymbolType::QrCode, "hello".to_string(), 1),
                (SymbolType::Ean13, "9780201379624".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_list_keeps_set_alive() {
        let mut set = SymbolSet::new().unwrap();
        set.push(SymbolType::Code93, b"KEPT", 5).unwrap();
        let list = unsafe { SymbolList::acquire(set.as_ptr()) };
        drop(set);

        assert_eq!(list.len(), 1);
        let first = list.iter().next().unwrap();
        assert_eq!(first.data(), b"KEPT");
    }

    #[test]
    fn test_empty_list() {
        let list = unsafe { SymbolList::acquire(std::ptr::null()) };
        assert!(list.is_empty());
        assert!(list.iter().next().is_none());
    }

    #[test]
    fn test_iterator_is_fused() {
        let mut set = SymbolSet::new().unwrap();
        set.push(SymbolType::Code39, b"A", 0).unwrap();
        let mut iter = set.iter();
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }
}
