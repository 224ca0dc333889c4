//! Image handling and format support

use std::path::{Path, PathBuf};

use libc::{c_ulong, c_void};

use crate::ffi::{self, zbar_image_t};
use crate::format::FourCC;
use crate::handle::RawImage;
use crate::symbol::{SymbolList, SymbolSet};
use crate::zimg::{self, ZimgHeader};
use crate::{Error, Result};

/// Cleanup handler installed with every buffer copied in by [`Image::set_data`].
///
/// The engine decides when this runs (buffer replacement or final release);
/// it must tolerate a missing buffer.
unsafe extern "C" fn release_copied_data(img: *mut zbar_image_t) {
    ffi::zbar_image_free_data(img);
}

/// Buffer length as the native engine stores it.
fn native_len(len: usize) -> Result<c_ulong> {
    c_ulong::try_from(len)
        .map_err(|_| Error::Invalid(format!("{len} bytes too large for an image")))
}

/// An owning handle to a native, reference counted image.
///
/// The handle holds one reference, given back by [`Image::dispose`] or when
/// the value goes out of scope. After disposal every operation fails with
/// [`Error::UseAfterDispose`].
///
/// # Example
/// ```
/// use zedbar_image::{FourCC, Image};
///
/// let mut image = Image::new()?;
/// image.set_format(FourCC::Y800)?;
/// image.set_size(2, 2)?;
/// image.set_data(&[0, 255, 255, 0])?;
///
/// let rgb = image.convert(FourCC::RGB3)?;
/// assert_eq!(rgb.data()?.len(), 12);
/// # Ok::<(), zedbar_image::Error>(())
/// ```
pub struct Image {
    handle: Option<RawImage>,
}

impl Image {
    /// Create a new empty image
    pub fn new() -> Result<Self> {
        Ok(Self::from_handle(RawImage::create()?))
    }

    /// Take ownership of a counted reference.
    pub fn from_handle(handle: RawImage) -> Self {
        Image {
            handle: Some(handle),
        }
    }

    /// Wrap an existing native image.
    ///
    /// Set `increment_ref` when another owner keeps its reference; leave it
    /// unset to take over a reference the caller already holds.
    ///
    /// # Safety
    /// `ptr` must be null or a live native image, with a reference held by
    /// the caller when `increment_ref` is false.
    pub unsafe fn from_raw(ptr: *mut zbar_image_t, increment_ref: bool) -> Result<Self> {
        Ok(Self::from_handle(RawImage::from_ptr(ptr, increment_ref)?))
    }

    /// Create an image from grayscale data
    pub fn from_gray(data: &[u8], width: u32, height: u32) -> Result<Self> {
        if (data.len() as u64) != (width as u64) * (height as u64) {
            return Err(Error::Invalid(format!(
                "{} bytes for a {width}x{height} gray image",
                data.len()
            )));
        }

        let mut image = Self::new()?;
        image.set_format(FourCC::Y800)?;
        image.set_size(width, height)?;
        image.set_data(data)?;
        Ok(image)
    }

    /// Load an image written by [`Image::dump`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ptr = unsafe { zimg::read(path) };
        let handle = unsafe { RawImage::from_ptr(ptr, false) }.map_err(|_| Error::Load {
            path: path.to_path_buf(),
        })?;
        log::debug!("loaded {}", path.display());
        Ok(Self::from_handle(handle))
    }

    /// A second owner of the same native image.
    pub fn share(&self) -> Result<Image> {
        Ok(Self::from_handle(self.handle()?.acquire()))
    }

    fn handle(&self) -> Result<&RawImage> {
        self.handle.as_ref().ok_or(Error::UseAfterDispose)
    }

    fn ptr(&self) -> Result<*mut zbar_image_t> {
        self.handle().map(RawImage::as_ptr)
    }

    /// Raw pointer to the native image; no reference is transferred.
    pub fn as_ptr(&self) -> Result<*mut zbar_image_t> {
        self.ptr()
    }

    /// Number of references currently held on the native image.
    pub fn ref_count(&self) -> Result<i32> {
        Ok(self.handle()?.ref_count())
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    /// Give back this image's reference.
    ///
    /// Calling it again, or dropping the image afterwards, does nothing.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::trace!("disposing image {:p}", handle.as_ptr());
            handle.release();
        }
    }

    /// Get the image width
    pub fn width(&self) -> Result<u32> {
        Ok(unsafe { ffi::zbar_image_get_width(self.ptr()?) })
    }

    pub fn set_width(&mut self, width: u32) -> Result<()> {
        let ptr = self.ptr()?;
        unsafe { ffi::zbar_image_set_size(ptr, width, ffi::zbar_image_get_height(ptr)) };
        Ok(())
    }

    /// Get the image height
    pub fn height(&self) -> Result<u32> {
        Ok(unsafe { ffi::zbar_image_get_height(self.ptr()?) })
    }

    pub fn set_height(&mut self, height: u32) -> Result<()> {
        let ptr = self.ptr()?;
        unsafe { ffi::zbar_image_set_size(ptr, ffi::zbar_image_get_width(ptr), height) };
        Ok(())
    }

    /// Width and height together.
    pub fn size(&self) -> Result<(u32, u32)> {
        let ptr = self.ptr()?;
        let (mut w, mut h) = (0u32, 0u32);
        unsafe { ffi::zbar_image_get_size(ptr, &mut w, &mut h) };
        Ok((w, h))
    }

    /// Set the dimensions. The buffer is not checked or touched.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe { ffi::zbar_image_set_size(self.ptr()?, width, height) };
        Ok(())
    }

    /// Get the image format
    pub fn format(&self) -> Result<FourCC> {
        Ok(FourCC::from_u32(unsafe {
            ffi::zbar_image_get_format(self.ptr()?)
        }))
    }

    /// Relabel the samples; the buffer is not converted.
    pub fn set_format(&mut self, format: FourCC) -> Result<()> {
        unsafe { ffi::zbar_image_set_format(self.ptr()?, format.as_u32()) };
        Ok(())
    }

    pub fn sequence(&self) -> Result<u32> {
        Ok(unsafe { ffi::zbar_image_get_sequence(self.ptr()?) })
    }

    pub fn set_sequence(&mut self, sequence: u32) -> Result<()> {
        unsafe { ffi::zbar_image_set_sequence(self.ptr()?, sequence) };
        Ok(())
    }

    /// Length in bytes of the installed buffer, 0 without one.
    pub fn data_len(&self) -> Result<usize> {
        Ok(unsafe { ffi::zbar_image_get_data_length(self.ptr()?) } as usize)
    }

    /// Copy of the image data.
    pub fn data(&self) -> Result<Vec<u8>> {
        let ptr = self.ptr()?;
        unsafe {
            let data = ffi::zbar_image_get_data(ptr);
            if data.is_null() {
                return Err(Error::NullBuffer);
            }
            let len = ffi::zbar_image_get_data_length(ptr) as usize;
            Ok(std::slice::from_raw_parts(data as *const u8, len).to_vec())
        }
    }

    /// Install a native copy of `data` as the image buffer.
    ///
    /// The copy belongs to the native image and is freed by its cleanup
    /// handler, when the buffer is next replaced or the last reference is
    /// released. `data` itself is not kept.
    pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
        let ptr = self.ptr()?;
        let len = native_len(data.len())?;
        unsafe {
            let buf = libc::malloc(data.len().max(1));
            if buf.is_null() {
                return Err(Error::Allocation);
            }
            libc::memcpy(buf, data.as_ptr() as *const c_void, data.len());
            ffi::zbar_image_set_data(ptr, buf, len, Some(release_copied_data));
        }
        Ok(())
    }

    /// Convert to another format, keeping the size (rounded up as the
    /// format requires). The source is left untouched.
    pub fn convert(&self, format: FourCC) -> Result<Image> {
        let ptr = self.ptr()?;
        let converted = unsafe { ffi::zbar_image_convert(ptr, format.as_u32()) };
        self.wrap_converted(converted, format)
    }

    /// Convert to another format and size.
    ///
    /// Growing repeats the last row/column and shrinking crops; nothing is
    /// scaled.
    pub fn convert_resize(&self, format: FourCC, width: u32, height: u32) -> Result<Image> {
        let ptr = self.ptr()?;
        let converted =
            unsafe { ffi::zbar_image_convert_resize(ptr, format.as_u32(), width, height) };
        self.wrap_converted(converted, format)
    }

    fn wrap_converted(&self, converted: *mut zbar_image_t, format: FourCC) -> Result<Image> {
        let from = self.format()?;
        let handle = unsafe { RawImage::from_ptr(converted, false) }
            .map_err(|_| Error::Conversion { from, to: format })?;
        log::debug!("converted {from} image to {format}");
        Ok(Self::from_handle(handle))
    }

    /// The decode results attached to this image.
    ///
    /// The returned list holds its own reference, so it stays valid when
    /// another owner of the image replaces or detaches the results.
    pub fn symbols(&self) -> Result<SymbolList> {
        let ptr = self.ptr()?;
        Ok(unsafe { SymbolList::acquire(ffi::zbar_image_get_symbols(ptr)) })
    }

    /// Attach a result set, replacing any previous one. `None` detaches.
    pub fn set_symbols(&mut self, symbols: Option<SymbolSet>) -> Result<()> {
        let ptr = self.ptr()?;
        let syms = symbols
            .as_ref()
            .map_or(std::ptr::null(), SymbolSet::as_ptr);
        // The image takes its own reference; ours goes when `symbols` drops.
        unsafe { ffi::zbar_image_set_symbols(ptr, syms) };
        Ok(())
    }

    /// Write the image to `<filebase>.<FOURCC>.zimg` and return that path.
    pub fn dump(&self, filebase: impl AsRef<Path>) -> Result<PathBuf> {
        let ptr = self.ptr()?;
        let format = self.format()?;
        let (width, height) = self.size()?;
        let size = self.data_len()?;

        let header = ZimgHeader {
            format,
            width: u16::try_from(width)
                .map_err(|_| Error::Invalid(format!("width {width} too large to dump")))?,
            height: u16::try_from(height)
                .map_err(|_| Error::Invalid(format!("height {height} too large to dump")))?,
            size: u32::try_from(size)
                .map_err(|_| Error::Invalid(format!("{size} bytes too large to dump")))?,
        };

        let path = zimg::dump_path(filebase.as_ref(), format);
        log::debug!("dumping {width}x{height} {format} image to {}", path.display());
        unsafe { zimg::write(ptr, &header, &path) }.map_err(|source| Error::Dump {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.size() {
            Ok((width, height)) => f
                .debug_struct("Image")
                .field("width", &width)
                .field("height", &height)
                .field("format", &self.format().unwrap_or_default())
                .field("data_len", &self.data_len().unwrap_or_default())
                .finish(),
            Err(_) => f.write_str("Image(<disposed>)"),
        }
    }
}
