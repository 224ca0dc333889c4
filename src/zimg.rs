//! Raw image dump files
//!
//! A dump is a 16 byte little-endian header followed by the sample bytes:
//!
//! | offset | size | field       |
//! |--------|------|-------------|
//! | 0      | 4    | magic       |
//! | 4      | 4    | fourcc      |
//! | 8      | 2    | width       |
//! | 10     | 2    | height      |
//! | 12     | 4    | data length |
//! | 16     | N    | payload     |

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::ptr::null_mut;

use libc::{c_ulong, c_void};

use crate::ffi::zbar_image_t;
use crate::format::FourCC;
use crate::image_ffi::{
    zbar_image_create, zbar_image_destroy, zbar_image_free_data, zbar_image_set_data,
    zbar_image_set_format, zbar_image_set_size,
};

/// "zimg"
pub const ZIMG_MAGIC: u32 = 0x676d697a;
pub const ZIMG_HEADER_LEN: usize = 16;
pub const ZIMG_EXTENSION: &str = "zimg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZimgHeader {
    pub format: FourCC,
    pub width: u16,
    pub height: u16,
    pub size: u32,
}

impl ZimgHeader {
    pub fn to_bytes(&self) -> [u8; ZIMG_HEADER_LEN] {
        let mut hdr = [0u8; ZIMG_HEADER_LEN];
        hdr[0..4].copy_from_slice(&ZIMG_MAGIC.to_le_bytes());
        hdr[4..8].copy_from_slice(&self.format.as_u32().to_le_bytes());
        hdr[8..10].copy_from_slice(&self.width.to_le_bytes());
        hdr[10..12].copy_from_slice(&self.height.to_le_bytes());
        hdr[12..16].copy_from_slice(&self.size.to_le_bytes());
        hdr
    }

    /// Returns `None` when the magic does not match.
    pub fn from_bytes(hdr: &[u8; ZIMG_HEADER_LEN]) -> Option<Self> {
        let word = |i: usize| u32::from_le_bytes([hdr[i], hdr[i + 1], hdr[i + 2], hdr[i + 3]]);
        let half = |i: usize| u16::from_le_bytes([hdr[i], hdr[i + 1]]);
        if word(0) != ZIMG_MAGIC {
            return None;
        }
        Some(Self {
            format: FourCC::from_u32(word(4)),
            width: half(8),
            height: half(10),
            size: word(12),
        })
    }
}

/// Name of the dump written for `filebase` and `format`:
/// `<filebase>.<FOURCC>.zimg`.
pub fn dump_path(filebase: &Path, format: FourCC) -> PathBuf {
    let mut name = filebase.as_os_str().to_os_string();
    name.push(format!(".{format}.{ZIMG_EXTENSION}"));
    PathBuf::from(name)
}

/// Write `img` to `path`.
///
/// Dimensions and length must already fit the header fields.
pub(crate) unsafe fn write(img: *const zbar_image_t, header: &ZimgHeader, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(&header.to_bytes())?;
    if header.size > 0 {
        let data = std::slice::from_raw_parts((*img).data as *const u8, header.size as usize);
        file.write_all(data)?;
    }
    file.flush()
}

fn read_file(path: &Path) -> io::Result<(ZimgHeader, Vec<u8>)> {
    let mut file = File::open(path)?;
    let mut hdr = [0u8; ZIMG_HEADER_LEN];
    file.read_exact(&mut hdr)?;
    let header = ZimgHeader::from_bytes(&hdr)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "bad zimg magic"))?;
    // Grow with the file rather than trusting the header's length.
    let mut payload = Vec::new();
    file.take(u64::from(header.size)).read_to_end(&mut payload)?;
    if payload.len() as u64 != u64::from(header.size) {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("payload has {} of {} bytes", payload.len(), header.size),
        ));
    }
    Ok((header, payload))
}

/// Read a dump back into a new native image with a reference count of one.
///
/// Returns null on any failure; the cause is logged.
pub(crate) unsafe fn read(path: &Path) -> *mut zbar_image_t {
    let (header, payload) = match read_file(path) {
        Ok(contents) => contents,
        Err(err) => {
            log::warn!("cannot read {}: {err}", path.display());
            return null_mut();
        }
    };

    let Ok(len) = c_ulong::try_from(payload.len()) else {
        log::warn!("{} holds too much data for an image", path.display());
        return null_mut();
    };
    let img = zbar_image_create();
    if img.is_null() {
        return null_mut();
    }
    let buf = libc::malloc(payload.len().max(1));
    if buf.is_null() {
        zbar_image_destroy(img);
        return null_mut();
    }
    libc::memcpy(buf, payload.as_ptr() as *const c_void, payload.len());

    zbar_image_set_format(img, header.format.as_u32());
    zbar_image_set_size(img, header.width as u32, header.height as u32);
    zbar_image_set_data(img, buf, len, Some(zbar_image_free_data));
    img
}
