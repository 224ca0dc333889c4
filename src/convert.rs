//! Native format conversion
//!
//! Converts an image into a newly allocated image of another format. The
//! output size is rounded up to the target format's block size. When the
//! output is larger than the source the last row/column is repeated, when it
//! is smaller the source is cropped. No scaling is performed.

use std::ptr::null_mut;

use libc::{c_uint, c_ulong};

use crate::ffi::zbar_image_t;
use crate::format::{FourCC, FormatGroup};
use crate::image_ffi::{
    zbar_image_create, zbar_image_free_data, zbar_image_set_data, zbar_image_set_format,
    zbar_image_set_size,
};

/// Read access to the samples of a source frame.
///
/// Coordinates are clamped to the visible size, which implements the
/// pad-by-duplication rule.
struct Frame<'a> {
    group: FormatGroup,
    data: &'a [u8],
    stride: usize,
    rows: usize,
    width: usize,
    height: usize,
}

impl Frame<'_> {
    fn clamp(&self, x: usize, y: usize) -> (usize, usize) {
        (x.min(self.width - 1), y.min(self.height - 1))
    }

    fn luma(&self, x: usize, y: usize) -> u8 {
        let (x, y) = self.clamp(x, y);
        match self.group {
            FormatGroup::Gray | FormatGroup::YuvPlanar { .. } => self.data[y * self.stride + x],
            FormatGroup::YuvPacked(order) => {
                let mp = y * self.stride * 2 + (x & !1) * 2;
                let off = if x & 1 == 0 { order.y0 } else { order.y1 };
                self.data[mp + off]
            }
            FormatGroup::Rgb(_) => {
                let [r, g, b] = self.rgb(x, y);
                ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 0x80) >> 8) as u8
            }
        }
    }

    fn chroma(&self, x: usize, y: usize) -> (u8, u8) {
        let (x, y) = self.clamp(x, y);
        match self.group {
            FormatGroup::YuvPlanar {
                xsub,
                ysub,
                v_first,
            } => {
                let luma_size = self.stride * self.rows;
                let cstride = self.stride >> xsub;
                let plane = cstride * (self.rows >> ysub);
                let idx = (y >> ysub) * cstride + (x >> xsub);
                let (u_off, v_off) = if v_first {
                    (luma_size + plane, luma_size)
                } else {
                    (luma_size, luma_size + plane)
                };
                (self.data[u_off + idx], self.data[v_off + idx])
            }
            FormatGroup::YuvPacked(order) => {
                let mp = y * self.stride * 2 + (x & !1) * 2;
                (self.data[mp + order.u], self.data[mp + order.v])
            }
            FormatGroup::Gray | FormatGroup::Rgb(_) => (0x80, 0x80),
        }
    }

    fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let (x, y) = self.clamp(x, y);
        match self.group {
            FormatGroup::Rgb(order) => {
                let p = (y * self.stride + x) * order.bpp;
                [
                    self.data[p + order.r],
                    self.data[p + order.g],
                    self.data[p + order.b],
                ]
            }
            _ => {
                let l = self.luma(x, y);
                [l, l, l]
            }
        }
    }
}

fn supported(src: FormatGroup, dst: FormatGroup) -> bool {
    match (src, dst) {
        (FormatGroup::Gray, _) => true,
        (FormatGroup::Rgb(_), FormatGroup::Rgb(_) | FormatGroup::Gray) => true,
        (FormatGroup::Rgb(_), _) => false,
        (_, FormatGroup::Rgb(_)) => false,
        _ => true,
    }
}

fn write_frame(src: &Frame<'_>, group: FormatGroup, width: usize, height: usize, out: &mut [u8]) {
    match group {
        FormatGroup::Gray => {
            for y in 0..height {
                for x in 0..width {
                    out[y * width + x] = src.luma(x, y);
                }
            }
        }
        FormatGroup::YuvPlanar {
            xsub,
            ysub,
            v_first,
        } => {
            let (luma, chroma) = out.split_at_mut(width * height);
            for y in 0..height {
                for x in 0..width {
                    luma[y * width + x] = src.luma(x, y);
                }
            }
            let cw = width >> xsub;
            let ch = height >> ysub;
            let (first, second) = chroma.split_at_mut(cw * ch);
            let (u_plane, v_plane) = if v_first {
                (second, first)
            } else {
                (first, second)
            };
            for cy in 0..ch {
                for cx in 0..cw {
                    let (u, v) = src.chroma(cx << xsub, cy << ysub);
                    u_plane[cy * cw + cx] = u;
                    v_plane[cy * cw + cx] = v;
                }
            }
        }
        FormatGroup::YuvPacked(order) => {
            for y in 0..height {
                for x in (0..width).step_by(2) {
                    let mp = (y * width + x) * 2;
                    let (u, v) = src.chroma(x, y);
                    out[mp + order.y0] = src.luma(x, y);
                    out[mp + order.y1] = src.luma(x + 1, y);
                    out[mp + order.u] = u;
                    out[mp + order.v] = v;
                }
            }
        }
        FormatGroup::Rgb(order) => {
            out.fill(0);
            for y in 0..height {
                for x in 0..width {
                    let [r, g, b] = src.rgb(x, y);
                    let p = (y * width + x) * order.bpp;
                    out[p + order.r] = r;
                    out[p + order.g] = g;
                    out[p + order.b] = b;
                }
            }
        }
    }
}

/// Convert `src` to `fmt` keeping its size.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_convert(
    src: *const zbar_image_t,
    fmt: u32,
) -> *mut zbar_image_t {
    zbar_image_convert_resize(src, fmt, (*src).width, (*src).height)
}

/// Convert `src` to `fmt` with a new size.
///
/// Returns null for unsupported formats, an empty or short source buffer, or
/// zero dimensions. The source is never modified.
#[no_mangle]
pub unsafe extern "C" fn zbar_image_convert_resize(
    src: *const zbar_image_t,
    fmt: u32,
    width: c_uint,
    height: c_uint,
) -> *mut zbar_image_t {
    let (Some(src_group), Some(dst_group)) = (
        FormatGroup::lookup(FourCC::from_u32((*src).format)),
        FormatGroup::lookup(FourCC::from_u32(fmt)),
    ) else {
        return null_mut();
    };
    if !supported(src_group, dst_group) {
        return null_mut();
    }
    if (*src).data.is_null() || (*src).width == 0 || (*src).height == 0 || width == 0 || height == 0
    {
        return null_mut();
    }

    let (sw, sh) = src_group.round_size((*src).width, (*src).height);
    let Some(src_len) = src_group.frame_size(sw, sh) else {
        return null_mut();
    };
    if ((*src).datalen as usize) < src_len {
        return null_mut();
    }
    let (dw, dh) = dst_group.round_size(width, height);
    let Some(dst_len) = dst_group.frame_size(dw, dh) else {
        return null_mut();
    };
    let Ok(native_len) = c_ulong::try_from(dst_len) else {
        return null_mut();
    };

    let frame = Frame {
        group: src_group,
        data: std::slice::from_raw_parts((*src).data as *const u8, src_len),
        stride: sw as usize,
        rows: sh as usize,
        width: (*src).width as usize,
        height: (*src).height as usize,
    };

    let dst = zbar_image_create();
    if dst.is_null() {
        return null_mut();
    }
    let buf = libc::malloc(dst_len.max(1));
    if buf.is_null() {
        crate::image_ffi::zbar_image_destroy(dst);
        return null_mut();
    }
    let out = std::slice::from_raw_parts_mut(buf as *mut u8, dst_len);
    write_frame(&frame, dst_group, dw as usize, dh as usize, out);

    zbar_image_set_format(dst, fmt);
    zbar_image_set_size(dst, dw, dh);
    zbar_image_set_data(dst, buf, native_len, Some(zbar_image_free_data));
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_ffi::{
        zbar_image_destroy, zbar_image_get_data, zbar_image_get_data_length,
        zbar_image_get_height, zbar_image_get_width,
    };

    unsafe fn make(fmt: FourCC, width: u32, height: u32, bytes: &[u8]) -> *mut zbar_image_t {
        let img = zbar_image_create();
        zbar_image_set_format(img, fmt.as_u32());
        zbar_image_set_size(img, width, height);
        let buf = libc::malloc(bytes.len().max(1));
        libc::memcpy(buf, bytes.as_ptr() as *const libc::c_void, bytes.len());
        zbar_image_set_data(img, buf, bytes.len() as c_ulong, Some(zbar_image_free_data));
        img
    }

    unsafe fn bytes<'a>(img: *const zbar_image_t) -> &'a [u8] {
        std::slice::from_raw_parts(
            zbar_image_get_data(img) as *const u8,
            zbar_image_get_data_length(img) as usize,
        )
    }

    #[test]
    fn test_pad_duplicates_last_row_and_column() {
        unsafe {
            let src = make(FourCC::Y800, 2, 2, &[1, 2, 3, 4]);
            let dst = zbar_image_convert_resize(src, FourCC::Y800.as_u32(), 3, 3);
            assert!(!dst.is_null());
            assert_eq!(bytes(dst), &[1, 2, 2, 3, 4, 4, 3, 4, 4]);
            zbar_image_destroy(dst);
            zbar_image_destroy(src);
        }
    }

    #[test]
    fn test_crop_truncates() {
        unsafe {
            let src = make(FourCC::GREY, 3, 2, &[1, 2, 3, 4, 5, 6]);
            let dst = zbar_image_convert_resize(src, FourCC::Y800.as_u32(), 2, 1);
            assert_eq!(bytes(dst), &[1, 2]);
            zbar_image_destroy(dst);
            zbar_image_destroy(src);
        }
    }

    #[test]
    fn test_gray_to_i420_rounds_up() {
        unsafe {
            let src = make(FourCC::Y800, 3, 1, &[10, 20, 30]);
            let dst = zbar_image_convert(src, FourCC::I420.as_u32());
            assert_eq!(zbar_image_get_width(dst), 4);
            assert_eq!(zbar_image_get_height(dst), 2);
            assert_eq!(
                bytes(dst),
                &[10, 20, 30, 30, 10, 20, 30, 30, 0x80, 0x80, 0x80, 0x80]
            );
            zbar_image_destroy(dst);
            zbar_image_destroy(src);
        }
    }

    #[test]
    fn test_packed_yuv_reorder() {
        unsafe {
            // Y0 U Y1 V
            let src = make(FourCC::YUYV, 2, 1, &[1, 2, 3, 4]);
            let dst = zbar_image_convert(src, FourCC::UYVY.as_u32());
            assert_eq!(bytes(dst), &[2, 1, 4, 3]);

            let gray = zbar_image_convert(src, FourCC::Y800.as_u32());
            assert_eq!(bytes(gray), &[1, 3]);

            zbar_image_destroy(gray);
            zbar_image_destroy(dst);
            zbar_image_destroy(src);
        }
    }

    #[test]
    fn test_planar_chroma_order() {
        unsafe {
            // 2x2 I420: Y plane, then U, then V
            let src = make(FourCC::I420, 2, 2, &[1, 2, 3, 4, 50, 60]);
            let dst = zbar_image_convert(src, FourCC::YV12.as_u32());
            assert_eq!(bytes(dst), &[1, 2, 3, 4, 60, 50]);
            zbar_image_destroy(dst);
            zbar_image_destroy(src);
        }
    }

    #[test]
    fn test_rgb_to_gray_and_back() {
        unsafe {
            let src = make(FourCC::RGB3, 2, 1, &[255, 255, 255, 0, 0, 0]);
            let gray = zbar_image_convert(src, FourCC::Y800.as_u32());
            assert_eq!(bytes(gray), &[255, 0]);

            let bgr4 = zbar_image_convert(gray, FourCC::BGR4.as_u32());
            assert_eq!(bytes(bgr4), &[255, 255, 255, 0, 0, 0, 0, 0]);

            zbar_image_destroy(bgr4);
            zbar_image_destroy(gray);
            zbar_image_destroy(src);
        }
    }

    #[test]
    fn test_unsupported_and_invalid_sources() {
        unsafe {
            let rgb = make(FourCC::RGB3, 1, 1, &[1, 2, 3]);
            assert!(zbar_image_convert(rgb, FourCC::I420.as_u32()).is_null());
            zbar_image_destroy(rgb);

            let yuv = make(FourCC::YUYV, 2, 1, &[1, 2, 3, 4]);
            assert!(zbar_image_convert(yuv, FourCC::RGB3.as_u32()).is_null());
            zbar_image_destroy(yuv);

            let short = make(FourCC::Y800, 4, 4, &[0; 8]);
            assert!(zbar_image_convert(short, FourCC::Y800.as_u32()).is_null());
            assert!(zbar_image_convert_resize(short, FourCC::Y800.as_u32(), 0, 1).is_null());
            zbar_image_destroy(short);

            let empty = zbar_image_create();
            zbar_image_set_format(empty, FourCC::Y800.as_u32());
            zbar_image_set_size(empty, 1, 1);
            assert!(zbar_image_convert(empty, FourCC::Y800.as_u32()).is_null());
            zbar_image_destroy(empty);
        }
    }
}
