//! Pixel format codes and their sample layouts

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A four character code identifying a pixel sample format.
///
/// The code is stored little-endian, so the first character is the low byte,
/// matching the layout of the `format` field in the native image.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCC(u32);

impl FourCC {
    /// 8-bit grayscale
    pub const GREY: Self = Self::new(b'G', b'R', b'E', b'Y');
    /// Same as GREY
    pub const Y800: Self = Self::new(b'Y', b'8', b'0', b'0');
    /// Same as GREY
    pub const Y8: Self = Self::new(b'Y', b'8', b' ', b' ');
    /// Planar 4:2:0, U plane first
    pub const I420: Self = Self::new(b'I', b'4', b'2', b'0');
    /// Same as I420
    pub const YU12: Self = Self::new(b'Y', b'U', b'1', b'2');
    /// Planar 4:2:0, V plane first
    pub const YV12: Self = Self::new(b'Y', b'V', b'1', b'2');
    /// Planar 4:2:2, U plane first
    pub const P422: Self = Self::new(b'4', b'2', b'2', b'P');
    /// Packed 4:2:2, Y0 U Y1 V
    pub const YUYV: Self = Self::new(b'Y', b'U', b'Y', b'V');
    /// Same as YUYV
    pub const YUY2: Self = Self::new(b'Y', b'U', b'Y', b'2');
    /// Packed 4:2:2, U Y0 V Y1
    pub const UYVY: Self = Self::new(b'U', b'Y', b'V', b'Y');
    /// Packed 4:2:2, Y0 V Y1 U
    pub const YVYU: Self = Self::new(b'Y', b'V', b'Y', b'U');
    /// 24-bit R G B
    pub const RGB3: Self = Self::new(b'R', b'G', b'B', b'3');
    /// 24-bit B G R
    pub const BGR3: Self = Self::new(b'B', b'G', b'R', b'3');
    /// 32-bit R G B X
    pub const RGB4: Self = Self::new(b'R', b'G', b'B', b'4');
    /// 32-bit B G R X
    pub const BGR4: Self = Self::new(b'B', b'G', b'R', b'4');

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self((a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24))
    }

    pub const fn from_u32(code: u32) -> Self {
        Self(code)
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self}, {:#010x})", self.0)
    }
}

/// Parses up to four ASCII characters, padding short codes with spaces
/// (`"Y8"` is `"Y8  "`).
impl FromStr for FourCC {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.as_bytes();
        if raw.is_empty() || raw.len() > 4 || !raw.iter().all(|b| b.is_ascii_graphic()) {
            return Err(Error::InvalidFourCC(s.to_string()));
        }
        let mut bytes = [b' '; 4];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self::from_bytes(bytes))
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> Self {
        fourcc.0
    }
}

/// Order of the three colour channels inside a packed RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RgbOrder {
    pub(crate) bpp: usize,
    pub(crate) r: usize,
    pub(crate) g: usize,
    pub(crate) b: usize,
}

/// Byte offsets of the four samples in a packed 4:2:2 macropixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PackedOrder {
    pub(crate) y0: usize,
    pub(crate) u: usize,
    pub(crate) y1: usize,
    pub(crate) v: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormatGroup {
    Gray,
    /// Chroma planes subsampled by `1 << xsub` / `1 << ysub`
    YuvPlanar { xsub: u32, ysub: u32, v_first: bool },
    YuvPacked(PackedOrder),
    Rgb(RgbOrder),
}

impl FormatGroup {
    pub(crate) fn lookup(fourcc: FourCC) -> Option<Self> {
        let group = match fourcc {
            FourCC::GREY | FourCC::Y800 | FourCC::Y8 => Self::Gray,
            FourCC::I420 | FourCC::YU12 => Self::YuvPlanar {
                xsub: 1,
                ysub: 1,
                v_first: false,
            },
            FourCC::YV12 => Self::YuvPlanar {
                xsub: 1,
                ysub: 1,
                v_first: true,
            },
            FourCC::P422 => Self::YuvPlanar {
                xsub: 1,
                ysub: 0,
                v_first: false,
            },
            FourCC::YUYV | FourCC::YUY2 => Self::YuvPacked(PackedOrder {
                y0: 0,
                u: 1,
                y1: 2,
                v: 3,
            }),
            FourCC::UYVY => Self::YuvPacked(PackedOrder {
                u: 0,
                y0: 1,
                v: 2,
                y1: 3,
            }),
            FourCC::YVYU => Self::YuvPacked(PackedOrder {
                y0: 0,
                v: 1,
                y1: 2,
                u: 3,
            }),
            FourCC::RGB3 => Self::Rgb(RgbOrder {
                bpp: 3,
                r: 0,
                g: 1,
                b: 2,
            }),
            FourCC::BGR3 => Self::Rgb(RgbOrder {
                bpp: 3,
                r: 2,
                g: 1,
                b: 0,
            }),
            FourCC::RGB4 => Self::Rgb(RgbOrder {
                bpp: 4,
                r: 0,
                g: 1,
                b: 2,
            }),
            FourCC::BGR4 => Self::Rgb(RgbOrder {
                bpp: 4,
                r: 2,
                g: 1,
                b: 0,
            }),
            _ => return None,
        };
        Some(group)
    }

    /// Rounds dimensions up to the format's block size.
    pub(crate) fn round_size(self, width: u32, height: u32) -> (u32, u32) {
        fn round_up(v: u32, shift: u32) -> u32 {
            let mask = (1u32 << shift) - 1;
            v.saturating_add(mask) & !mask
        }
        match self {
            Self::Gray | Self::Rgb(_) => (width, height),
            Self::YuvPlanar { xsub, ysub, .. } => (round_up(width, xsub), round_up(height, ysub)),
            Self::YuvPacked(_) => (round_up(width, 1), height),
        }
    }

    /// Number of bytes needed for an image of (already rounded) size.
    pub(crate) fn frame_size(self, width: u32, height: u32) -> Option<usize> {
        let pixels = (width as usize).checked_mul(height as usize)?;
        match self {
            Self::Gray => Some(pixels),
            Self::Rgb(order) => pixels.checked_mul(order.bpp),
            Self::YuvPacked(_) => pixels.checked_mul(2),
            Self::YuvPlanar { xsub, ysub, .. } => {
                let chroma = ((width >> xsub) as usize).checked_mul((height >> ysub) as usize)?;
                pixels.checked_add(chroma.checked_mul(2)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_byte_order() {
        assert_eq!(FourCC::Y800.as_u32(), 0x30303859);
        assert_eq!(FourCC::GREY.as_u32(), 0x59455247);
        assert_eq!(FourCC::Y800.to_bytes(), *b"Y800");
    }

    #[test]
    fn test_fourcc_parse() {
        assert_eq!("Y800".parse::<FourCC>().unwrap(), FourCC::Y800);
        assert_eq!("Y8".parse::<FourCC>().unwrap(), FourCC::Y8);
        assert!("".parse::<FourCC>().is_err());
        assert!("TOOLONG".parse::<FourCC>().is_err());
        assert!("Y 8".parse::<FourCC>().is_err());
    }

    #[test]
    fn test_fourcc_display() {
        assert_eq!(FourCC::RGB3.to_string(), "RGB3");
        assert_eq!(FourCC::from_u32(0x0000_3859).to_string(), "Y8..");
    }

    #[test]
    fn test_round_size() {
        let i420 = FormatGroup::lookup(FourCC::I420).unwrap();
        assert_eq!(i420.round_size(5, 3), (6, 4));
        let yuyv = FormatGroup::lookup(FourCC::YUYV).unwrap();
        assert_eq!(yuyv.round_size(5, 3), (6, 3));
        let gray = FormatGroup::lookup(FourCC::Y800).unwrap();
        assert_eq!(gray.round_size(5, 3), (5, 3));
    }

    #[test]
    fn test_frame_size() {
        let i420 = FormatGroup::lookup(FourCC::I420).unwrap();
        assert_eq!(i420.frame_size(4, 2), Some(8 + 2 + 2));
        let p422 = FormatGroup::lookup(FourCC::P422).unwrap();
        assert_eq!(p422.frame_size(4, 2), Some(8 + 4 + 4));
        let rgb4 = FormatGroup::lookup(FourCC::RGB4).unwrap();
        assert_eq!(rgb4.frame_size(3, 3), Some(36));
        assert!(FormatGroup::lookup(FourCC::new(b'M', b'J', b'P', b'G')).is_none());
    }
}
