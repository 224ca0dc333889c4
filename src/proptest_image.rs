//! Property-based tests for buffer ownership and conversion
//!
//! These tests generate random buffers and sizes and check that the image
//! handle copies data in and out, and that conversion leaves its source
//! alone.

use crate::{FourCC, Image};
use proptest::prelude::*;

fn gray_image() -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (1u32..24, 1u32..24).prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            prop::collection::vec(any::<u8>(), (w * h) as usize),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_data_roundtrip(data in prop::collection::vec(any::<u8>(), 0..4096)) {
        let mut image = Image::new().unwrap();
        image.set_data(&data).unwrap();
        let mut copy = image.data().unwrap();
        prop_assert_eq!(&copy, &data);

        copy.iter_mut().for_each(|b| *b = b.wrapping_add(1));
        prop_assert_eq!(image.data().unwrap(), data);
    }

    #[test]
    fn prop_convert_preserves_source(
        (w, h, data) in gray_image(),
        target in prop::sample::select(vec![
            FourCC::GREY,
            FourCC::I420,
            FourCC::YV12,
            FourCC::P422,
            FourCC::YUYV,
            FourCC::UYVY,
            FourCC::RGB3,
            FourCC::BGR4,
        ]),
    ) {
        let mut image = Image::from_gray(&data, w, h).unwrap();
        image.set_sequence(9).unwrap();

        let mut converted = image.convert(target).unwrap();
        prop_assert_eq!(converted.format().unwrap(), target);
        let (cw, ch) = converted.size().unwrap();
        prop_assert!(cw >= w && ch >= h);
        prop_assert!(cw - w <= 1 && ch - h <= 1);

        converted.dispose();
        prop_assert_eq!(image.size().unwrap(), (w, h));
        prop_assert_eq!(image.format().unwrap(), FourCC::Y800);
        prop_assert_eq!(image.sequence().unwrap(), 9);
        prop_assert_eq!(image.data().unwrap(), data);
    }

    #[test]
    fn prop_gray_survives_yuv(
        (w, h, data) in gray_image(),
        via in prop::sample::select(vec![FourCC::I420, FourCC::YUYV, FourCC::YVYU, FourCC::P422]),
    ) {
        let image = Image::from_gray(&data, w, h).unwrap();
        let yuv = image.convert(via).unwrap();
        let back = yuv.convert_resize(FourCC::Y800, w, h).unwrap();
        prop_assert_eq!(back.data().unwrap(), data);
    }

    #[test]
    fn prop_resize_pads_with_last_row((w, h, data) in gray_image(), extra in 1u32..8) {
        let image = Image::from_gray(&data, w, h).unwrap();
        let bigger = image.convert_resize(FourCC::GREY, w + extra, h + extra).unwrap();
        let out = bigger.data().unwrap();
        let nw = (w + extra) as usize;
        for y in 0..(h + extra) as usize {
            for x in 0..nw {
                let sx = x.min(w as usize - 1);
                let sy = y.min(h as usize - 1);
                prop_assert_eq!(out[y * nw + x], data[sy * w as usize + sx]);
            }
        }
    }
}
