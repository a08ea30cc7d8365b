//! Display conversion integration tests.
//!
//! Tests verify:
//! - The 16-to-8-bit mapping hits its fixed points and stays monotonic
//! - `read_displayable` decodes only 16-bit single-sample grayscale
//! - Padded output and JPEG previews are well formed

use proptest::prelude::*;
use tempfile::TempDir;

use tiff_slicer::{
    downsample_sample, encode_jpeg, read_displayable, write_one, DisplayBuffer, ImageBuffer, Page,
    Photometric, TiffMetadataSet,
};

use super::test_utils::{
    create_gray16_tiff, write_temp, ByteOrderType, IfdBuilder, TiffBuilder, PHOTOMETRIC, SHORT,
};

// =============================================================================
// Downsampling
// =============================================================================

#[test]
fn test_downsample_fixed_points() {
    assert_eq!(downsample_sample(0), 0);
    assert_eq!(downsample_sample(257), 1);
    assert_eq!(downsample_sample(65535), 255);
    assert_eq!(downsample_sample(128), 0);
    assert_eq!(downsample_sample(129), 1);
    assert_eq!(downsample_sample(257 * 100), 100);
}

proptest! {
    #[test]
    fn prop_downsample_is_nearest(v in any::<u16>()) {
        let out = downsample_sample(v) as f64;
        prop_assert!((out - v as f64 / 257.0).abs() <= 0.5);
    }

    #[test]
    fn prop_downsample_is_monotonic(a in any::<u16>(), b in any::<u16>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(downsample_sample(lo) <= downsample_sample(hi));
    }
}

// =============================================================================
// read_displayable
// =============================================================================

#[test]
fn test_read_displayable_gray16() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(
        dir.path(),
        "gray.tif",
        &create_gray16_tiff(3, 1, &[0, 257, 65535]),
    );

    let display = read_displayable(&path).unwrap().unwrap();
    assert_eq!(display.width(), 3);
    assert_eq!(display.height(), 1);
    assert_eq!(display.data(), &[0, 0, 0, 1, 1, 1, 255, 255, 255]);
}

#[test]
fn test_read_displayable_uses_first_page_only() {
    let dir = TempDir::new().unwrap();
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::gray16(
            1,
            1,
            &[65535],
            1,
            ByteOrderType::LittleEndian,
        ))
        .add_ifd(IfdBuilder::gray16(2, 2, &[0; 4], 2, ByteOrderType::LittleEndian))
        .build();
    let path = write_temp(dir.path(), "two.tif", &data);

    let display = read_displayable(&path).unwrap().unwrap();
    assert_eq!((display.width(), display.height()), (1, 1));
    assert_eq!(display.pixel(0, 0), Some([255, 255, 255]));
}

#[test]
fn test_read_displayable_rejects_color() {
    let dir = TempDir::new().unwrap();
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::gray16(2, 1, &[1, 2], 1, ByteOrderType::LittleEndian)
                .entry(PHOTOMETRIC, SHORT, &[2]),
        )
        .build();
    let path = write_temp(dir.path(), "rgb.tif", &data);

    assert!(read_displayable(&path).unwrap().is_none());
}

#[test]
fn test_read_displayable_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(dir.path(), "empty.tif", &[]);
    assert!(read_displayable(&path).unwrap().is_none());
}

#[test]
fn test_min_is_white_is_not_inverted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("white.tif");
    let metadata = TiffMetadataSet {
        photometric: Photometric::MinIsWhite,
        ..Default::default()
    };
    let image = ImageBuffer::from_u16_rows(2, vec![vec![0, 65535]]).unwrap();
    write_one(&Page::with_metadata(image, metadata), &path).unwrap();

    let display = read_displayable(&path).unwrap().unwrap();
    assert_eq!(display.data(), &[0, 0, 0, 255, 255, 255]);
}

// =============================================================================
// Presentation
// =============================================================================

#[test]
fn test_padded_rows() {
    let image = ImageBuffer::from_u16_rows(3, vec![vec![0, 0, 0], vec![65535, 65535, 65535]])
        .unwrap();
    let display = DisplayBuffer::from_image(&image).unwrap();

    // 9 bytes per row, padded to 12
    let padded = display.to_padded(4);
    assert_eq!(padded.len(), 24);
    assert_eq!(&padded[9..12], &[0, 0, 0]);
    assert_eq!(&padded[12..21], &[255; 9]);
    assert_eq!(display.to_padded(1), display.data());
}

#[test]
fn test_jpeg_preview() {
    let rows = (0..32)
        .map(|y| (0..48).map(|x| (x * 1365 + y * 100) as u16).collect())
        .collect();
    let page = Page::new(ImageBuffer::from_u16_rows(48, rows).unwrap());
    let display = page.to_display_buffer().unwrap();

    let jpeg = encode_jpeg(&display, 85).unwrap();
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8], "JPEG should start with SOI");
    assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9], "JPEG should end with EOI");

    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (48, 32));
}
