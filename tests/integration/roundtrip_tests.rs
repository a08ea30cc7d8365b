//! Write-then-read integration tests.
//!
//! Tests verify:
//! - Pixels, geometry and metadata survive a write and read
//! - Multi-page files keep page order and carry paging tags
//! - Written files are atomic and replace existing destinations
//! - Samples survive for arbitrary geometries (property tests)

use proptest::prelude::*;
use tempfile::TempDir;

use tiff_slicer::{
    read_all, write_many, write_one, CodecError, ImageBuffer, Orientation, Page, PageInfo,
    ResolutionUnit, TiffMetadataSet, TiffReader, TiffWriter,
};

use super::test_utils::{is_tiff_magic, test_page};

// =============================================================================
// Single Page
// =============================================================================

#[test]
fn test_single_page_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("single.tif");
    let page = test_page(7, 5);

    write_one(&page, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(is_tiff_magic(&bytes));
    assert_eq!(&bytes[0..4], &[0x49, 0x49, 0x2A, 0x00]);
    assert_eq!(bytes.len() % 2, 0, "Directory data should end word-aligned");

    let pages = read_all(&path).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].image, page.image);
    assert_eq!(pages[0].metadata.page, None, "Single pages carry no paging tags");
}

#[test]
fn test_metadata_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("meta.tif");
    let metadata = TiffMetadataSet {
        x_resolution: 300.0,
        y_resolution: 150.5,
        resolution_unit: ResolutionUnit::Centimeter,
        orientation: Orientation::BottomRight,
        ..Default::default()
    };
    let page = Page::with_metadata(test_page(4, 4).image, metadata.clone());

    write_one(&page, &path).unwrap();
    let read = TiffReader::open(&path).unwrap().metadata(0).unwrap();

    assert_eq!(read.x_resolution, 300.0);
    assert_eq!(read.y_resolution, 150.5);
    assert_eq!(read.resolution_unit, ResolutionUnit::Centimeter);
    assert_eq!(read.orientation, Orientation::BottomRight);
    assert_eq!(read.photometric, metadata.photometric);
    assert_eq!(read.bits_per_sample, 16);
    assert_eq!(read.samples_per_pixel, 1);
}

#[test]
fn test_default_metadata_written() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("defaults.tif");

    write_one(&test_page(3, 2), &path).unwrap();
    let read = TiffReader::open(&path).unwrap().metadata(0).unwrap();

    assert_eq!(read.x_resolution, 72.0);
    assert_eq!(read.y_resolution, 72.0);
    assert_eq!(read.resolution_unit, ResolutionUnit::Inch);
    assert_eq!(read.rows_per_strip, Some(2), "One strip holds the whole image");
}

#[test]
fn test_multi_strip_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("strips.tif");
    let metadata = TiffMetadataSet {
        rows_per_strip: Some(3),
        ..Default::default()
    };
    let page = Page::with_metadata(test_page(5, 10).image, metadata);

    write_one(&page, &path).unwrap();

    let reader = TiffReader::open(&path).unwrap();
    assert_eq!(reader.layout(0).unwrap().strip_offsets.len(), 4);
    assert_eq!(reader.read_page(0).unwrap().image, page.image);
}

#[test]
fn test_write_rows_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.tif");
    let rows = vec![vec![0u16, 65535, 1], vec![2, 3, 4]];

    TiffWriter::new(&path)
        .unwrap()
        .write_rows(&rows, 3, &TiffMetadataSet::default())
        .unwrap();

    let pages = read_all(&path).unwrap();
    assert_eq!(pages[0].image.u16_rows().unwrap(), rows.as_slice());
}

#[test]
fn test_write_rows_without_rows_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nothing.tif");

    TiffWriter::new(&path)
        .unwrap()
        .write_rows(&[], 3, &TiffMetadataSet::default())
        .unwrap();
    assert!(!path.exists());
}

// =============================================================================
// Multi Page
// =============================================================================

#[test]
fn test_multi_page_roundtrip_preserves_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("multi.tif");
    let pages: Vec<Page> = (0..3u16)
        .map(|p| {
            let rows = vec![vec![p, p + 10], vec![p + 20, p + 30]];
            Page::new(ImageBuffer::from_u16_rows(2, rows).unwrap())
        })
        .collect();

    write_many(&pages, &path).unwrap();

    let read = read_all(&path).unwrap();
    assert_eq!(read.len(), 3);
    for (index, (written, read)) in pages.iter().zip(&read).enumerate() {
        assert_eq!(read.image, written.image, "Page {} pixels differ", index);
        assert_eq!(
            read.metadata.page,
            Some(PageInfo {
                index: index as u16,
                total: 3
            })
        );
    }
}

#[test]
fn test_multi_page_with_one_page_has_no_paging_tags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.tif");

    write_many(&[test_page(2, 2)], &path).unwrap();
    let read = read_all(&path).unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].metadata.page, None);
}

#[test]
fn test_multi_page_rejects_empty_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.tif");

    assert!(matches!(
        write_many(&[], &path),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(!path.exists());
}

#[test]
fn test_multi_page_rejects_mismatched_geometry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mismatch.tif");

    let result = write_many(&[test_page(4, 4), test_page(4, 5)], &path);
    assert!(matches!(result, Err(CodecError::InvalidArgument(_))));
    assert!(!path.exists(), "A failed write should leave no file behind");
}

// =============================================================================
// Destinations
// =============================================================================

#[test]
fn test_write_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("nested.tif");

    write_one(&test_page(2, 2), &path).unwrap();
    assert_eq!(read_all(&path).unwrap().len(), 1);
}

#[test]
fn test_write_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("replace.tif");
    std::fs::write(&path, b"stale contents").unwrap();

    let page = test_page(3, 3);
    write_one(&page, &path).unwrap();
    assert_eq!(read_all(&path).unwrap()[0].image, page.image);
}

#[test]
fn test_failed_write_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.tif");
    let original = test_page(2, 2);
    write_one(&original, &path).unwrap();

    let bad = Page::with_metadata(
        test_page(2, 2).image,
        TiffMetadataSet {
            x_resolution: f32::NAN,
            ..Default::default()
        },
    );
    assert!(matches!(
        write_one(&bad, &path),
        Err(CodecError::InvalidArgument(_))
    ));
    assert_eq!(read_all(&path).unwrap()[0].image, original.image);
}

#[test]
fn test_empty_path_rejected() {
    assert!(matches!(
        write_one(&test_page(1, 1), ""),
        Err(CodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_directory_destination_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        write_one(&test_page(1, 1), dir.path()),
        Err(CodecError::Path { .. })
    ));
}

// =============================================================================
// Property Tests
// =============================================================================

fn arb_image() -> impl Strategy<Value = ImageBuffer> {
    (1u32..=64, 1u32..=64).prop_flat_map(|(width, height)| {
        proptest::collection::vec(any::<u16>(), (width * height) as usize).prop_map(
            move |samples| {
                let rows = samples
                    .chunks(width as usize)
                    .map(|r| r.to_vec())
                    .collect();
                ImageBuffer::from_u16_rows(width, rows).unwrap()
            },
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_single_page_roundtrip(image in arb_image()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prop.tif");
        write_one(&Page::new(image.clone()), &path).unwrap();

        let pages = read_all(&path).unwrap();
        prop_assert_eq!(pages.len(), 1);
        prop_assert_eq!(&pages[0].image, &image);
    }

    #[test]
    fn prop_rows_per_strip_does_not_change_pixels(
        image in arb_image(),
        rows_per_strip in 1u32..=70,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strips.tif");
        let metadata = TiffMetadataSet {
            rows_per_strip: Some(rows_per_strip),
            ..Default::default()
        };
        write_one(&Page::with_metadata(image.clone(), metadata), &path).unwrap();

        let pages = read_all(&path).unwrap();
        prop_assert_eq!(&pages[0].image, &image);
    }
}
