//! Slicing integration tests.
//!
//! Tests verify:
//! - Slices partition the image and concatenate back to it
//! - Each slice is independent of its source and its siblings
//! - Uneven widths are rejected or truncated according to the policy
//! - Files are sliced end to end and slices can be written back out

use proptest::prelude::*;
use tempfile::TempDir;

use tiff_slicer::{
    read_all, slice_file, slice_page, slice_vertically, slice_vertically_with, write_many,
    write_one, CodecError, ImageBuffer, Page, RasterError, RemainderPolicy, ResolutionUnit,
    TiffMetadataSet,
};

use super::test_utils::test_page;

fn concat_columns(slices: &[ImageBuffer]) -> Vec<Vec<u16>> {
    let height = slices[0].height() as usize;
    (0..height)
        .map(|y| {
            slices
                .iter()
                .flat_map(|s| s.u16_rows().unwrap()[y].iter().copied())
                .collect()
        })
        .collect()
}

// =============================================================================
// Partitioning
// =============================================================================

#[test]
fn test_two_halves() {
    let page = test_page(8, 3);
    let slices = slice_vertically(&page.image, 2).unwrap();

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].u16_rows().unwrap()[0], vec![0, 1, 2, 3]);
    assert_eq!(slices[1].u16_rows().unwrap()[0], vec![4, 5, 6, 7]);
    assert_eq!(slices[1].u16_rows().unwrap()[2], vec![2004, 2005, 2006, 2007]);
}

#[test]
fn test_count_one_is_an_independent_copy() {
    let page = test_page(5, 2);
    let mut slices = slice_vertically(&page.image, 1).unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0], page.image);

    slices[0].u16_row_mut(0).unwrap()[0] = 9999;
    assert_eq!(page.image.u16_rows().unwrap()[0][0], 0);
}

#[test]
fn test_count_equal_to_width() {
    let page = test_page(4, 2);
    let slices = slice_vertically(&page.image, 4).unwrap();
    assert_eq!(slices.len(), 4);
    for (x, slice) in slices.iter().enumerate() {
        assert_eq!(slice.width(), 1);
        assert_eq!(slice.u16_rows().unwrap(), &[vec![x as u16], vec![1000 + x as u16]]);
    }
}

#[test]
fn test_uneven_width_rejected_by_default() {
    let page = test_page(10, 2);
    assert_eq!(
        slice_vertically(&page.image, 3),
        Err(RasterError::InvalidSliceCount {
            count: 3,
            width: 10
        })
    );
}

#[test]
fn test_uneven_width_truncated_on_request() {
    let page = test_page(10, 2);
    let slices = slice_vertically_with(&page.image, 3, RemainderPolicy::Truncate).unwrap();

    assert_eq!(slices.len(), 3);
    assert!(slices.iter().all(|s| s.width() == 3));
    assert_eq!(slices[2].u16_rows().unwrap()[0], vec![6, 7, 8]);
}

#[test]
fn test_invalid_counts() {
    let page = test_page(4, 1);
    for policy in [RemainderPolicy::Reject, RemainderPolicy::Truncate] {
        assert!(slice_vertically_with(&page.image, 0, policy).is_err());
        assert!(slice_vertically_with(&page.image, 5, policy).is_err());
    }
}

#[test]
fn test_slice_page_maps_to_invalid_argument() {
    let page = test_page(10, 1);
    assert!(matches!(
        slice_page(&page, 3, RemainderPolicy::Reject),
        Err(CodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_slice_page_keeps_metadata() {
    let metadata = TiffMetadataSet {
        x_resolution: 600.0,
        resolution_unit: ResolutionUnit::Centimeter,
        ..Default::default()
    };
    let page = Page::with_metadata(test_page(6, 2).image, metadata.clone());

    let slices = slice_page(&page, 2, RemainderPolicy::Reject).unwrap();
    assert!(slices.iter().all(|s| s.metadata == metadata));
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_slice_file_and_write_each() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.tif");
    let page = test_page(12, 4);
    write_one(&page, &source).unwrap();

    let slices = slice_file(&source, 3, RemainderPolicy::Reject).unwrap();
    assert_eq!(slices.len(), 3);

    for (i, slice) in slices.iter().enumerate() {
        let path = dir.path().join(format!("slice{}.tif", i));
        write_one(slice, &path).unwrap();
        let read = read_all(&path).unwrap();
        assert_eq!(read[0].image.width(), 4);
        assert_eq!(read[0].image.u16_rows().unwrap()[0][0], (i * 4) as u16);
    }
}

#[test]
fn test_slice_file_to_multi_page() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.tif");
    let page = test_page(6, 3);
    write_one(&page, &source).unwrap();

    let slices = slice_file(&source, 2, RemainderPolicy::Reject).unwrap();
    let out = dir.path().join("slices.tif");
    write_many(&slices, &out).unwrap();

    let read = read_all(&out).unwrap();
    assert_eq!(read.len(), 2);
    let images: Vec<ImageBuffer> = read.into_iter().map(|p| p.image).collect();
    assert_eq!(concat_columns(&images), page.image.u16_rows().unwrap());
}

#[test]
fn test_slice_empty_file_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("empty.tif");
    std::fs::write(&source, b"").unwrap();

    assert!(slice_file(&source, 2, RemainderPolicy::Reject)
        .unwrap()
        .is_empty());
}

#[test]
fn test_slice_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        slice_file(dir.path().join("nope.tif"), 2, RemainderPolicy::Reject),
        Err(CodecError::NotFound(_))
    ));
}

// =============================================================================
// Property Tests
// =============================================================================

fn arb_sliceable() -> impl Strategy<Value = (ImageBuffer, u32)> {
    (1u32..=16, 1u32..=8, 1u32..=8).prop_flat_map(|(slice_width, count, height)| {
        let width = slice_width * count;
        proptest::collection::vec(any::<u16>(), (width * height) as usize).prop_map(
            move |samples| {
                let rows = samples
                    .chunks(width as usize)
                    .map(|r| r.to_vec())
                    .collect();
                (ImageBuffer::from_u16_rows(width, rows).unwrap(), count)
            },
        )
    })
}

proptest! {
    #[test]
    fn prop_slices_concatenate_to_source((image, count) in arb_sliceable()) {
        let slices = slice_vertically(&image, count).unwrap();

        prop_assert_eq!(slices.len(), count as usize);
        for slice in &slices {
            prop_assert_eq!(slice.width(), image.width() / count);
            prop_assert_eq!(slice.height(), image.height());
        }
        prop_assert_eq!(concat_columns(&slices), image.u16_rows().unwrap().to_vec());
    }

    #[test]
    fn prop_truncate_drops_only_remainder(
        (image, _) in arb_sliceable(),
        count in 1u32..=8,
    ) {
        prop_assume!(count <= image.width());
        let slices = slice_vertically_with(&image, count, RemainderPolicy::Truncate).unwrap();
        let kept = (image.width() / count * count) as usize;

        let expected: Vec<Vec<u16>> = image
            .u16_rows()
            .unwrap()
            .iter()
            .map(|row| row[..kept].to_vec())
            .collect();
        prop_assert_eq!(concat_columns(&slices), expected);
    }
}
