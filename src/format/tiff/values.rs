//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry (when they fit in the
//! value/offset field) or at an offset in the file. Array values are fetched
//! with a single range read.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF source, respecting the file's byte order.
pub struct ValueReader<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader + ?Sized> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Get the byte order from the header.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry.
    /// For offset values, fetches the bytes from the source.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.header.byte_order);
            let len = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("value of {} bytes is too large", size),
            })?;
            Ok(self.reader.read_exact_at(offset, len)?)
        }
    }

    /// Read a single unsigned value from an entry.
    ///
    /// Handles Short and Long field types, converting as needed.
    pub fn read_u32(&self, entry: &IfdEntry, tag: &'static str) -> Result<u32, TiffError> {
        if let Some(value) = entry.inline_u32(self.header.byte_order) {
            return Ok(value);
        }

        let values = self.read_u32_array(entry, tag)?;
        match values.as_slice() {
            [value] => Ok(*value),
            _ => Err(TiffError::InvalidTagValue {
                tag,
                message: format!("expected count 1, got {}", entry.count),
            }),
        }
    }

    /// Read an array of u32 values from an entry.
    ///
    /// Accepts Short and Long field types.
    pub fn read_u32_array(&self, entry: &IfdEntry, tag: &'static str) -> Result<Vec<u32>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let byte_order = self.header.byte_order;
        let width = field_type.size_in_bytes();
        match field_type {
            FieldType::Short | FieldType::Long => {}
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag,
                    message: format!("expected Short or Long, got {:?}", other),
                })
            }
        }

        let bytes = self.read_bytes(entry)?;
        Ok(bytes
            .chunks_exact(width)
            .map(|chunk| match field_type {
                FieldType::Short => byte_order.read_u16(chunk) as u32,
                _ => byte_order.read_u32(chunk),
            })
            .collect())
    }

    /// Read an array of u64 values from an entry.
    ///
    /// Used for strip offsets and byte counts. Accepts Short, Long and Long8.
    pub fn read_u64_array(&self, entry: &IfdEntry, tag: &'static str) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if field_type != FieldType::Long8 {
            return Ok(self
                .read_u32_array(entry, tag)?
                .into_iter()
                .map(u64::from)
                .collect());
        }

        let byte_order = self.header.byte_order;
        let bytes = self.read_bytes(entry)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| byte_order.read_u64(chunk))
            .collect())
    }

    /// Read a single Rational value as `numerator / denominator`.
    ///
    /// A zero denominator reads as 0.0.
    pub fn read_rational(&self, entry: &IfdEntry, tag: &'static str) -> Result<f64, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        match field_type {
            FieldType::Rational => {
                let bytes = self.read_bytes(entry)?;
                if bytes.len() < 8 {
                    return Err(TiffError::InvalidTagValue {
                        tag,
                        message: "rational needs 8 bytes".to_string(),
                    });
                }
                let byte_order = self.header.byte_order;
                let numerator = byte_order.read_u32(&bytes[0..4]);
                let denominator = byte_order.read_u32(&bytes[4..8]);
                if denominator == 0 {
                    Ok(0.0)
                } else {
                    Ok(numerator as f64 / denominator as f64)
                }
            }
            // Some writers store integral resolutions as Short/Long
            FieldType::Short | FieldType::Long => Ok(self.read_u32(entry, tag)? as f64),
            other => Err(TiffError::InvalidTagValue {
                tag,
                message: format!("expected Rational, got {:?}", other),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
