//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The binary property list decoder.
//!
//! Grounded in `__CFBinaryPlistGetTopLevelInfo`, `__CFBinaryPlistCreateObject2`
//! and `__CFBinaryPlistGetOffsetForValueFromDictionary3` /
//! `__CFBinaryPlistGetOffsetForValueFromArray2` from `CFBinaryPList.c`.
//!
//! [`inspect_top_level`] validates a document's trailer and offset table up
//! front, so [`materialize`] never has to re-check an offset it reads.
//! [`offset_of_value_for_key`] and [`offset_of_value_at_index`] read
//! containers directly off the wire without materializing siblings.

use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;

use ordered_float::OrderedFloat;

use crate::document::{ObjectFormat, Trailer, HEADER_SIZE, TRAILER_SIZE};
use crate::error::{Error, Result};
use crate::intcodec::{checked_add_usize, checked_mul_usize, read_be_sized, read_be_usize};
use crate::object::{Date, Int128, Object};

const HEADER_MAGIC_AND_VERSION_MAJOR: &[u8] = b"bplist0";

/// Controls how the decoder shares structure across occurrences of an
/// equal primitive value, mirroring CF's three `CFOptionFlags` decode modes.
///
/// A Rust `Object` tree owns every value it contains, so there is no
/// "mutable vs. immutable `CFString`" distinction to preserve; what the two
/// non-immutable modes buy here is a guarantee that no two calls to
/// `materialize` ever hand back aliased data, which is the only part of the
/// original distinction that still matters once ownership is already unique
/// per call. Both mutable modes therefore behave identically: they skip the
/// memoization cache that `Immutable` uses purely as a performance
/// optimization.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mutability {
    /// Equal primitives encountered more than once during one `materialize`
    /// call are memoized and returned as clones of a single decoded value.
    Immutable,
    /// Top-level containers are freshly allocated; equal primitives are not
    /// memoized, so the result can be mutated without aliasing another part
    /// of the tree.
    MutableContainers,
    /// As `MutableContainers`, and additionally documents the intent that
    /// leaf values are expected to be mutated independently as well.
    MutableContainersAndLeaves,
}

impl Mutability {
    fn memoizes(self) -> bool {
        matches!(self, Mutability::Immutable)
    }
}

/// The depth at which [`materialize`] starts tracking in-progress offsets to
/// detect cycles. Kept shallow recursion allocation-free, matching
/// `__CFBinaryPlistCreateObject2`'s `if (!set && 15 < curDepth)` guard.
const CYCLE_DETECTION_DEPTH: usize = 15;

/// Validates a document's header, trailer and offset table, and returns the
/// parsed trailer.
///
/// Every offset table entry is checked to lie within `[HEADER_SIZE,
/// offset_table_offset)` here, so [`materialize`] and the fast-path lookups
/// never need to re-validate an offset pulled from the table.
pub fn inspect_top_level(data: &[u8]) -> Result<Trailer> {
    if data.len() < HEADER_SIZE + 1 + TRAILER_SIZE {
        return Err(Error::MissingOrInvalidHeader);
    }
    if &data[0..7] != HEADER_MAGIC_AND_VERSION_MAJOR {
        return Err(Error::MissingOrInvalidHeader);
    }

    let trailer_start = data.len() - TRAILER_SIZE;
    let trailer = &data[trailer_start..];

    let sort_version = trailer[5];
    let offset_int_size = trailer[6] as usize;
    let object_ref_size = trailer[7] as usize;
    let number_of_objects = read_be_sized(&trailer[8..16], 8)?;
    let root_object = read_be_sized(&trailer[16..24], 8)?;
    let offset_table_offset = read_be_sized(&trailer[24..32], 8)?;

    if offset_int_size < 1 || object_ref_size < 1 {
        return Err(Error::MissingOrInvalidTrailer);
    }
    if number_of_objects == 0 {
        return Err(Error::MissingOrInvalidTrailer);
    }
    if number_of_objects > i64::max_value() as u128 {
        return Err(Error::MissingOrInvalidTrailer);
    }
    if offset_table_offset > i64::max_value() as u128 {
        return Err(Error::MissingOrInvalidTrailer);
    }
    if number_of_objects <= root_object {
        return Err(Error::InvalidRootObject);
    }

    let number_of_objects = usize::try_from(number_of_objects).map_err(|_| Error::IntegerOverflow)?;
    let root_object = usize::try_from(root_object).map_err(|_| Error::IntegerOverflow)?;
    let offset_table_offset = usize::try_from(offset_table_offset).map_err(|_| Error::IntegerOverflow)?;

    if offset_table_offset < HEADER_SIZE + 1 {
        return Err(Error::MissingOrInvalidOffsetTable);
    }
    if offset_table_offset >= data.len() - TRAILER_SIZE {
        return Err(Error::MissingOrInvalidOffsetTable);
    }

    let offset_table_size = checked_mul_usize(number_of_objects, offset_int_size)?;
    let expected_len = checked_add_usize(
        checked_add_usize(offset_table_offset, offset_table_size)?,
        TRAILER_SIZE,
    )?;
    if expected_len != data.len() {
        return Err(Error::MissingOrInvalidTrailer);
    }

    if object_ref_size < 8 && (1u128 << (8 * object_ref_size)) <= number_of_objects as u128 {
        return Err(Error::MissingOrInvalidTrailer);
    }
    if offset_int_size < 8 && (1u128 << (8 * offset_int_size)) <= offset_table_offset as u128 {
        return Err(Error::MissingOrInvalidTrailer);
    }

    let offset_table = &data[offset_table_offset..offset_table_offset + offset_table_size];
    for i in 0..number_of_objects {
        let entry = read_be_usize(&offset_table[i * offset_int_size..], offset_int_size)?;
        if entry < HEADER_SIZE || entry >= offset_table_offset {
            return Err(Error::InvalidOffsetToObject);
        }
    }

    let root_offset = read_be_usize(
        &offset_table[root_object * offset_int_size..],
        offset_int_size,
    )?;
    if root_offset < HEADER_SIZE || root_offset >= offset_table_offset {
        return Err(Error::InvalidRootObject);
    }

    Ok(Trailer {
        sort_version,
        offset_table_entry_size: offset_int_size,
        object_reference_size: object_ref_size,
        number_of_objects,
        root_object,
        offset_table_offset,
    })
}

/// Decodes a complete document: validates the trailer, then materializes the
/// root object under [`Mutability::Immutable`].
pub fn from_bytes(data: &[u8]) -> Result<Object> {
    let trailer = inspect_top_level(data)?;
    materialize(data, &trailer, Mutability::Immutable)
}

struct Reader<'a> {
    data: &'a [u8],
    trailer: &'a Trailer,
    cache: Option<HashMap<usize, Object>>,
}

impl<'a> Reader<'a> {
    fn offset_table_entry(&self, index: usize) -> Result<usize> {
        if index >= self.trailer.number_of_objects {
            return Err(Error::InvalidObjectReference);
        }
        let width = self.trailer.offset_table_entry_size;
        let start = self.trailer.offset_table_offset + index * width;
        read_be_usize(&self.data[start..], width)
    }

    fn marker(&self, offset: usize) -> Result<(ObjectFormat, u8)> {
        identify_marker(self.byte(offset)?)
    }

    fn byte(&self, offset: usize) -> Result<u8> {
        self.data.get(offset).copied().ok_or(Error::Eof)
    }

    /// Slices `[start, end)`, requiring the range to fall strictly before the
    /// offset table: a payload length large enough to otherwise fit in the
    /// buffer must not be allowed to read into the offset table or trailer.
    fn bounded_slice(&self, start: usize, end: usize) -> Result<&[u8]> {
        if end > self.trailer.offset_table_offset {
            return Err(Error::Eof);
        }
        self.data.get(start..end).ok_or(Error::Eof)
    }

    /// Reads the count embedded in a marker byte, returning `(count, bytes consumed
    /// by the marker and any auxiliary count object)`.
    fn read_count(&self, offset: usize, low_nibble: u8) -> Result<(usize, usize)> {
        if low_nibble != 0x0f {
            return Ok((low_nibble as usize, 1));
        }
        let count_marker_offset = checked_add_usize(offset, 1)?;
        let (format, count_low) = self.marker(count_marker_offset)?;
        let width = match format {
            ObjectFormat::UInt8 => 1,
            ObjectFormat::UInt16 => 2,
            ObjectFormat::UInt32 => 4,
            ObjectFormat::SInt64 => 8,
            _ => return Err(Error::InvalidOrUnsupportedObjectFormat),
        };
        let _ = count_low;
        let value_offset = checked_add_usize(count_marker_offset, 1)?;
        let value = read_be_usize(&self.data[value_offset..], width)?;
        Ok((value, 2 + width))
    }

    fn materialize_at(
        &mut self,
        offset: usize,
        depth: usize,
        mode: Mutability,
        path: &mut Option<HashSet<usize>>,
    ) -> Result<Object> {
        if let Some(set) = path {
            if set.contains(&offset) {
                return Err(Error::CycleDetected);
            }
        } else if depth > CYCLE_DETECTION_DEPTH {
            *path = Some(HashSet::new());
        }

        if mode.memoizes() {
            if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&offset)) {
                return Ok(cached.clone());
            }
        }

        let inserted_into_path = if let Some(set) = path.as_mut() {
            set.insert(offset)
        } else {
            false
        };

        let result = self.decode_object_at(offset, depth, mode, path);

        if inserted_into_path {
            if let Some(set) = path.as_mut() {
                set.remove(&offset);
            }
        }

        let result = result?;

        if mode.memoizes() {
            self.cache
                .get_or_insert_with(HashMap::new)
                .insert(offset, result.clone());
        }

        Ok(result)
    }

    fn decode_object_at(
        &mut self,
        offset: usize,
        depth: usize,
        mode: Mutability,
        path: &mut Option<HashSet<usize>>,
    ) -> Result<Object> {
        let (format, low_nibble) = self.marker(offset)?;
        match format {
            ObjectFormat::Null => Ok(Object::Null),
            ObjectFormat::Boolean => Ok(Object::Boolean(low_nibble & 0x01 != 0)),
            ObjectFormat::Fill => Err(Error::InvalidOrUnsupportedObjectFormat),
            ObjectFormat::UInt8 => self.read_int(offset, 1).map(Object::Integer),
            ObjectFormat::UInt16 => self.read_int(offset, 2).map(Object::Integer),
            ObjectFormat::UInt32 => self.read_int(offset, 4).map(Object::Integer),
            ObjectFormat::SInt64 => self.read_int(offset, 8).map(Object::Integer),
            ObjectFormat::SInt128 => self.read_int128(offset).map(Object::Integer128),
            ObjectFormat::Float32 => {
                let body = checked_add_usize(offset, 1)?;
                let bytes = self.take4(body)?;
                Ok(Object::Real32(OrderedFloat(f32::from_be_bytes(bytes))))
            }
            ObjectFormat::Float64 => {
                let body = checked_add_usize(offset, 1)?;
                let bytes = self.take8(body)?;
                Ok(Object::Real64(OrderedFloat(f64::from_be_bytes(bytes))))
            }
            ObjectFormat::Date => {
                let body = checked_add_usize(offset, 1)?;
                let bytes = self.take8(body)?;
                Ok(Object::Date(Date {
                    absolute_time: OrderedFloat(f64::from_be_bytes(bytes)),
                }))
            }
            ObjectFormat::Data => {
                let (count, header_len) = self.read_count(offset, low_nibble)?;
                let body = checked_add_usize(offset, header_len)?;
                let end = checked_add_usize(body, count)?;
                let bytes = self.bounded_slice(body, end)?;
                Ok(Object::Data(bytes.to_vec()))
            }
            ObjectFormat::AsciiString => {
                let (count, header_len) = self.read_count(offset, low_nibble)?;
                let body = checked_add_usize(offset, header_len)?;
                let end = checked_add_usize(body, count)?;
                let bytes = self.bounded_slice(body, end)?;
                let text = bytes
                    .iter()
                    .map(|&b| if b < 0x80 { b as char } else { '\u{fffd}' })
                    .collect::<String>();
                Ok(Object::String(text))
            }
            ObjectFormat::Utf16String => {
                let (count, header_len) = self.read_count(offset, low_nibble)?;
                let body = checked_add_usize(offset, header_len)?;
                let byte_len = checked_mul_usize(count, 2)?;
                let end = checked_add_usize(body, byte_len)?;
                let bytes = self.bounded_slice(body, end)?;
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                let text = String::from_utf16(&units).map_err(|_| Error::ExpectedUtf16String)?;
                Ok(Object::String(text))
            }
            ObjectFormat::Uid => {
                let width = low_nibble as usize + 1;
                let body = checked_add_usize(offset, 1)?;
                let bytes = self.data.get(body..body + width).ok_or(Error::Eof)?;
                let value = read_be_sized(bytes, width)?;
                if value > u32::max_value() as u128 {
                    return Err(Error::UidOutOfRange);
                }
                Ok(Object::Uid(value as u64))
            }
            ObjectFormat::Array => {
                let (count, header_len) = self.read_count(offset, low_nibble)?;
                let refs_offset = checked_add_usize(offset, header_len)?;
                self.validate_ref_array(refs_offset, count, 1)?;
                let mut elements = Vec::with_capacity(count);
                for i in 0..count {
                    let child_offset = self.child_offset(refs_offset, i)?;
                    elements.push(self.materialize_at(child_offset, depth + 1, mode, path)?);
                }
                Ok(Object::Array(elements))
            }
            ObjectFormat::Set => {
                let (count, header_len) = self.read_count(offset, low_nibble)?;
                let refs_offset = checked_add_usize(offset, header_len)?;
                self.validate_ref_array(refs_offset, count, 1)?;
                let mut elements = Vec::with_capacity(count);
                for i in 0..count {
                    let child_offset = self.child_offset(refs_offset, i)?;
                    elements.push(self.materialize_at(child_offset, depth + 1, mode, path)?);
                }
                Ok(Object::Set(elements))
            }
            ObjectFormat::Dictionary => {
                let (count, header_len) = self.read_count(offset, low_nibble)?;
                let keys_offset = checked_add_usize(offset, header_len)?;
                let ref_size = self.trailer.object_reference_size;
                self.validate_ref_array(keys_offset, count, 2)?;
                let values_offset = checked_add_usize(keys_offset, checked_mul_usize(count, ref_size)?)?;
                let mut pairs = Vec::with_capacity(count);
                for i in 0..count {
                    let key_offset = self.child_offset(keys_offset, i)?;
                    let key = self.materialize_at(key_offset, depth + 1, mode, path)?;
                    if !key.is_primitive() {
                        return Err(Error::NonPrimitiveKey);
                    }
                    let value_offset = self.child_offset(values_offset, i)?;
                    let value = self.materialize_at(value_offset, depth + 1, mode, path)?;
                    pairs.push((key, value));
                }
                Ok(Object::Dictionary(pairs))
            }
        }
    }

    /// Validates that a container's reference list (`count * multiplier`
    /// entries of `object_reference_size` bytes each, starting at `start`)
    /// lies entirely before the offset table, matching `CFBinaryPList.c`'s
    /// `check_size_t_mul`/`check_ptr_add` guard ahead of allocating the
    /// element list. Called before `Vec::with_capacity(count)` so a
    /// malformed, arbitrarily large claimed count is rejected instead of
    /// driving an oversized allocation or an out-of-bounds read.
    fn validate_ref_array(&self, start: usize, count: usize, multiplier: usize) -> Result<()> {
        let ref_size = self.trailer.object_reference_size;
        let total_refs = checked_mul_usize(count, multiplier)?;
        let byte_len = checked_mul_usize(total_refs, ref_size)?;
        let end = checked_add_usize(start, byte_len)?;
        if end > self.trailer.offset_table_offset {
            return Err(Error::InvalidRefArrayLength);
        }
        Ok(())
    }

    fn child_offset(&self, refs_offset: usize, index: usize) -> Result<usize> {
        let ref_size = self.trailer.object_reference_size;
        let entry_offset = checked_add_usize(refs_offset, checked_mul_usize(index, ref_size)?)?;
        let entry = self.data.get(entry_offset..entry_offset + ref_size).ok_or(Error::Eof)?;
        let object_index = read_be_usize(entry, ref_size)?;
        self.offset_table_entry(object_index)
    }

    fn read_int(&self, offset: usize, width: usize) -> Result<i64> {
        let body = checked_add_usize(offset, 1)?;
        let bytes = self.data.get(body..body + width).ok_or(Error::Eof)?;
        let value = read_be_sized(bytes, width)?;
        // Widths under 8 bytes are unsigned on the wire; an 8-byte value is
        // already the two's-complement bit pattern of a signed `i64`.
        Ok(value as i64)
    }

    fn read_int128(&self, offset: usize) -> Result<Int128> {
        let body = checked_add_usize(offset, 1)?;
        let bytes = self.data.get(body..body + 16).ok_or(Error::Eof)?;
        let mut high_bytes = [0u8; 8];
        let mut low_bytes = [0u8; 8];
        high_bytes.copy_from_slice(&bytes[..8]);
        low_bytes.copy_from_slice(&bytes[8..]);
        Ok(Int128 {
            high: i64::from_be_bytes(high_bytes),
            low: u64::from_be_bytes(low_bytes),
        })
    }

    fn take4(&self, offset: usize) -> Result<[u8; 4]> {
        let slice = self.data.get(offset..offset + 4).ok_or(Error::Eof)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn take8(&self, offset: usize) -> Result<[u8; 8]> {
        let slice = self.data.get(offset..offset + 8).ok_or(Error::Eof)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(slice);
        Ok(buf)
    }
}

/// Decodes the root object of a previously-validated document.
pub fn materialize(data: &[u8], trailer: &Trailer, mode: Mutability) -> Result<Object> {
    let mut reader = Reader {
        data,
        trailer,
        cache: if mode.memoizes() { Some(HashMap::new()) } else { None },
    };
    let root_offset = reader.offset_table_entry(trailer.root_object)?;
    let mut path = None;
    reader.materialize_at(root_offset, 0, mode, &mut path)
}

/// Looks up `key` in the dictionary at `dict_offset` without materializing
/// any sibling key or value, returning the byte offset of the matching
/// value's object, or `None` if no key compares equal.
///
/// Short ASCII keys are compared byte-for-byte against the wire bytes
/// directly; any other key representation is materialized in full before
/// comparison, mirroring `__CFBinaryPlistGetOffsetForValueFromDictionary3`'s
/// fast path.
pub fn offset_of_value_for_key(
    data: &[u8],
    trailer: &Trailer,
    dict_offset: usize,
    key: &str,
) -> Result<Option<usize>> {
    let reader = Reader {
        data,
        trailer,
        cache: None,
    };
    let (format, low_nibble) = reader.marker(dict_offset)?;
    if format != ObjectFormat::Dictionary {
        return Err(Error::ExpectedDictionary);
    }
    let (count, header_len) = reader.read_count(dict_offset, low_nibble)?;
    let keys_offset = checked_add_usize(dict_offset, header_len)?;
    let ref_size = trailer.object_reference_size;
    let values_offset = checked_add_usize(keys_offset, checked_mul_usize(count, ref_size)?)?;

    for i in 0..count {
        let key_offset = reader.child_offset(keys_offset, i)?;
        if key_matches(&reader, key_offset, key)? {
            let value_offset = reader.child_offset(values_offset, i)?;
            return Ok(Some(value_offset));
        }
    }
    Ok(None)
}

/// Returns the byte offset of the object at `index` within the array at
/// `array_offset`, or `None` if `index` is out of bounds.
pub fn offset_of_value_at_index(
    data: &[u8],
    trailer: &Trailer,
    array_offset: usize,
    index: usize,
) -> Result<Option<usize>> {
    let reader = Reader {
        data,
        trailer,
        cache: None,
    };
    let (format, low_nibble) = reader.marker(array_offset)?;
    if format != ObjectFormat::Array {
        return Err(Error::ExpectedArray);
    }
    let (count, header_len) = reader.read_count(array_offset, low_nibble)?;
    if index >= count {
        return Ok(None);
    }
    let refs_offset = checked_add_usize(array_offset, header_len)?;
    Ok(Some(reader.child_offset(refs_offset, index)?))
}

/// Compares a short ASCII string at `offset` to `key` without allocating
/// when the encoding is a direct match; falls back to a full materialize for
/// UTF-16 strings or embedded counts of 15 or more.
fn key_matches(reader: &Reader<'_>, offset: usize, key: &str) -> Result<bool> {
    let (format, low_nibble) = reader.marker(offset)?;
    if format == ObjectFormat::AsciiString && low_nibble != 0x0f && (low_nibble as usize) < 15 {
        let body = checked_add_usize(offset, 1)?;
        let count = low_nibble as usize;
        let bytes = reader.data.get(body..body + count).ok_or(Error::Eof)?;
        return Ok(bytes == key.as_bytes());
    }

    let mut reader_mut = Reader {
        data: reader.data,
        trailer: reader.trailer,
        cache: None,
    };
    let mut path = None;
    match reader_mut.materialize_at(offset, 0, Mutability::MutableContainers, &mut path)? {
        Object::String(s) => Ok(s == key),
        _ => Ok(false),
    }
}

fn identify_marker(byte: u8) -> Result<(ObjectFormat, u8)> {
    const ALL_FORMATS: [ObjectFormat; 18] = [
        ObjectFormat::Null,
        ObjectFormat::Boolean,
        ObjectFormat::Fill,
        ObjectFormat::UInt8,
        ObjectFormat::UInt16,
        ObjectFormat::UInt32,
        ObjectFormat::SInt64,
        ObjectFormat::SInt128,
        ObjectFormat::Float32,
        ObjectFormat::Float64,
        ObjectFormat::Date,
        ObjectFormat::Data,
        ObjectFormat::AsciiString,
        ObjectFormat::Utf16String,
        ObjectFormat::Uid,
        ObjectFormat::Array,
        ObjectFormat::Set,
        ObjectFormat::Dictionary,
    ];
    ALL_FORMATS
        .iter()
        .copied()
        .find(|format| byte & format.tag_mask() == format.tag_bits())
        .map(|format| (format, byte & 0x0f))
        .ok_or(Error::InvalidOrUnsupportedObjectFormat)
}
