//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The binary property list encoder.
//!
//! Grounded in `__CFBinaryPlistWrite` from `CFBinaryPList.c`: flattens the
//! tree (see [`crate::flatten`]), emits one object body per entry while
//! recording its offset, then emits the offset table and trailer.

use ascii::AsciiStr;

use crate::byteio::ByteWriter;
use crate::document::{HEADER_MAGIC_NUMBER, HEADER_VERSION_00, TRAILER_PREAMBLE_UNUSED_SIZE};
use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::intcodec::{minimal_byte_count, minimal_byte_count_uid, width_log2, write_be};
use crate::object::Object;

/// A best-effort size estimate for the output buffer; `0` lets the writer
/// fall back to its default. Mirrors the `estimate` parameter of
/// `__CFBinaryPlistWrite`.
#[derive(Copy, Clone, Default)]
pub struct EncodeOptions {
    /// A hint for how many bytes the encoded document is expected to occupy.
    pub size_estimate: usize,
}

/// Encodes `root` as a `bplist00` document.
///
/// Returns the number of bytes written on success. Fails with
/// `Error::UnsupportedValue` if `root` (or anything it contains) is an
/// `Object::Set`, which this encoder cannot emit: sets only ever arise from decoding.
pub fn encode(root: &Object, options: EncodeOptions) -> Result<Vec<u8>> {
    let flat = flatten(root);
    let object_ref_size = minimal_byte_count(flat.objects.len() as u64);

    let mut writer = ByteWriter::with_capacity(if options.size_estimate > 0 {
        options.size_estimate
    } else {
        flat.objects.len() * 16 + 32
    });

    writer.write(HEADER_MAGIC_NUMBER);
    writer.write(&[HEADER_VERSION_00.0, HEADER_VERSION_00.1]);

    let mut offsets = Vec::with_capacity(flat.objects.len());
    for object in &flat.objects {
        offsets.push(writer.bytes_emitted());
        write_object(&mut writer, object, &flat, object_ref_size)?;
    }

    let offset_table_offset = writer.bytes_emitted();
    let offset_int_size = minimal_byte_count(offset_table_offset as u64);
    for offset in &offsets {
        let mut buf = Vec::with_capacity(offset_int_size);
        write_be(&mut buf, *offset as u64, offset_int_size);
        writer.write(&buf);
    }

    write_trailer(
        &mut writer,
        offset_int_size,
        object_ref_size,
        flat.objects.len(),
        offset_table_offset,
    );

    writer.into_vec().ok_or(Error::ResourceExhausted)
}

fn write_trailer(
    writer: &mut ByteWriter,
    offset_int_size: usize,
    object_ref_size: usize,
    number_of_objects: usize,
    offset_table_offset: usize,
) {
    writer.write(&[0u8; TRAILER_PREAMBLE_UNUSED_SIZE]);
    writer.write_u8(0); // sort_version
    writer.write_u8(offset_int_size as u8);
    writer.write_u8(object_ref_size as u8);
    let mut buf = Vec::with_capacity(8);
    write_be(&mut buf, number_of_objects as u64, 8);
    writer.write(&buf);
    buf.clear();
    write_be(&mut buf, 0u64, 8); // top_object is always index 0 on emit.
    writer.write(&buf);
    buf.clear();
    write_be(&mut buf, offset_table_offset as u64, 8);
    writer.write(&buf);
}

fn write_ref(writer: &mut ByteWriter, index: usize, width: usize) {
    let mut buf = Vec::with_capacity(width);
    write_be(&mut buf, index as u64, width);
    writer.write(&buf);
}

fn write_object(
    writer: &mut ByteWriter,
    object: &Object,
    flat: &crate::flatten::Flattened<'_>,
    object_ref_size: usize,
) -> Result<()> {
    match object {
        Object::Null => {
            writer.write_u8(0x00);
        }
        Object::Boolean(false) => {
            writer.write_u8(0x08);
        }
        Object::Boolean(true) => {
            writer.write_u8(0x09);
        }
        Object::Integer(value) => {
            write_minimal_int(writer, *value as u64);
        }
        Object::Integer128(int128) => {
            // Low nibble 4 for the legacy 16-byte integer; not a power-of-two log2 width.
            writer.write_u8(0x14);
            let mut buf = Vec::with_capacity(16);
            buf.extend_from_slice(&int128.high.to_be_bytes());
            buf.extend_from_slice(&int128.low.to_be_bytes());
            writer.write(&buf);
        }
        Object::Real32(value) => {
            writer.write_u8(0x22);
            writer.write(&value.into_inner().to_be_bytes());
        }
        Object::Real64(value) => {
            writer.write_u8(0x23);
            writer.write(&value.into_inner().to_be_bytes());
        }
        Object::Date(date) => {
            writer.write_u8(0x33);
            writer.write(&date.absolute_time.into_inner().to_be_bytes());
        }
        Object::Data(bytes) => {
            write_count_marker(writer, 0x40, bytes.len());
            writer.write(bytes);
        }
        Object::String(s) => {
            write_string(writer, s);
        }
        Object::Uid(value) => {
            let width = minimal_byte_count_uid(*value);
            writer.write_u8(0x80 | (width as u8 - 1));
            let mut buf = Vec::with_capacity(width);
            write_be(&mut buf, *value, width);
            writer.write(&buf);
        }
        Object::Array(elements) => {
            write_count_marker(writer, 0xA0, elements.len());
            for element in elements {
                write_ref(writer, flat.index_of(element), object_ref_size);
            }
        }
        Object::Set(_) => {
            return Err(Error::UnsupportedValue);
        }
        Object::Dictionary(pairs) => {
            write_count_marker(writer, 0xD0, pairs.len());
            for (key, _) in pairs {
                write_ref(writer, flat.index_of(key), object_ref_size);
            }
            for (_, value) in pairs {
                write_ref(writer, flat.index_of(value), object_ref_size);
            }
        }
    }
    Ok(())
}

/// Emits a minimal-width integer body (marker `0x10 | log2(width)` then the
/// big-endian payload). Note that per CF's own
/// `_appendInt`, values are always written unsigned-minimal: a negative
/// `i64` is therefore always emitted as a full 8-byte two's-complement value,
/// since it never compares `<=` any of the smaller unsigned bounds.
fn write_minimal_int(writer: &mut ByteWriter, bits: u64) {
    let width = minimal_byte_count(bits);
    writer.write_u8(0x10 | width_log2(width));
    let mut buf = Vec::with_capacity(width);
    write_be(&mut buf, bits, width);
    writer.write(&buf);
}

/// Emits the marker byte for a counted object: `base | count` when `count < 15`,
/// else `base | 0xf` followed by a minimal-width integer object carrying the count.
fn write_count_marker(writer: &mut ByteWriter, base: u8, count: usize) {
    if count < 15 {
        writer.write_u8(base | count as u8);
    } else {
        writer.write_u8(base | 0x0f);
        write_minimal_int(writer, count as u64);
    }
}

/// Attempts ASCII
/// transcription first, falling back to big-endian UTF-16 code units.
fn write_string(writer: &mut ByteWriter, value: &str) {
    let char_count = value.chars().count();
    if let Ok(ascii) = AsciiStr::from_ascii(value.as_bytes()) {
        if ascii.len() == char_count {
            write_count_marker(writer, 0x50, char_count);
            writer.write(ascii.as_bytes());
            return;
        }
    }

    write_count_marker(writer, 0x60, char_count);
    let mut buf = Vec::with_capacity(char_count * 2);
    for unit in value.encode_utf16() {
        buf.extend_from_slice(&unit.to_be_bytes());
    }
    writer.write(&buf);
}
