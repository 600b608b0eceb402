//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The bplist object model.
//!
//! The bplist format version 00 supports the following object kinds:
//!
//! 1. Null.
//! 2. Boolean.
//! 3. Integers, up to 128 bits long.
//! 4. Real, single- and double-precision.
//! 5. Data.
//! 6. Date.
//! 7. String.
//! 8. Uid.
//! 9. Array.
//! 10. Set (decode-only).
//! 11. Dictionary.
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-855.17/CFBinaryPList.c

use ordered_float::OrderedFloat;

/// A date structure roughly equivalent to an `NSDate`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Date {
    /// A double-precision 64-bit offset, in seconds, from the Core Data Epoch.
    /// This is defined as 1 January 2001, 00:00:00 UTC.
    pub absolute_time: OrderedFloat<f64>,
}

/// A signed 128-bit integer, represented as the two 64-bit halves the wire
/// format stores it as (high signed, low unsigned). Only ever produced by
/// the decoder when reading a legacy 16-byte integer object; emitted back
/// out verbatim when a tree containing one is re-encoded.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Int128 {
    /// The high 64 bits, interpreted as signed.
    pub high: i64,
    /// The low 64 bits, interpreted as unsigned.
    pub low: u64,
}

/// Represents any valid bplist object.
///
/// Every variant except [`Object::Array`], [`Object::Set`] and
/// [`Object::Dictionary`] is a *primitive*: primitives are the only values
/// the flattener uniques by value-equality during encoding, and the only
/// values legal as dictionary keys. See [`Object::is_primitive`].
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Object {
    /// The `CFNull` singleton.
    Null,

    /// Represents a bplist boolean, like `NSNumber`.
    Boolean(bool),

    /// Represents a bplist integral value of up to 64 bits, like `NSNumber`.
    Integer(i64),

    /// Represents a bplist 128-bit integral value, read only from legacy archives
    /// unless the tree being encoded already contains one.
    Integer128(Int128),

    /// Represents a single-precision bplist floating-point value, like `NSNumber`.
    Real32(OrderedFloat<f32>),

    /// Represents a double-precision bplist floating-point value, like `NSNumber`.
    ///
    /// Unlike normal `f64` values, these values have a defined order, implementing
    /// `Ord`, `Eq` and `Hash` in addition to `PartialOrd` and `PartialEq`.
    /// This allows them to be used as keys and values in Dictionaries.
    Real64(OrderedFloat<f64>),

    /// Represents a bplist data instance, like `NSData`.
    Data(Vec<u8>),

    /// Represents a bplist date, like `NSDate`.
    ///
    /// Dates are encoded as `CFAbsoluteTime` values. This is a double-precision 64-bit
    /// offset, in seconds, from the Core Data Epoch, defined as 1 January 2001, 00:00:00 UTC.
    Date(Date),

    /// Represents a bplist UID value used by `NSKeyedArchiver`. Stored as a
    /// `u64` since the wire format allows UID widths up to 8 bytes, though in
    /// practice only 1, 2, 4 and 8-byte widths are ever emitted.
    Uid(u64),

    /// Represents a bplist string, like `NSString`. Whether this is transcribed
    /// as an ASCII or UTF-16 wire object is decided at encode time based on
    /// content, not tracked as part of the value.
    String(String),

    /// Represents a bplist array of objects, like `NSArray<id>`.
    Array(Vec<Object>),

    /// Represents an unordered collection of objects, like `NSSet<id>`.
    ///
    /// The encoder has no way to produce this kind: sets only ever arise from
    /// decoding an archive that already contains one.
    /// Attempting to encode a tree containing `Object::Set` fails with
    /// `Error::UnsupportedValue`.
    Set(Vec<Object>),

    /// Represents a bplist dictionary, like `NSDictionary<id,id>`.
    ///
    /// Stored as a vector of pairs rather than a map so that insertion order
    /// is preserved for re-serialization. Keys are expected
    /// to be primitive; this is checked by the encoder and decoder, not by
    /// the type itself.
    Dictionary(Vec<(Object, Object)>),
}

impl Object {
    /// True for every variant except `Array`, `Set` and `Dictionary`.
    ///
    /// Primitives are the only objects the flattener unique, and the only
    /// objects legal as dictionary keys.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Object::Array(_) | Object::Set(_) | Object::Dictionary(_))
    }

    /// Looks up `key` in a `Dictionary` object's insertion-ordered pair list.
    ///
    /// Returns `None` for non-dictionary objects or an absent key. This is a
    /// convenience over the in-memory tree; the byte-level fast path lives in
    /// [`crate::decode::offset_of_value_for_key`].
    pub fn get<'a>(&'a self, key: &Object) -> Option<&'a Object> {
        match self {
            Object::Dictionary(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

mod de;
