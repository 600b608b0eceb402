//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Serde does not provide a data type analogous to a UID.
//! As such, the binary plist UID type is mapped onto a special-cased map key
//! that `Object`'s own `Deserialize` impl intercepts directly; this module only
//! needs to supply the pseudo-value types the generic `Deserializer<'de>` path
//! uses to smuggle the UID's big-endian byte width through serde's map access.

use serde::de;

use std::fmt;

/// Name of the field in the structure.
pub const STRUCT_FIELD: &str = "$__bplist_private_Uid_data";

/// A UID's big-endian byte representation, widened into a `u64`.
///
/// The wire format allows UID widths of 1 through 8 bytes; the value is
/// interpreted as an unsigned big-endian integer of that width, matching
/// `Object::Uid(u64)`.
pub struct UidFromU64 {
    pub value: u64,
}

impl<'de> de::Deserialize<'de> for UidFromU64 {
    fn deserialize<D>(deserializer: D) -> Result<UidFromU64, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = UidFromU64;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("uid data")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<UidFromU64, E>
            where
                E: de::Error,
            {
                let value = v.iter().fold(0u64, |acc, &byte| (acc << 8) | byte as u64);
                Ok(UidFromU64 { value })
            }
        }

        deserializer.deserialize_bytes(Visitor)
    }
}
