//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

mod byteio;
mod de;
pub mod decode;
pub mod document;
pub mod encode;
mod error;
mod flatten;
mod intcodec;

pub mod object;
pub use object::Object;

pub use de::{from_slice, Deserializer};
pub use decode::{
    from_bytes, inspect_top_level, materialize, offset_of_value_at_index, offset_of_value_for_key,
    Mutability,
};
pub use document::Trailer;
pub use encode::{encode, EncodeOptions};
pub use error::{Error, ErrorKind, Result};
