//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Pre-order flattening and uniquing, ahead of encoding.
//!
//! Grounded in `_flattenPlist` from `CFBinaryPList.c`. Produces the ordered
//! object list, a pointer-identity map from each occurrence visited during the
//! walk to its index, and (internally) a separate value-equality map used only
//! to unique primitives.

use std::collections::HashMap;

use crate::object::Object;

/// Maps a reference to its index by address, not by `Object`'s derived
/// (structural) equality. Two distinct, value-equal, non-uniqued occurrences
/// (e.g. two `Boolean(true)`s) must resolve to two distinct indices, which a
/// value-keyed map cannot express since they'd collide as the same key.
type IdentityMap<'a> = HashMap<*const Object, usize>;

/// The result of flattening a plist tree ahead of encoding.
pub struct Flattened<'a> {
    /// Distinct emitted values in the order they should be written; index 0 is the root.
    pub objects: Vec<&'a Object>,
    /// Maps every occurrence visited during the walk (keyed by address, not
    /// value) to the index of the object it was encoded as.
    index_of: IdentityMap<'a>,
}

impl<'a> Flattened<'a> {
    /// Looks up the object index a child reference should encode.
    ///
    /// Every value reachable from the root was visited during flattening, so
    /// this never misses for a well-formed tree.
    pub fn index_of(&self, value: &'a Object) -> usize {
        self.index_of[&(value as *const Object)]
    }
}

/// Flattens `root` into an ordered object list and identity map.
///
/// Strings, integers, reals, dates and data are uniqued by value equality:
/// the second and subsequent occurrences of an equal primitive share one
/// entry in `objects`. Containers and booleans are never uniqued, matching
/// `_flattenPlist`'s comment that containers "are slow to compare, and have
/// poor hash codes" and that uniquing bools is unnecessary.
pub fn flatten(root: &Object) -> Flattened<'_> {
    let mut objects = Vec::new();
    let mut index_of = HashMap::new();
    let mut uniquing = HashMap::new();
    walk(root, &mut objects, &mut index_of, &mut uniquing);
    Flattened { objects, index_of }
}

fn is_uniquing_candidate(value: &Object) -> bool {
    matches!(
        value,
        Object::String(_)
            | Object::Integer(_)
            | Object::Integer128(_)
            | Object::Real32(_)
            | Object::Real64(_)
            | Object::Date(_)
            | Object::Data(_)
    )
}

fn walk<'a>(
    value: &'a Object,
    objects: &mut Vec<&'a Object>,
    index_of: &mut IdentityMap<'a>,
    uniquing: &mut HashMap<&'a Object, usize>,
) {
    if is_uniquing_candidate(value) {
        if let Some(&existing) = uniquing.get(value) {
            index_of.insert(value as *const Object, existing);
            return;
        }
    }

    let index = objects.len();
    objects.push(value);
    index_of.insert(value as *const Object, index);

    if is_uniquing_candidate(value) {
        uniquing.insert(value, index);
    }

    match value {
        Object::Dictionary(pairs) => {
            for (key, _) in pairs {
                walk(key, objects, index_of, uniquing);
            }
            for (_, val) in pairs {
                walk(val, objects, index_of, uniquing);
            }
        }
        Object::Array(elements) | Object::Set(elements) => {
            for element in elements {
                walk(element, objects, index_of, uniquing);
            }
        }
        _ => {}
    }
}
