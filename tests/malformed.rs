use std::convert::TryInto;

use bplist::{encode, from_bytes, inspect_top_level, EncodeOptions, Error, Object};

fn valid_document() -> Vec<u8> {
    let root = Object::Dictionary(vec![(
        Object::String("k".into()),
        Object::String("v".into()),
    )]);
    encode(&root, EncodeOptions::default()).unwrap()
}

#[test]
fn well_formed_document_is_accepted() {
    let bytes = valid_document();
    assert!(inspect_top_level(&bytes).is_ok());
}

#[test]
fn zero_number_of_objects_is_rejected() {
    let mut bytes = valid_document();
    let len = bytes.len();
    // number_of_objects occupies trailer bytes [len-24, len-16).
    for byte in &mut bytes[len - 24..len - 16] {
        *byte = 0;
    }
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn root_object_equal_to_number_of_objects_is_rejected() {
    let mut bytes = valid_document();
    let len = bytes.len();
    let number_of_objects = u64::from_be_bytes(bytes[len - 24..len - 16].try_into().unwrap());
    // root_object (top_object) occupies trailer bytes [len-16, len-8).
    bytes[len - 16..len - 8].copy_from_slice(&number_of_objects.to_be_bytes());
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn offset_int_size_of_zero_is_rejected() {
    let mut bytes = valid_document();
    let len = bytes.len();
    bytes[len - 32 + 6] = 0;
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn object_ref_size_of_zero_is_rejected() {
    let mut bytes = valid_document();
    let len = bytes.len();
    bytes[len - 32 + 7] = 0;
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn truncating_final_byte_is_rejected() {
    let mut bytes = valid_document();
    bytes.pop();
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn appending_extra_byte_is_rejected() {
    let mut bytes = valid_document();
    bytes.push(0x00);
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn offset_table_offset_pointing_past_end_is_rejected() {
    let mut bytes = valid_document();
    let len = bytes.len();
    let way_past_end = (len as u64) + 1000;
    bytes[len - 8..len].copy_from_slice(&way_past_end.to_be_bytes());
    assert!(inspect_top_level(&bytes).is_err());
}

#[test]
fn version_byte_after_magic_is_accepted_regardless_of_value() {
    // Per spec.md 4.F.1 step 2, the eighth header byte is accepted as any
    // single byte; only the preceding seven-byte "bplist0" magic is checked.
    let mut bytes = valid_document();
    bytes[7] = b'9';
    assert!(inspect_top_level(&bytes).is_ok());
}

#[test]
fn array_with_out_of_bounds_claimed_count_is_rejected() {
    // A single array object whose marker escapes to a UInt32 count of
    // 0xFFFFFFF (268,435,455) but whose document carries no such number of
    // refs. The claimed ref array would extend far past offset_table_offset,
    // so this must be caught before `Vec::with_capacity(count)` is reached.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"bplist00");
    bytes.push(0xaf); // array marker, count escape (low nibble 0xf)
    bytes.push(0x12); // UInt32 marker for the count integer
    bytes.extend_from_slice(&0x0fff_ffffu32.to_be_bytes());
    let offset_table_offset = bytes.len() as u64;
    bytes.push(8); // offset table: object 0 begins at byte 8

    bytes.extend_from_slice(&[0u8; 5]); // unused
    bytes.push(0); // sort_version
    bytes.push(1); // offset_int_size
    bytes.push(1); // object_ref_size
    bytes.extend_from_slice(&1u64.to_be_bytes()); // number_of_objects
    bytes.extend_from_slice(&0u64.to_be_bytes()); // root_object
    bytes.extend_from_slice(&offset_table_offset.to_be_bytes()); // offset_table_offset

    assert!(inspect_top_level(&bytes).is_ok());
    assert_eq!(from_bytes(&bytes), Err(Error::InvalidRefArrayLength));
}

#[test]
fn uid_value_exceeding_u32_max_is_rejected() {
    // An 8-byte UID body encoding 0x1_0000_0000, one past u32::MAX, fits in a
    // u64 but must still be rejected per spec.md 3.1's 32-bit UID bound.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"bplist00");
    bytes.push(0x87); // uid marker, width 8
    bytes.extend_from_slice(&0x1_0000_0000u64.to_be_bytes());
    let offset_table_offset = bytes.len() as u64;
    bytes.push(8); // offset table: object 0 begins at byte 8

    bytes.extend_from_slice(&[0u8; 5]); // unused
    bytes.push(0); // sort_version
    bytes.push(1); // offset_int_size
    bytes.push(1); // object_ref_size
    bytes.extend_from_slice(&1u64.to_be_bytes()); // number_of_objects
    bytes.extend_from_slice(&0u64.to_be_bytes()); // root_object
    bytes.extend_from_slice(&offset_table_offset.to_be_bytes()); // offset_table_offset

    assert!(inspect_top_level(&bytes).is_ok());
    assert_eq!(from_bytes(&bytes), Err(Error::UidOutOfRange));
}
