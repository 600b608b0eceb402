#[test]
fn test_deserialize_integer_list() {
    let array = bplist::Object::Array(
        (1..=5).map(bplist::Object::Integer).collect()
    );
    let data = bplist::encode(&array, bplist::EncodeOptions::default()).unwrap();

    assert_eq!(
        bplist::from_slice::<Vec<u8>>(&data),
        Ok(vec![1, 2, 3, 4, 5])
    );
}
