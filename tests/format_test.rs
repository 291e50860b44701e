#![allow(missing_docs)]

use xnbcode::{Content, ContentError, ContentObject, TypeCatalog, Xnb, XnbOptions};

#[derive(Debug, Default, Clone, Copy, PartialEq, Content)]
#[content(value)]
struct Point {
    x: i32,
    y: i32,
}

fn plain() -> XnbOptions {
    XnbOptions::default().compress(false)
}

fn points() -> Vec<Point> {
    (0..3).map(|i| Point { x: i, y: i }).collect()
}

fn patch_total_size(bytes: &mut [u8]) {
    let total = bytes.len() as u32;
    bytes[6..10].copy_from_slice(&total.to_le_bytes());
}

#[test]
fn list_of_value_records_is_byte_exact() {
    let catalog = TypeCatalog::new();
    let bytes = plain()
        .serialize(&catalog, &points())
        .expect("Failed to compile container");

    let mut expected = Vec::new();
    expected.extend_from_slice(b"XNBw");
    expected.push(5); // format version
    expected.push(0); // flags
    expected.extend_from_slice(&64u32.to_le_bytes());
    expected.push(2); // type count
    expected.push(11);
    expected.extend_from_slice(b"List<Point>");
    expected.extend_from_slice(&0i32.to_le_bytes());
    expected.push(5);
    expected.extend_from_slice(b"Point");
    expected.extend_from_slice(&0i32.to_le_bytes());
    expected.push(0); // shared resources
    expected.push(1); // root type index
    expected.push(3); // element count
    for i in 0..3i32 {
        expected.extend_from_slice(&i.to_le_bytes());
        expected.extend_from_slice(&i.to_le_bytes());
    }

    assert_eq!(bytes, expected);
    let back: Vec<Point> = Xnb::load_bytes(&catalog, &bytes).expect("Failed to load container");
    assert_eq!(back, points());
}

#[test]
fn null_reference_root_is_the_zero_sentinel() {
    let catalog = TypeCatalog::new();
    let bytes = plain()
        .serialize(&catalog, &None::<String>)
        .expect("Failed to compile container");

    // Empty type table, no shared resources, null root slot.
    assert_eq!(&bytes[10..], [0, 0, 0]);
    let back: Option<String> = Xnb::load_bytes(&catalog, &bytes).expect("Failed to load");
    assert_eq!(back, None);
}

#[test]
fn output_is_deterministic_across_catalogs() {
    let a = plain().serialize(&TypeCatalog::new(), &points()).expect("compile");
    let b = plain().serialize(&TypeCatalog::new(), &points()).expect("compile");
    let c = plain().serialize(&TypeCatalog::new(), &points()).expect("compile");
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn object_slots_dispatch_on_the_runtime_type() -> xnbcode::Result<()> {
    let catalog = TypeCatalog::new();
    let values = vec![
        ContentObject::new(7i32),
        ContentObject::new(String::from("seven")),
        ContentObject::new(Point { x: 7, y: 7 }),
    ];
    let bytes = plain().serialize(&catalog, &values)?;

    let report = Xnb::inspect_bytes(&bytes)?;
    let names: Vec<&str> = report.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["List<Object>", "Int32", "String", "Point"]);

    let back: Vec<ContentObject> = Xnb::load_bytes(&catalog, &bytes)?;
    assert_eq!(back[0].downcast_ref::<i32>(), Some(&7));
    assert_eq!(back[1].downcast_ref::<String>().map(String::as_str), Some("seven"));
    assert_eq!(back[2].downcast_ref::<Point>(), Some(&Point { x: 7, y: 7 }));
    Ok(())
}

#[cfg(feature = "lz4_flex")]
#[test]
fn compression_toggle_sets_the_flag_and_size_field() -> xnbcode::Result<()> {
    let catalog = TypeCatalog::new();
    let names: Vec<String> = (0..500).map(|i| format!("spawn_point_{}", i % 10)).collect();

    let packed = XnbOptions::default().compress(true).serialize(&catalog, &names)?;
    let raw = plain().serialize(&catalog, &names)?;

    assert_eq!(packed[5] & 0x40, 0x40);
    assert_eq!(raw[5] & 0x40, 0);
    assert!(packed.len() < raw.len());

    let decompressed = u32::from_le_bytes([packed[10], packed[11], packed[12], packed[13]]);
    assert_eq!(decompressed as usize, raw.len() - 10);

    assert_eq!(Xnb::load_bytes::<Vec<String>>(&catalog, &packed)?, names);
    Ok(())
}

#[test]
fn truncated_container_is_a_framing_error() {
    let catalog = TypeCatalog::new();
    let bytes = plain().serialize(&catalog, &points()).expect("compile");

    let result = Xnb::load_bytes::<Vec<Point>>(&catalog, &bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(ContentError::Framing(_))));

    // Consistent header, but the body ends inside the last element.
    let mut cut = bytes[..bytes.len() - 2].to_vec();
    patch_total_size(&mut cut);
    let result = Xnb::load_bytes::<Vec<Point>>(&catalog, &cut);
    assert!(matches!(result, Err(ContentError::Framing(_))));
}

#[test]
fn trailing_bytes_are_rejected() {
    let catalog = TypeCatalog::new();
    let mut bytes = plain().serialize(&catalog, &points()).expect("compile");
    bytes.push(0);
    patch_total_size(&mut bytes);

    let result = Xnb::load_bytes::<Vec<Point>>(&catalog, &bytes);
    assert!(matches!(result, Err(ContentError::Framing(msg)) if msg.contains("unread")));
}

#[test]
fn bad_magic_and_version_are_rejected() {
    let catalog = TypeCatalog::new();
    let bytes = plain().serialize(&catalog, &1i32).expect("compile");

    let mut magic = bytes.clone();
    magic[0] = b'Y';
    assert!(matches!(
        Xnb::load_bytes::<i32>(&catalog, &magic),
        Err(ContentError::Framing(_))
    ));

    let mut version = bytes;
    version[4] = 4;
    assert!(matches!(
        Xnb::load_bytes::<i32>(&catalog, &version),
        Err(ContentError::Framing(_))
    ));
}

#[test]
fn unknown_type_fails_before_decoding() {
    let writer_catalog = TypeCatalog::new();
    let bytes = plain().serialize(&writer_catalog, &points()).expect("compile");

    // This catalog has never seen `Point`.
    let reader_catalog = TypeCatalog::new();
    let result = Xnb::load_bytes::<Vec<i32>>(&reader_catalog, &bytes);
    assert!(matches!(result, Err(ContentError::UnknownType(name)) if name.contains("List<Point>")));
}

#[derive(Debug, Default, PartialEq, Content)]
#[content(name = "Tile", version = 2)]
struct TileV2 {
    id: u16,
}

#[derive(Debug, Default, PartialEq, Content)]
#[content(name = "Tile")]
struct TileV1 {
    id: u16,
}

#[test]
fn type_version_mismatch_is_a_schema_error() {
    let bytes = plain()
        .serialize(&TypeCatalog::new(), &TileV2 { id: 3 })
        .expect("compile");

    let report = Xnb::inspect_bytes(&bytes).expect("inspect");
    assert_eq!(report.types[0].name, "Tile");
    assert_eq!(report.types[0].version, 2);

    let result = Xnb::load_bytes::<TileV1>(&TypeCatalog::new(), &bytes);
    assert!(matches!(result, Err(ContentError::Schema(_))));

    let back: TileV2 = Xnb::load_bytes(&TypeCatalog::new(), &bytes).expect("load");
    assert_eq!(back, TileV2 { id: 3 });
}

#[test]
fn out_of_range_type_index_is_a_framing_error() {
    let catalog = TypeCatalog::new();
    let mut bytes = plain().serialize(&catalog, &String::from("x")).expect("compile");

    // [1 type]["String" v0][0 shared][root index 1][len 1]['x']
    let root_index = bytes.len() - 3;
    assert_eq!(bytes[root_index], 1);
    bytes[root_index] = 9;
    let result = Xnb::load_bytes::<String>(&catalog, &bytes);
    assert!(matches!(result, Err(ContentError::Framing(_))));
}
