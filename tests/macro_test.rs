#![allow(missing_docs)]

use xnbcode::math::{Color, Vector3};
use xnbcode::{Content, ContentError, ContentObject, SharedRef, TypeCatalog, Xnb, XnbOptions};

fn plain() -> XnbOptions {
    XnbOptions::default().compress(false)
}

// --- Records with a base ---

#[derive(Debug, Default, Clone, PartialEq, Content)]
struct Entity {
    id: u32,
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Content)]
struct Enemy {
    health: f32,
    #[content(ignore)]
    path_cache: Vec<Vector3>,
    #[content(base)]
    entity: Entity,
}

#[test]
fn base_is_written_first_and_ignored_fields_reset() {
    let catalog = TypeCatalog::new();
    let enemy = Enemy {
        health: 12.5,
        path_cache: vec![Vector3::new(1.0, 2.0, 3.0)],
        entity: Entity {
            id: 9,
            name: "slime".into(),
        },
    };
    let bytes = plain().serialize(&catalog, &enemy).expect("compile");

    let report = Xnb::inspect_bytes(&bytes).expect("inspect");
    let names: Vec<&str> = report.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Enemy", "Entity", "String"]);

    // [root index][id u32][name index][len]"slime"[health f32]
    let body = &bytes[bytes.len() - 16..];
    assert_eq!(body[0], 1);
    assert_eq!(&body[1..5], &9u32.to_le_bytes());
    assert_eq!(body[5], 3);
    assert_eq!(&body[6..12], b"\x05slime");
    assert_eq!(&body[12..], &12.5f32.to_le_bytes());

    let back: Enemy = Xnb::load_bytes(&catalog, &bytes).expect("load");
    assert_eq!(back.entity, enemy.entity);
    assert_eq!(back.health, 12.5);
    assert!(back.path_cache.is_empty());
}

// --- Shared resources ---

#[derive(Debug, Default, PartialEq, Content)]
struct Material {
    name: String,
    tint: Color,
}

#[derive(Debug, Default, Content)]
struct Mesh {
    name: String,
    #[content(shared)]
    material: SharedRef<Material>,
}

#[derive(Debug, Default, Content)]
struct Model {
    meshes: Vec<Mesh>,
    #[content(shared)]
    palette: Vec<SharedRef<Material>>,
}

#[test]
fn shared_resources_keep_their_identity() {
    let catalog = TypeCatalog::new();
    let stone = SharedRef::from_value(Material {
        name: "stone".into(),
        tint: Color::new(128, 128, 128, 255),
    });
    let moss = SharedRef::from_value(Material {
        name: "moss".into(),
        tint: Color::new(0, 200, 0, 255),
    });
    let model = Model {
        meshes: vec![
            Mesh {
                name: "wall".into(),
                material: stone.clone(),
            },
            Mesh {
                name: "pillar".into(),
                material: stone.clone(),
            },
            Mesh {
                name: "floor".into(),
                material: SharedRef::empty(),
            },
        ],
        palette: vec![moss.clone(), stone.clone()],
    };
    let bytes = plain().serialize(&catalog, &model).expect("compile");

    let report = Xnb::inspect_bytes(&bytes).expect("inspect");
    assert_eq!(report.shared_count, 2);

    let back: Model = Xnb::load_bytes(&catalog, &bytes).expect("load");
    let wall = &back.meshes[0].material;
    let pillar = &back.meshes[1].material;
    assert!(wall.ptr_eq(pillar));
    assert!(wall.ptr_eq(&back.palette[1]));
    assert!(!wall.ptr_eq(&back.palette[0]));
    assert!(!back.meshes[2].material.is_set());
    assert_eq!(wall.get().map(|m| m.name.as_str()), Some("stone"));
    assert_eq!(back.palette[0], moss);
}

#[derive(Debug, Default, PartialEq, Content)]
struct Waypoint {
    label: String,
    #[content(shared)]
    next: SharedRef<Waypoint>,
}

#[derive(Debug, Default, Content)]
struct Route {
    #[content(shared)]
    start: SharedRef<Waypoint>,
}

#[test]
fn shared_payloads_may_reference_later_resources() {
    let catalog = TypeCatalog::new();
    let gate = SharedRef::from_value(Waypoint {
        label: "gate".into(),
        next: SharedRef::empty(),
    });
    let bridge = SharedRef::from_value(Waypoint {
        label: "bridge".into(),
        next: gate,
    });
    let route = Route { start: bridge };
    let bytes = plain().serialize(&catalog, &route).expect("compile");
    assert_eq!(Xnb::inspect_bytes(&bytes).expect("inspect").shared_count, 2);

    let back: Route = Xnb::load_bytes(&catalog, &bytes).expect("load");
    let first = back.start.get().expect("start resolved");
    let second = first.next.get().expect("next resolved");
    assert_eq!(first.label, "bridge");
    assert_eq!(second.label, "gate");
    assert!(!second.next.is_set());
}

#[derive(Debug, Default, Content)]
struct Bulletin {
    #[content(shared)]
    headline: SharedRef<ContentObject>,
    #[content(shared)]
    banner: SharedRef<ContentObject>,
    #[content(shared)]
    footer: SharedRef<ContentObject>,
}

#[test]
fn shared_object_slots_keep_their_identity() {
    let catalog = TypeCatalog::new();
    let notice = SharedRef::from_value(ContentObject::new(String::from("market day")));
    let bulletin = Bulletin {
        headline: notice.clone(),
        banner: notice,
        footer: SharedRef::from_value(ContentObject::new(7i32)),
    };
    let bytes = plain().serialize(&catalog, &bulletin).expect("compile");
    assert_eq!(Xnb::inspect_bytes(&bytes).expect("inspect").shared_count, 2);

    let back: Bulletin = Xnb::load_bytes(&catalog, &bytes).expect("load");
    assert!(back.headline.ptr_eq(&back.banner));
    assert!(!back.headline.ptr_eq(&back.footer));
    let headline = back.headline.get().and_then(|o| o.downcast_ref::<String>());
    assert_eq!(headline.map(String::as_str), Some("market day"));
    let footer = back.footer.get().and_then(|o| o.downcast_ref::<i32>());
    assert_eq!(footer, Some(&7));
}

#[derive(Debug, Default, Content)]
struct Signpost {
    #[content(shared)]
    text: SharedRef<String>,
}

#[derive(Debug, Default, Content)]
#[content(name = "Signpost")]
struct NumberedSignpost {
    #[content(shared)]
    text: SharedRef<i32>,
}

#[test]
fn shared_slot_of_another_type_is_a_schema_error() {
    let sign = Signpost {
        text: SharedRef::from_value(String::from("north")),
    };
    let bytes = plain().serialize(&TypeCatalog::new(), &sign).expect("compile");
    let result = Xnb::load_bytes::<NumberedSignpost>(&TypeCatalog::new(), &bytes);
    assert!(matches!(result, Err(ContentError::Schema(_))));
}

// --- Enums ---

#[derive(Debug, Default, Clone, Copy, PartialEq, Content)]
#[repr(u8)]
enum Blend {
    #[default]
    Opaque = 0,
    Additive = 3,
    Alpha = 7,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Content)]
enum Facing {
    #[default]
    North,
    South,
}

#[test]
fn enums_use_their_repr() {
    let catalog = TypeCatalog::new();
    let bytes = plain().serialize(&catalog, &Blend::Alpha).expect("compile");

    let report = Xnb::inspect_bytes(&bytes).expect("inspect");
    assert_eq!(report.types[0].name, "Enum<Blend>");
    assert_eq!(report.payload_size, 2);
    assert_eq!(bytes.last(), Some(&7));
    assert_eq!(Xnb::load_bytes::<Blend>(&catalog, &bytes).expect("load"), Blend::Alpha);

    let bytes = plain().serialize(&catalog, &vec![Facing::South]).expect("compile");
    assert_eq!(&bytes[bytes.len() - 4..], &1i32.to_le_bytes());
    assert_eq!(
        Xnb::load_bytes::<Vec<Facing>>(&catalog, &bytes).expect("load"),
        [Facing::South]
    );
}

#[test]
fn unknown_discriminant_is_a_framing_error() {
    let catalog = TypeCatalog::new();
    let mut bytes = plain().serialize(&catalog, &Blend::Additive).expect("compile");
    if let Some(last) = bytes.last_mut() {
        *last = 5;
    }
    let result = Xnb::load_bytes::<Blend>(&catalog, &bytes);
    assert!(matches!(result, Err(ContentError::Framing(msg)) if msg.contains("Blend")));
}

// --- Generics and naming ---

#[derive(Debug, Default, PartialEq, Content)]
struct Pair<A, B> {
    first: A,
    second: B,
}

#[test]
fn generic_records_name_their_arguments() {
    let catalog = TypeCatalog::new();
    let pair = Pair {
        first: 4i32,
        second: vec![String::from("a")],
    };
    let bytes = plain().serialize(&catalog, &pair).expect("compile");
    let report = Xnb::inspect_bytes(&bytes).expect("inspect");
    assert_eq!(report.types[0].name, "Pair<Int32,List<String>>");

    let back: Pair<i32, Vec<String>> = Xnb::load_bytes(&catalog, &bytes).expect("load");
    assert_eq!(back, pair);
}

#[derive(Debug, Default, PartialEq, Content)]
#[content(name = "TextureContent", runtime_type = "Texture2D")]
struct TextureContent {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

#[derive(Debug, Default, PartialEq, Content)]
struct Texture2D {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

#[test]
fn runtime_type_binds_to_a_different_reader_type() {
    let source = TextureContent {
        width: 2,
        height: 1,
        pixels: vec![0xFF, 0x00],
    };
    let bytes = plain().serialize(&TypeCatalog::new(), &source).expect("compile");
    let report = Xnb::inspect_bytes(&bytes).expect("inspect");
    assert_eq!(report.types[0].name, "Texture2D");

    let runtime: Texture2D = Xnb::load_bytes(&TypeCatalog::new(), &bytes).expect("load");
    assert_eq!(runtime.pixels, source.pixels);
    assert_eq!((runtime.width, runtime.height), (2, 1));

    // The build-time type still binds through its alias.
    let same: TextureContent = Xnb::load_bytes(&TypeCatalog::new(), &bytes).expect("load");
    assert_eq!(same, source);
}

#[derive(Debug, Default, PartialEq, Content)]
#[content(no_compress)]
struct EncodedAudio {
    samples: Vec<u8>,
}

#[cfg(feature = "lz4_flex")]
#[test]
fn no_compress_disables_body_compression() {
    let catalog = TypeCatalog::new();
    let audio = EncodedAudio {
        samples: vec![0u8; 4096],
    };
    let options = XnbOptions::default().compress(true);
    let bytes = options.serialize(&catalog, &audio).expect("compile");
    assert!(!Xnb::inspect_bytes(&bytes).expect("inspect").compressed);

    let wrapped = options.serialize(&catalog, &vec![audio]).expect("compile");
    assert!(!Xnb::inspect_bytes(&wrapped).expect("inspect").compressed);

    let compressible = options.serialize(&catalog, &vec![0u8; 4096]).expect("compile");
    assert!(Xnb::inspect_bytes(&compressible).expect("inspect").compressed);
}

// --- Polymorphic fields ---

#[derive(Debug, Content)]
struct Trigger {
    name: String,
    payload: ContentObject,
    fallback: Option<ContentObject>,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            name: String::new(),
            payload: ContentObject::new(0i32),
            fallback: None,
        }
    }
}

#[test]
fn object_fields_round_trip_any_registered_type() {
    let catalog = TypeCatalog::new();
    let trigger = Trigger {
        name: "door".into(),
        payload: ContentObject::new(Color::new(1, 2, 3, 4)),
        fallback: Some(ContentObject::new(String::from("locked"))),
    };
    let bytes = plain().serialize(&catalog, &trigger).expect("compile");
    let back: Trigger = Xnb::load_bytes(&catalog, &bytes).expect("load");

    assert_eq!(back.name, "door");
    assert_eq!(back.payload.downcast_ref::<Color>(), Some(&Color::new(1, 2, 3, 4)));
    let fallback = back.fallback.as_ref().and_then(|f| f.downcast_ref::<String>());
    assert_eq!(fallback.map(String::as_str), Some("locked"));

    let empty = Trigger::default();
    let bytes = plain().serialize(&catalog, &empty).expect("compile");
    let back: Trigger = Xnb::load_bytes(&catalog, &bytes).expect("load");
    assert_eq!(back.payload.downcast_ref::<i32>(), Some(&0));
    assert!(back.fallback.is_none());
}

#[derive(Debug, Default, PartialEq, Content)]
struct Point(i32, i32);

#[test]
fn tuple_structs_write_fields_in_order() {
    let catalog = TypeCatalog::new();
    let bytes = plain().serialize(&catalog, &Point(-1, 2)).expect("compile");
    assert_eq!(&bytes[bytes.len() - 8..bytes.len() - 4], &(-1i32).to_le_bytes());
    assert_eq!(Xnb::load_bytes::<Point>(&catalog, &bytes).expect("load"), Point(-1, 2));
}
