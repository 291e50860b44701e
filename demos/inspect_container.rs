#![allow(missing_docs)]

use std::collections::HashMap;
use xnbcode::math::{Color, Matrix, Vector2};
use xnbcode::model::{Bone, BoneGraph};
use xnbcode::{Content, ContentObject, SharedRef, TargetPlatform, TypeCatalog, Xnb};

#[derive(Debug, Default, Clone, Copy, PartialEq, Content)]
#[repr(u8)]
enum Layer {
    #[default]
    Background,
    Actors,
    Overlay,
}

#[derive(Debug, Default, PartialEq, Content)]
struct Palette {
    name: String,
    colors: Vec<Color>,
}

#[derive(Debug, Default, Content)]
struct Actor {
    name: String,
    layer: Layer,
    position: Vector2,
    #[content(shared)]
    palette: SharedRef<Palette>,
}

#[derive(Debug, Default, Content)]
struct Stage {
    title: String,
    actors: Vec<Actor>,
    skeleton: BoneGraph,
    properties: HashMap<String, Option<ContentObject>>,
}

fn build_stage() -> Stage {
    let palette = SharedRef::from_value(Palette {
        name: "dusk".into(),
        colors: vec![Color::new(40, 20, 60, 255), Color::new(250, 120, 40, 255)],
    });
    let actors = (0..4)
        .map(|i| Actor {
            name: format!("actor_{i}"),
            layer: if i == 0 { Layer::Background } else { Layer::Actors },
            position: Vector2::new(i as f32 * 16.0, 0.0),
            palette: palette.clone(),
        })
        .collect();

    let skeleton = BoneGraph {
        bones: vec![
            Bone {
                name: Some("root".into()),
                transform: Matrix::IDENTITY,
                parent: None,
                children: vec![1],
            },
            Bone {
                name: Some("arm".into()),
                transform: Matrix::IDENTITY,
                parent: Some(0),
                children: Vec::new(),
            },
        ],
        root: Some(0),
    };

    let properties = HashMap::from([
        ("gravity".to_string(), Some(ContentObject::new(9.81f32))),
        ("overlay".to_string(), Some(ContentObject::new(Layer::Overlay))),
        ("script".to_string(), None),
    ]);

    Stage {
        title: "Harbor at dusk".into(),
        actors,
        skeleton,
        properties,
    }
}

fn main() -> xnbcode::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let dir = std::env::temp_dir().join("xnbcode_demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("stage.xnb");

    let catalog = TypeCatalog::new();
    let stage = build_stage();

    println!("=== XNBCODE CONTAINER DEMO ===");
    Xnb::builder()
        .platform(TargetPlatform::DesktopGL)
        .save(&catalog, &path, &stage)?;

    let report = Xnb::inspect(&path)?;
    println!("{report}");

    let loaded: Stage = Xnb::load(&catalog, &path)?;
    let first = &loaded.actors[0].palette;
    let shared = loaded.actors.iter().all(|a| a.palette.ptr_eq(first));
    println!("Loaded '{}' with {} actors", loaded.title, loaded.actors.len());
    println!("All actors share one palette: {shared}");
    if let Some(Some(gravity)) = loaded.properties.get("gravity") {
        println!("gravity = {:?}", gravity.downcast_ref::<f32>());
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
