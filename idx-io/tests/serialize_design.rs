use std::collections::HashSet;
use std::fs;
use std::path::Path;

use idx_builder::IdxBuilder;
use idx_config::{BuildConfig, WriteConfig};
use idx_core::document::IdxDocument;
use idx_io::{DesignLoader, DocumentSaver, IdxFacade, IdxWriter, IoError};
use quick_xml::Reader;
use quick_xml::events::Event;
use tempfile::tempdir;

const DESIGN: &str = r#"{
    "name": "io",
    "board": {
        "name": "PCB",
        "outline": {"kind": "rect", "origin": [0, 0], "width": 40, "height": 30},
        "thickness": 1.6,
        "user_properties": [{"name": "Finish", "value": "ENIG"}]
    },
    "layers": [
        {"id": "L1", "name": "TOP", "layer_type": "signal", "thickness": 0.035}
    ],
    "footprints": [
        {"name": "SOT23",
         "outline": {"kind": "rect", "origin": [-1.5, -0.7], "width": 3, "height": 1.4},
         "pins": [{"number": "1", "position": [-0.95, -1], "primary": true}]}
    ],
    "components": [
        {"name": "Q1", "package_name": "SOT23", "layer_id": "L1",
         "placement": {"kind": "planar", "x": 12.5, "y": 7, "rotation": 180}}
    ],
    "holes": [
        {"name": "V1", "hole_type": "via",
         "geometry": {"kind": "circle", "center": [20, 15], "radius": 0.2},
         "z_range": {"lower": 0, "upper": 1.6}}
    ],
    "constraints": [
        {"name": "K1", "constraint_type": "keepout", "purpose": "via",
         "geometry": {"kind": "polygon", "points": [[30, 20], [35, 20], [35, 25], [30, 25]]}}
    ]
}"#;

fn document(config: BuildConfig) -> IdxDocument {
    let design = IdxFacade::parse_design(DESIGN, Path::new("design.json")).unwrap();
    IdxBuilder::new(config).build(&design).unwrap()
}

fn traditional() -> BuildConfig {
    BuildConfig {
        use_simplified: false,
        ..BuildConfig::default()
    }
}

/// 解析输出，返回 Body 直接子元素的名称，并确认所有 `ID_n` 文本都指向更早声明的 id。
fn body_children(text: &str) -> Vec<String> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    let mut depth = 0usize;
    let mut declared = HashSet::new();
    let mut children = Vec::new();
    loop {
        let event = reader.read_event().expect("well-formed xml");
        match event {
            Event::Start(ref start) | Event::Empty(ref start) => {
                let name = String::from_utf8(start.name().as_ref().to_vec()).unwrap();
                if depth == 2 {
                    children.push(name);
                }
                if let Some(id) = start.try_get_attribute("id").unwrap() {
                    let id = id.unescape_value().unwrap().into_owned();
                    assert!(declared.insert(id.clone()), "duplicate id {id}");
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth -= 1,
            Event::Text(text) => {
                let text = text.unescape().unwrap();
                if let Some(number) = text.strip_prefix("ID_") {
                    if number.chars().all(|c| c.is_ascii_digit()) {
                        assert!(declared.contains(&*text), "dangling {text}");
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    assert_eq!(depth, 0);
    children
}

fn section_rank(name: &str) -> usize {
    match name {
        "foundation:CartesianPoint" => 0,
        "foundation:Line" | "foundation:Arc" | "foundation:CircleCenter" | "foundation:PolyLine" => 1,
        "foundation:CurveSet2d" => 2,
        "foundation:ShapeElement" => 3,
        "foundation:Stratum"
        | "foundation:AssemblyComponent"
        | "foundation:InterStratumFeature"
        | "foundation:KeepOut"
        | "foundation:KeepIn"
        | "foundation:FunctionalItemShape"
        | "foundation:StratumTechnology" => 4,
        "foundation:Item" | "foundation:Model3D" => 5,
        other => panic!("unexpected body child {other}"),
    }
}

#[test]
fn output_is_well_formed_and_ordered_in_both_modes() {
    for config in [BuildConfig::default(), traditional()] {
        let text = IdxWriter::default().serialize(&document(config)).unwrap();
        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        let children = body_children(&text);
        assert!(!children.is_empty());
        let ranks: Vec<_> = children.iter().map(|name| section_rank(name)).collect();
        assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]), "{children:?}");
    }
}

#[test]
fn traditional_output_contains_third_items() {
    let text = IdxWriter::default()
        .serialize(&document(traditional()))
        .unwrap();
    assert!(text.contains(r#"xsi:type="pdm:EDMDStratum""#));
    assert!(text.contains(r#"xsi:type="pdm:EDMDKeepOut""#));
    assert!(text.contains("<pdm:Purpose>Via</pdm:Purpose>"));
}

#[test]
fn simplified_output_uses_geometry_types() {
    let text = IdxWriter::default()
        .serialize(&document(BuildConfig::default()))
        .unwrap();
    assert!(text.contains(r#"geometryType="BOARD_OUTLINE""#));
    assert!(text.contains(r#"geometryType="HOLE_VIA""#));
    assert!(text.contains(r#"geometryType="KEEPOUT_AREA_VIA""#));
    assert!(text.contains("<pdm:Inverted>true</pdm:Inverted>"));
    assert!(text.contains("<pdm:Inverted>false</pdm:Inverted>"));
    assert!(!text.contains(r#"xsi:type="pdm:EDMDStratum""#));
}

#[test]
fn serialization_is_byte_identical_across_runs() {
    let writer = IdxWriter::default();
    let first = writer.serialize(&document(BuildConfig::default())).unwrap();
    let second = writer.serialize(&document(BuildConfig::default())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn compact_output_has_single_line() {
    let config = WriteConfig {
        pretty_print: false,
        ..WriteConfig::default()
    };
    let text = IdxWriter::new(config)
        .serialize(&document(BuildConfig::default()))
        .unwrap();
    assert!(!text.contains('\n'));
    body_children(&text);
}

#[test]
fn facade_round_trips_through_files() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("design.json");
    fs::write(&input, DESIGN).unwrap();

    let facade = IdxFacade::default();
    let design = facade.load(&input).unwrap();
    assert_eq!(design.components.len(), 1);

    let doc = IdxBuilder::new(BuildConfig::default())
        .build(&design)
        .unwrap();
    let output = dir.path().join("design.idx");
    facade.save(&doc, &output).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, facade.writer().serialize(&doc).unwrap());
}

#[test]
fn compressed_packaging_is_unsupported() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("design.idz");
    let err = IdxFacade::default()
        .save(&document(BuildConfig::default()), &output)
        .unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFeature(_)));
    assert!(!output.exists());
}

#[test]
fn loader_reports_missing_and_malformed_files() {
    let dir = tempdir().unwrap();
    let facade = IdxFacade::default();

    let missing = facade.load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(missing, IoError::ReadError { .. }));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    let err = facade.load(&broken).unwrap_err();
    assert!(matches!(err, IoError::InvalidDesign { .. }));
}
