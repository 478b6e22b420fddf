use idx_builder::IdxBuilder;
use idx_builder::errors::{BuildError, ErrorKind};
use idx_config::{BuildConfig, MAX_DECIMALS};
use idx_core::document::{
    GeometryKind, GeometryType, IdxDocument, IdxId, Item, ItemKind, KeepPurpose, PropertyValue,
    ThirdItemKind, Transformation,
};
use idx_core::curve::GeometryError;
use idx_core::ecad::EcadDesign;

const DESIGN: &str = r#"{
    "name": "demo",
    "board": {
        "name": "PCB",
        "outline": {"kind": "polygon", "points": [[0,0],[80,0],[80,50],[0,50]]},
        "stackup_id": "STK",
        "cutouts": [{"kind": "circle", "center": [70, 40], "radius": 3}]
    },
    "layers": [
        {"id": "L1", "name": "TOP", "layer_type": "signal", "thickness": 0.035, "material": "copper"},
        {"id": "D1", "name": "CORE", "layer_type": "dielectric", "thickness": 1.5, "material": "FR4"},
        {"id": "L2", "name": "BOTTOM", "layer_type": "signal", "thickness": 0.035},
        {"id": "P1", "name": "PASTE", "layer_type": "solder_paste", "thickness": 0.1}
    ],
    "stackups": [
        {"id": "STK", "name": "MAIN", "layer_ids": ["L1", "D1", "L2"]}
    ],
    "models": [
        {"id": "M1", "identifier": "R0603.step", "format": "STEP"},
        {"id": "M2", "identifier": "R0603_tall.step", "format": "STEP", "version": "2"}
    ],
    "footprints": [
        {
            "name": "R0603",
            "outline": {"kind": "rect", "origin": [-0.8, -0.4], "width": 1.6, "height": 0.8},
            "height": 0.5,
            "model3d_id": "M1",
            "pins": [
                {"number": "1", "position": [-0.5, 0], "primary": true,
                 "shape": {"kind": "circle", "center": [-0.5, 0], "radius": 0.2}},
                {"number": "2", "position": [0.5, 0],
                 "shape": {"kind": "circle", "center": [0.5, 0], "radius": 0.2}}
            ]
        }
    ],
    "components": [
        {"name": "R1", "package_name": "R0603", "layer_id": "L1",
         "placement": {"kind": "planar", "x": 10, "y": 20, "rotation": 90},
         "user_properties": [{"name": "Value", "value": "10k"}]},
        {"name": "R2", "package_name": "R0603", "layer_id": "L2", "model3d_id": "M2",
         "placement": {"kind": "planar", "x": 30, "y": 20, "mirror": true},
         "z_offset": -0.1}
    ],
    "holes": [
        {"name": "V1", "hole_type": "via",
         "geometry": {"kind": "circle", "center": [40, 25], "radius": 0.15},
         "layer_span": {"from": "L1", "to": "L2"}},
        {"name": "H1", "hole_type": "non_plated",
         "geometry": {"kind": "circle", "center": [5, 5], "radius": 1.6},
         "z_range": {"lower": 0, "upper": 1.57}}
    ],
    "constraints": [
        {"name": "K1", "constraint_type": "keepout", "purpose": "route",
         "geometry": {"kind": "rect", "origin": [50, 10], "width": 10, "height": 5},
         "layer_id": "L1"},
        {"name": "K2", "constraint_type": "keepin", "purpose": "component",
         "geometry": {"kind": "polygon", "points": [[1,1],[79,1],[79,49],[1,49]]}}
    ]
}"#;

fn design() -> EcadDesign {
    serde_json::from_str(DESIGN).expect("fixture parses")
}

fn build(config: BuildConfig, design: &EcadDesign) -> Result<IdxDocument, BuildError> {
    IdxBuilder::new(config).build(design)
}

fn simplified() -> BuildConfig {
    BuildConfig::default()
}

fn traditional() -> BuildConfig {
    BuildConfig {
        use_simplified: false,
        ..BuildConfig::default()
    }
}

fn assembly<'d>(doc: &'d IdxDocument, name: &str) -> &'d Item {
    doc.assembly_by_name(name).expect("assembly exists")
}

/// Assembly 自带的形状，或其唯一实例所摆放的 Single 的形状。
fn placed_shape(doc: &IdxDocument, name: &str) -> IdxId {
    match &assembly(doc, name).kind {
        ItemKind::Assembly {
            shape: Some(shape), ..
        } => *shape,
        ItemKind::Assembly { instances, .. } => {
            assert_eq!(instances.len(), 1, "{name} should place exactly one item");
            let single = doc.item(instances[0].item).expect("placed item");
            let ItemKind::Single { shape, .. } = &single.kind else {
                panic!("{name} should place a single item");
            };
            *shape
        }
        ItemKind::Single { .. } => panic!("{name} should be an assembly"),
    }
}

fn shape_inverted(doc: &IdxDocument, name: &str) -> bool {
    let shape = placed_shape(doc, name);
    doc.shape_element(shape).expect("shape element").inverted
}

#[test]
fn full_design_is_reference_closed_in_both_modes() {
    for config in [simplified(), traditional()] {
        let doc = build(config, &design()).expect("build succeeds");
        assert!(doc.check_references().is_ok());
    }
}

#[test]
fn via_is_inverted_and_board_is_not() {
    let doc = build(simplified(), &design()).unwrap();
    assert!(shape_inverted(&doc, "V1"));
    assert!(!shape_inverted(&doc, "PCB"));
    let via = assembly(&doc, "V1");
    assert_eq!(via.geometry_type(), Some(GeometryType::HoleVia));
    assert_eq!(via.instances().len(), 1);
    assert!(assembly(&doc, "PCB").instances().is_empty());
}

#[test]
fn simplified_holes_and_keep_areas_are_placed_by_instances() {
    let doc = build(simplified(), &design()).unwrap();
    for name in ["V1", "H1", "K1", "K2"] {
        let item = assembly(&doc, name);
        assert!(item.geometry_type().is_some(), "{name}");
        let instances = item.instances();
        assert_eq!(instances.len(), 1, "{name}");
        let placed = doc.item(instances[0].item).expect("placed item");
        assert!(!placed.is_assembly(), "{name}");
        assert!(doc.singles().iter().any(|single| single.id == placed.id));
    }
    assert!(doc.check_references().is_ok());
}

#[test]
fn cutouts_become_inverted_items() {
    let doc = build(simplified(), &design()).unwrap();
    let cutout = assembly(&doc, "PCB_CUTOUT_1");
    assert_eq!(cutout.geometry_type(), Some(GeometryType::Cutout));
    assert!(shape_inverted(&doc, "PCB_CUTOUT_1"));
}

#[test]
fn via_span_resolves_through_board_stackup() {
    let doc = build(simplified(), &design()).unwrap();
    let element = doc.shape_element(placed_shape(&doc, "V1")).unwrap();
    let curve_set = doc.curve_set(element.curve_set).unwrap();
    assert_eq!(curve_set.lower_bound, 0.0);
    assert_eq!(curve_set.upper_bound, 1.57);
    let geometry = doc
        .geometries()
        .iter()
        .find(|g| g.id == curve_set.geometries[0])
        .unwrap();
    assert!(matches!(geometry.kind, GeometryKind::Circle { radius, .. } if radius == 0.15));
}

#[test]
fn missing_footprint_is_a_reference_error() {
    let mut design = design();
    design.components[0].package_name = "QFN48".to_string();
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
    assert_eq!(err.offending_reference(), Some("QFN48"));
    assert_eq!(err.entity(), "R1");
    assert!(err.to_string().contains("QFN48"));
}

#[test]
fn missing_model_and_layer_are_reference_errors() {
    let mut design = design();
    design.components[1].model3d_id = Some("M9".to_string());
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.offending_reference(), Some("M9"));

    let mut design = self::design();
    design.constraints[0].layer_id = Some("L7".to_string());
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.offending_reference(), Some("L7"));
}

#[test]
fn board_needs_exactly_one_vertical_source() {
    let mut design = design();
    design.board.thickness = Some(1.6);
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    design.board.thickness = None;
    design.board.stackup_id = None;
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn hole_without_vertical_extent_is_rejected() {
    let mut design = design();
    design.holes[0].layer_span = None;
    let err = build(simplified(), &design).unwrap_err();
    assert!(matches!(
        err,
        BuildError::Configuration { ref entity, field: "z_range", .. } if entity == "V1"
    ));
}

#[test]
fn backdrill_is_unsupported() {
    let mut design = design();
    design.holes[0].hole_type = idx_core::ecad::HoleType::Backdrill;
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
}

#[test]
fn open_outline_is_a_geometry_error() {
    let mut design = design();
    design.board.outline = serde_json::from_str(
        r#"{"kind": "polygon", "points": [[0,0],[80,0],[80,50]], "closed": false}"#,
    )
    .unwrap();
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Geometry);
}

#[test]
fn inverted_z_range_is_a_geometry_error_but_equal_bounds_pass() {
    let mut design = design();
    design.holes[1].z_range = Some(idx_core::ecad::ZRange {
        lower: 0.8,
        upper: 0.8,
    });
    assert!(build(simplified(), &design).is_ok());

    design.holes[1].z_range = Some(idx_core::ecad::ZRange {
        lower: 1.0,
        upper: 0.2,
    });
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Geometry);
}

#[test]
fn duplicate_layer_ids_are_a_configuration_error() {
    let mut design = design();
    let copy = design.layers[0].clone();
    design.layers.push(copy);
    let err = build(simplified(), &design).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.entity(), "L1");
}

#[test]
fn build_is_deterministic() {
    let first = build(traditional(), &design()).unwrap();
    let second = build(traditional(), &design()).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn stackup_instances_carry_layer_ranges() {
    let doc = build(simplified(), &design()).unwrap();
    let stackup = doc.item_by_name("MAIN").expect("stackup item");
    assert_eq!(stackup.geometry_type(), Some(GeometryType::LayerStackup));
    let names: Vec<&str> = stackup
        .instances()
        .iter()
        .map(|instance| instance.name.as_str())
        .collect();
    assert_eq!(names, vec!["TOP", "CORE", "BOTTOM"]);

    let bottom = &stackup.instances()[2];
    let lower = bottom
        .user_properties
        .iter()
        .find(|p| p.key.object_name == "LowerBound")
        .unwrap();
    let upper = bottom
        .user_properties
        .iter()
        .find(|p| p.key.object_name == "UpperBound")
        .unwrap();
    assert_eq!(lower.value, PropertyValue::Length(0.0));
    assert_eq!(upper.value, PropertyValue::Length(0.035));
    assert_eq!(lower.key.system_scope, "ECAD");
}

#[test]
fn non_collaborative_layers_are_opt_in() {
    let doc = build(simplified(), &design()).unwrap();
    assert!(doc.item_by_name("PASTE").is_none());

    let config = BuildConfig {
        include_non_collaborative: true,
        ..BuildConfig::default()
    };
    let doc = build(config, &design()).unwrap();
    assert!(doc.item_by_name("PASTE").is_some());
}

#[test]
fn stackup_skips_members_whose_layer_is_not_emitted() {
    let mut design = design();
    design.stackups[0].layer_ids.insert(0, "P1".to_string());
    let names = |doc: &IdxDocument| -> Vec<String> {
        doc.item_by_name("MAIN")
            .unwrap()
            .instances()
            .iter()
            .map(|instance| instance.name.clone())
            .collect()
    };

    let doc = build(simplified(), &design).unwrap();
    assert_eq!(names(&doc), ["TOP", "CORE", "BOTTOM"]);
    assert!(doc.check_references().is_ok());

    let config = BuildConfig {
        include_non_collaborative: true,
        ..BuildConfig::default()
    };
    let doc = build(config, &design).unwrap();
    assert_eq!(names(&doc), ["PASTE", "TOP", "CORE", "BOTTOM"]);
}

#[test]
fn component_transform_applies_rotation_then_translation() {
    let doc = build(simplified(), &design()).unwrap();
    let r1 = doc.item_by_name("R1").unwrap();
    assert_eq!(r1.geometry_type(), Some(GeometryType::Component));
    let instance = &r1.instances()[0];
    assert_eq!(
        instance.transformation,
        Some(Transformation::D2 {
            xx: 0.0,
            xy: -1.0,
            yx: 1.0,
            yy: 0.0,
            tx: 10.0,
            ty: 20.0
        })
    );
    assert!(instance
        .user_properties
        .iter()
        .any(|p| p.value == PropertyValue::Text("10k".into())));

    let r2 = &doc.item_by_name("R2").unwrap().instances()[0];
    assert_eq!(r2.z_offset, Some(-0.1));
    let Some(Transformation::D2 { xx, yy, .. }) = r2.transformation else {
        panic!("planar transform");
    };
    assert_eq!((xx, yy), (-1.0, 1.0));
}

#[test]
fn instance_model_override_creates_package_variant() {
    let doc = build(simplified(), &design()).unwrap();
    assert_eq!(doc.models().len(), 2);
    assert_eq!(doc.packages().len(), 2);

    let base = doc.item_by_name("R0603").unwrap();
    let variant = doc.item_by_name("R0603__M2").unwrap();
    let model_of = |kind: &ItemKind| match kind {
        ItemKind::Single { model3d, .. } => *model3d,
        ItemKind::Assembly { .. } => None,
    };
    assert_eq!(model_of(&base.kind), Some(doc.models()[0].id));
    assert_eq!(model_of(&variant.kind), Some(doc.models()[1].id));

    let r2 = &doc.item_by_name("R2").unwrap().instances()[0];
    assert_eq!(r2.item, variant.id);
    let r1 = &doc.item_by_name("R1").unwrap().instances()[0];
    assert_eq!(r1.item, base.id);
}

#[test]
fn explicit_default_model_reuses_base_package() {
    let mut design = design();
    design.components[0].model3d_id = Some("M1".to_string());
    let doc = build(simplified(), &design).unwrap();
    assert_eq!(doc.packages().len(), 2);
    let base = doc.item_by_name("R0603").unwrap();
    let r1 = &doc.item_by_name("R1").unwrap().instances()[0];
    assert_eq!(r1.item, base.id);
}

#[test]
fn package_pins_reference_points_and_shapes() {
    let doc = build(simplified(), &design()).unwrap();
    let ItemKind::Single { package_pins, .. } = &doc.item_by_name("R0603").unwrap().kind else {
        panic!("package should be single");
    };
    assert_eq!(package_pins.len(), 2);
    assert!(package_pins[0].primary);
    let point = doc.point(package_pins[0].point).unwrap();
    assert_eq!((point.x, point.y), (-0.5, 0.0));
    assert!(package_pins.iter().all(|pin| pin.shape.is_some()));
}

#[test]
fn constraints_map_to_keep_areas() {
    let doc = build(simplified(), &design()).unwrap();
    assert_eq!(
        assembly(&doc, "K1").geometry_type(),
        Some(GeometryType::Keepout(KeepPurpose::Route))
    );
    assert!(shape_inverted(&doc, "K1"));
    assert_eq!(
        assembly(&doc, "K2").geometry_type(),
        Some(GeometryType::Keepin(KeepPurpose::ComponentPlacement))
    );
    assert!(!shape_inverted(&doc, "K2"));
}

#[test]
fn traditional_mode_uses_third_items() {
    let doc = build(traditional(), &design()).unwrap();
    let kinds: Vec<&ThirdItemKind> = doc.third_items().iter().map(|t| &t.kind).collect();
    assert!(kinds
        .iter()
        .any(|k| matches!(k, ThirdItemKind::InterStratumFeature { .. })));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, ThirdItemKind::AssemblyComponent { .. })));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, ThirdItemKind::FunctionalItemShape { .. })));
    assert!(kinds.iter().any(|k| matches!(k, ThirdItemKind::KeepOut { .. })));
    assert!(kinds.iter().any(|k| matches!(k, ThirdItemKind::KeepIn { .. })));

    let stratum = doc
        .third_items()
        .iter()
        .find(|t| matches!(t.kind, ThirdItemKind::Stratum { .. }))
        .unwrap();
    let ThirdItemKind::Stratum { shape_elements, .. } = &stratum.kind else {
        unreachable!();
    };
    assert_eq!(shape_elements.len(), 2);
    assert!(doc.shape_element(shape_elements[1]).unwrap().inverted);
    assert!(doc.assemblies().iter().all(|item| item.geometry_type().is_none()));
}

#[test]
fn history_attaches_identifiers() {
    let config = BuildConfig {
        include_history: true,
        ..BuildConfig::default()
    };
    let doc = build(config, &design()).unwrap();
    assert!(doc.items().all(|item| item.identifier.is_some()));
    let board = doc.item_by_name("PCB").unwrap();
    assert_eq!(board.identifier.as_ref().unwrap().number, "PCB");
}

#[test]
fn precision_above_limit_is_a_configuration_error() {
    let config = BuildConfig {
        precision: 20,
        ..BuildConfig::default()
    };
    let err = build(config, &design()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(
        err,
        BuildError::Configuration {
            field: "precision",
            ..
        }
    ));
}

#[test]
fn points_stay_distinct_at_maximum_precision() {
    let coarse = build(simplified(), &design()).unwrap();
    let config = BuildConfig {
        precision: MAX_DECIMALS,
        ..BuildConfig::default()
    };
    let fine = build(config, &design()).unwrap();
    assert_eq!(fine.points().len(), coarse.points().len());
    assert!(fine.points().iter().any(|p| (p.x, p.y) == (40.0, 25.0)));
}

#[test]
fn coordinates_beyond_the_precision_range_are_rejected() {
    let far: EcadDesign = serde_json::from_str(
        &DESIGN.replace(r#""center": [40, 25]"#, r#""center": [40000, 25]"#),
    )
    .unwrap();
    assert!(build(simplified(), &far).is_ok());

    let config = BuildConfig {
        precision: MAX_DECIMALS,
        ..BuildConfig::default()
    };
    let err = build(config, &far).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Geometry);
    assert_eq!(err.entity(), "V1");
    assert!(matches!(
        err,
        BuildError::Geometry {
            field: "geometry",
            source: GeometryError::OutOfRange { precision: 12, .. },
            ..
        }
    ));
}
