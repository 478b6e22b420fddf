use std::collections::HashMap;

use chrono::{DateTime, Utc};
use idx_config::BuildConfig;
use idx_core::curve::{Curve, DEFAULT_ANGLE_STEP, Polyline, Segment};
use idx_core::document::{
    GeometryKind, GeometryType, Header, IdxDocument, IdxId, Identifier, InterStratumFeatureType,
    ItemInstance, ItemKind, ItemSection, KeepPurpose, LayerPurpose, PackagePin, PropertyValue,
    ShapeDescriptionType, ShapeElementType, ThirdItemKind, Transformation, UserProperty,
};
use idx_core::ecad::{
    ConstraintPurpose, ConstraintType, EcadDesign, Footprint, HoleType, LayerType, Model3dDef,
    Placement, Placement3D, PropertyInput, PropertySpec, ZRange,
};
use idx_core::geometry::Point2;
use tracing::{debug, info};

use crate::errors::BuildError;
use crate::plan::{self, Plan};

/// 把 ECAD 设计转换为引用闭合的 IDX 文档图。
///
/// 每次 `build` 都使用独立的上下文与 id 计数器，同一实例可反复调用，
/// 不同实例可在不同线程上并行运行。
#[derive(Debug, Clone)]
pub struct IdxBuilder {
    config: BuildConfig,
}

impl IdxBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// 先完整校验再构建；校验失败时不会产生任何文档。
    pub fn build(&self, design: &EcadDesign) -> Result<IdxDocument, BuildError> {
        let plan = plan::prepare(design, &self.config)?;
        let mut context = BuildContext::new(&self.config, self.header());

        context.emit_layers(&plan);
        context.emit_stackups(&plan);
        context.emit_board(&plan);
        let footprints = context.emit_footprints(&plan);
        context.emit_components(&plan, &footprints);
        context.emit_holes(&plan);
        context.emit_constraints(&plan);

        let document = context.finish();
        debug_assert!(document.check_references().is_ok());
        info!(
            design = %design.name,
            simplified = self.config.use_simplified,
            entities = document.entity_count(),
            "文档构建完成"
        );
        Ok(document)
    }

    fn header(&self) -> Header {
        let timestamp = self.config.timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let info = &self.config.header;
        Header {
            description: info.description.clone(),
            creator_name: info.creator_name.clone(),
            creator_company: info.creator_company.clone(),
            creator_system: info.creator_system.clone(),
            global_unit_length: self.config.unit,
            creation_date_time: timestamp,
            modified_date_time: timestamp,
        }
    }
}

struct BuildContext<'c> {
    config: &'c BuildConfig,
    document: IdxDocument,
    scale: f64,
    points: HashMap<(u64, u64), IdxId>,
    layer_items: HashMap<String, IdxId>,
    models: HashMap<String, IdxId>,
    packages: HashMap<(String, Option<String>), IdxId>,
    board_stratum: Option<IdxId>,
}

#[derive(Debug, Clone)]
struct FootprintShapes {
    shape: IdxId,
    pins: Vec<PackagePin>,
}

impl<'c> BuildContext<'c> {
    fn new(config: &'c BuildConfig, header: Header) -> Self {
        Self {
            config,
            document: IdxDocument::new(header),
            scale: 10f64.powi(config.precision as i32),
            points: HashMap::new(),
            layer_items: HashMap::new(),
            models: HashMap::new(),
            packages: HashMap::new(),
            board_stratum: None,
        }
    }

    fn finish(self) -> IdxDocument {
        self.document
    }

    fn round(&self, value: f64) -> f64 {
        // 加 0.0 把 -0.0 归一为 0.0
        (value * self.scale).round() / self.scale + 0.0
    }

    /// 按取整后的坐标去重。坐标范围已在校验阶段按精度限定。
    fn point(&mut self, point: Point2) -> IdxId {
        let (x, y) = (self.round(point.x()), self.round(point.y()));
        let key = (x.to_bits(), y.to_bits());
        if let Some(id) = self.points.get(&key) {
            return *id;
        }
        let id = self.document.add_point(x, y);
        self.points.insert(key, id);
        id
    }

    fn polyline_record(&mut self, vertices: &[Point2]) -> IdxId {
        let points = vertices.iter().map(|vertex| self.point(*vertex)).collect();
        self.document.add_geometry(GeometryKind::PolyLine { points })
    }

    /// 把曲线拆成点与几何记录。连续的直线段合并为一条 PolyLine。
    fn decompose(&mut self, curve: &Curve) -> Vec<IdxId> {
        match curve {
            Curve::Line(line) => {
                let start = self.point(line.start);
                let end = self.point(line.end);
                vec![self.document.add_geometry(GeometryKind::Line { start, end })]
            }
            Curve::Arc(arc) => {
                let center = self.point(arc.center);
                let kind = if arc.is_full_circle() {
                    GeometryKind::Circle {
                        center,
                        radius: self.round(arc.radius_x),
                    }
                } else {
                    GeometryKind::Arc {
                        center,
                        radius_x: self.round(arc.radius_x),
                        radius_y: self.round(arc.radius_y),
                        start_angle: arc.start_angle,
                        sweep_angle: arc.sweep_angle,
                    }
                };
                vec![self.document.add_geometry(kind)]
            }
            Curve::Circle(circle) => {
                let center = self.point(circle.center);
                let radius = self.round(circle.radius);
                vec![self.document.add_geometry(GeometryKind::Circle { center, radius })]
            }
            Curve::Rect(rect) => self.decompose_polyline(&rect.to_polyline()),
            Curve::Polyline(polyline) => self.decompose_polyline(polyline),
        }
    }

    fn decompose_polyline(&mut self, polyline: &Polyline) -> Vec<IdxId> {
        if polyline.is_straight() {
            return vec![self.polyline_record(&polyline.vertices(DEFAULT_ANGLE_STEP))];
        }
        let mut geometries = Vec::new();
        let mut run: Vec<Point2> = Vec::new();
        for segment in polyline.segments() {
            match segment {
                Segment::Line(line) => {
                    if run.is_empty() {
                        run.push(line.start);
                    }
                    run.push(line.end);
                }
                Segment::Arc(arc) => {
                    if !run.is_empty() {
                        geometries.push(self.polyline_record(&run));
                        run.clear();
                    }
                    geometries.extend(self.decompose(&Curve::Arc(*arc)));
                }
            }
        }
        if !run.is_empty() {
            geometries.push(self.polyline_record(&run));
        }
        geometries
    }

    /// 曲线 → 点/几何 → 一个 CurveSet → 一个 ShapeElement。
    fn shape(
        &mut self,
        curve: &Curve,
        range: ZRange,
        element_type: ShapeElementType,
        inverted: bool,
    ) -> IdxId {
        let geometries = self.decompose(curve);
        let curve_set = self.document.add_curve_set(
            self.round(range.lower),
            self.round(range.upper),
            ShapeDescriptionType::GeometricModel,
            geometries,
        );
        self.document
            .add_shape_element(element_type, inverted, curve_set)
    }

    fn property(&self, name: &str, value: PropertyValue) -> UserProperty {
        let mut property = UserProperty::new(&self.config.system_scope, name, value);
        if self.config.include_history {
            property.is_new = Some(true);
            property.is_changed = Some(false);
        }
        property
    }

    fn user_properties(&self, specs: &[PropertySpec]) -> Vec<UserProperty> {
        specs
            .iter()
            .map(|spec| {
                let value = match (&spec.value, spec.is_length) {
                    (PropertyInput::Integer(value), true) => PropertyValue::Length(*value as f64),
                    (PropertyInput::Real(value), true) => PropertyValue::Length(*value),
                    (PropertyInput::Integer(value), false) => PropertyValue::Integer(*value),
                    (PropertyInput::Real(value), false) => PropertyValue::Real(*value),
                    (PropertyInput::Boolean(value), _) => PropertyValue::Boolean(*value),
                    (PropertyInput::Text(value), _) => PropertyValue::Text(value.clone()),
                };
                self.property(&spec.name, value)
            })
            .collect()
    }

    fn range_properties(&self, range: ZRange) -> Vec<UserProperty> {
        vec![
            self.property("LowerBound", PropertyValue::Length(self.round(range.lower))),
            self.property("UpperBound", PropertyValue::Length(self.round(range.upper))),
        ]
    }

    fn identifier(&self, name: &str) -> Option<Identifier> {
        self.config.include_history.then(|| Identifier {
            system_scope: self.config.system_scope.clone(),
            number: name.to_string(),
            version: 1,
            revision: 0,
            sequence: 0,
        })
    }

    fn add_item(
        &mut self,
        section: ItemSection,
        name: &str,
        kind: ItemKind,
        user_properties: Vec<UserProperty>,
    ) -> IdxId {
        let identifier = self.identifier(name);
        self.document
            .add_item(section, name, kind, user_properties, identifier)
    }

    fn instance(
        &mut self,
        name: &str,
        item: IdxId,
        transformation: Option<Transformation>,
        z_offset: Option<f64>,
        user_properties: Vec<UserProperty>,
    ) -> ItemInstance {
        ItemInstance {
            id: self.document.allocate_id(),
            name: name.to_string(),
            item,
            transformation,
            z_offset: z_offset.map(|z| self.round(z)),
            user_properties,
        }
    }

    /// 形状 → Single，再由一个只含单个实例的 Assembly 摆放。
    fn place_single(
        &mut self,
        name: &str,
        shape: IdxId,
        geometry_type: Option<GeometryType>,
        instance_properties: Vec<UserProperty>,
        item_properties: Vec<UserProperty>,
    ) -> IdxId {
        let single = self.add_item(
            ItemSection::Singles,
            name,
            ItemKind::Single {
                shape,
                package_name: None,
                model3d: None,
                package_pins: Vec::new(),
            },
            Vec::new(),
        );
        let instance = self.instance(name, single, None, None, instance_properties);
        self.add_item(
            ItemSection::Assemblies,
            name,
            ItemKind::Assembly {
                instances: vec![instance],
                geometry_type,
                shape: None,
            },
            item_properties,
        )
    }

    /// 传统表示：ThirdItem 经 Single 与实例摆放，属性挂在实例上。
    fn wrap_traditional(
        &mut self,
        name: &str,
        third_item: IdxId,
        user_properties: Vec<UserProperty>,
    ) -> IdxId {
        self.place_single(name, third_item, None, user_properties, Vec::new())
    }

    /// 简化表示中的孔与约束区域：ShapeElement 经 Single 与实例摆放，
    /// `geometryType` 与属性挂在 Assembly 上。
    fn simplified_placement(
        &mut self,
        name: &str,
        geometry_type: GeometryType,
        shape: IdxId,
        user_properties: Vec<UserProperty>,
    ) -> IdxId {
        self.place_single(name, shape, Some(geometry_type), Vec::new(), user_properties)
    }

    /// 简化表示中板框与挖空直接携带形状，不经过实例。
    fn simplified_item(
        &mut self,
        name: &str,
        geometry_type: GeometryType,
        shape: IdxId,
        user_properties: Vec<UserProperty>,
    ) -> IdxId {
        self.add_item(
            ItemSection::Assemblies,
            name,
            ItemKind::Assembly {
                instances: Vec::new(),
                geometry_type: Some(geometry_type),
                shape: Some(shape),
            },
            user_properties,
        )
    }

    fn emit_layers(&mut self, plan: &Plan<'_>) {
        for layer in &plan.design.layers {
            if !layer.layer_type.is_collaborative() && !self.config.include_non_collaborative {
                debug!(layer = %layer.id, "跳过非协同层");
                continue;
            }
            let purpose = layer_purpose(layer.layer_type);
            let mut properties = vec![
                self.property("LayerPurpose", PropertyValue::Text(purpose.as_str().to_string())),
                self.property("Thickness", PropertyValue::Length(self.round(layer.thickness))),
            ];
            if let Some(material) = &layer.material {
                properties.push(self.property("Material", PropertyValue::Text(material.clone())));
            }
            if let Some(color) = &layer.color {
                properties.push(self.property("Color", PropertyValue::Text(color.clone())));
            }
            if let Some(range) = plan.layer_range(&layer.id) {
                properties.extend(self.range_properties(range));
            }
            let id = self.add_item(
                ItemSection::Layers,
                &layer.name,
                ItemKind::Assembly {
                    instances: Vec::new(),
                    geometry_type: Some(GeometryType::Layer(purpose)),
                    shape: None,
                },
                properties,
            );
            self.layer_items.insert(layer.id.clone(), id);
            debug!(layer = %layer.id, id = %id, "已生成层");
        }
    }

    fn emit_stackups(&mut self, plan: &Plan<'_>) {
        for (stackup, stack) in plan.design.stackups.iter().zip(&plan.stacks) {
            let mut instances = Vec::new();
            for (layer_id, range) in &stack.ranges {
                // 非协同层未生成 Item 时，层叠中也不为它生成实例
                let Some(item) = self.layer_items.get(layer_id).copied() else {
                    debug!(stackup = %stackup.id, layer = %layer_id, "层叠成员未生成，跳过实例");
                    continue;
                };
                let name = plan
                    .design
                    .layer(layer_id)
                    .map(|layer| layer.name.clone())
                    .unwrap_or_else(|| layer_id.clone());
                let properties = self.range_properties(*range);
                instances.push(self.instance(&name, item, None, None, properties));
            }
            let total = stack.total();
            let properties = vec![self.property(
                "TotalThickness",
                PropertyValue::Length(self.round(total.thickness())),
            )];
            let id = self.add_item(
                ItemSection::Layers,
                &stackup.name,
                ItemKind::Assembly {
                    instances,
                    geometry_type: Some(GeometryType::LayerStackup),
                    shape: None,
                },
                properties,
            );
            debug!(stackup = %stackup.id, id = %id, "已生成层叠");
        }
    }

    fn emit_board(&mut self, plan: &Plan<'_>) {
        let board = &plan.design.board;
        let range = plan.board_range;
        let outline = self.shape(
            &plan.board_outline,
            range,
            ShapeElementType::FeatureShapeElement,
            false,
        );
        let cutouts: Vec<IdxId> = plan
            .board_cutouts
            .iter()
            .map(|cutout| {
                self.shape(cutout, range, ShapeElementType::FeatureShapeElement, true)
            })
            .collect();
        let mut properties = self.user_properties(&board.user_properties);
        if let Some(stackup_id) = &board.stackup_id {
            properties.push(self.property("StackupId", PropertyValue::Text(stackup_id.clone())));
        }

        if self.config.use_simplified {
            let id = self.simplified_item(&board.name, GeometryType::BoardOutline, outline, properties);
            for (index, shape) in cutouts.into_iter().enumerate() {
                let name = format!("{}_CUTOUT_{}", board.name, index + 1);
                self.simplified_item(&name, GeometryType::Cutout, shape, Vec::new());
            }
            debug!(board = %board.name, id = %id, "已生成板框（简化表示）");
        } else {
            let technology = self.document.add_third_item(
                format!("{}_TECHNOLOGY", board.name),
                ThirdItemKind::StratumTechnology {
                    technology_type: "Design".to_string(),
                    layer_purpose: LayerPurpose::BoardOutline,
                },
            );
            let mut shape_elements = vec![outline];
            shape_elements.extend(cutouts);
            let stratum = self.document.add_third_item(
                &board.name,
                ThirdItemKind::Stratum {
                    shape_elements,
                    surface: None,
                    technology: Some(technology),
                },
            );
            self.board_stratum = Some(stratum);
            let id = self.wrap_traditional(&board.name, stratum, properties);
            debug!(board = %board.name, id = %id, "已生成板框（传统表示）");
        }
    }

    /// 生成封装，返回与 `plan.footprints` 一一对应的形状与引脚，供元件生成变体封装。
    fn emit_footprints(&mut self, plan: &Plan<'_>) -> Vec<FootprintShapes> {
        let mut emitted = Vec::with_capacity(plan.footprints.len());
        for footprint_plan in &plan.footprints {
            let footprint = footprint_plan.footprint;
            let outline = self.shape(
                &footprint_plan.outline,
                footprint_plan.range,
                ShapeElementType::PartShapeElement,
                false,
            );
            let shape = if self.config.use_simplified {
                outline
            } else {
                self.document.add_third_item(
                    &footprint.name,
                    ThirdItemKind::AssemblyComponent {
                        shape_element: outline,
                    },
                )
            };

            let mut pins = Vec::with_capacity(footprint.pins.len());
            for (pin, pin_curve) in footprint.pins.iter().zip(&footprint_plan.pins) {
                let point = self.point(pin.position);
                let pin_shape = pin_curve.as_ref().map(|curve| {
                    let element = self.shape(
                        curve,
                        footprint_plan.range,
                        ShapeElementType::ComponentTermination,
                        false,
                    );
                    if self.config.use_simplified {
                        element
                    } else {
                        self.document.add_third_item(
                            format!("{}.{}", footprint.name, pin.number),
                            ThirdItemKind::FunctionalItemShape {
                                shape_element: element,
                                functional_type: "PinShape".to_string(),
                            },
                        )
                    }
                });
                pins.push(PackagePin {
                    pin_number: pin.number.clone(),
                    primary: pin.primary,
                    point,
                    shape: pin_shape,
                });
            }

            emitted.push(FootprintShapes {
                shape,
                pins: pins.clone(),
            });
            let model = footprint_plan.model.map(|def| self.model(def));
            let id = self.add_item(
                ItemSection::Packages,
                &footprint.name,
                ItemKind::Single {
                    shape,
                    package_name: Some(footprint.name.clone()),
                    model3d: model,
                    package_pins: pins,
                },
                Vec::new(),
            );
            self.packages.insert(
                (footprint.name.clone(), footprint.model3d_id.clone()),
                id,
            );
            debug!(footprint = %footprint.name, id = %id, "已生成封装");
        }
        emitted
    }

    /// 3D 模型在第一次被绑定时才生成。
    fn model(&mut self, def: &Model3dDef) -> IdxId {
        if let Some(id) = self.models.get(&def.id) {
            return *id;
        }
        let transformation = def.transformation.as_ref().map(spatial_transformation);
        let id = self.document.add_model(
            &def.identifier,
            &def.format,
            def.version.clone(),
            def.location.clone(),
            transformation,
        );
        self.models.insert(def.id.clone(), id);
        id
    }

    /// 元件级模型与封装默认模型不同时，为 (封装, 模型) 生成一个变体封装。
    fn package_for(
        &mut self,
        footprint: &Footprint,
        shapes: &FootprintShapes,
        model: Option<&Model3dDef>,
    ) -> IdxId {
        let key = (footprint.name.clone(), model.map(|def| def.id.clone()));
        if let Some(id) = self.packages.get(&key) {
            return *id;
        }

        let model3d = model.map(|def| self.model(def));
        let name = match model {
            Some(def) => format!("{}__{}", footprint.name, def.id),
            None => footprint.name.clone(),
        };
        let id = self.add_item(
            ItemSection::Packages,
            &name,
            ItemKind::Single {
                shape: shapes.shape,
                package_name: Some(footprint.name.clone()),
                model3d,
                package_pins: shapes.pins.clone(),
            },
            Vec::new(),
        );
        self.packages.insert(key, id);
        debug!(package = %footprint.name, variant = %name, id = %id, "已生成封装变体");
        id
    }

    fn emit_components(&mut self, plan: &Plan<'_>, footprints: &[FootprintShapes]) {
        for component_plan in &plan.components {
            let component = component_plan.source;
            let package = self.package_for(
                plan.footprints[component_plan.footprint].footprint,
                &footprints[component_plan.footprint],
                component_plan.model,
            );
            let transformation = match &component.placement {
                placement @ Placement::Planar { .. } => placement.planar_matrix().map(|matrix| {
                    match Transformation::from_matrix(&matrix) {
                        Transformation::D2 {
                            xx,
                            xy,
                            yx,
                            yy,
                            tx,
                            ty,
                        } => Transformation::D2 {
                            xx: self.round(xx),
                            xy: self.round(xy),
                            yx: self.round(yx),
                            yy: self.round(yy),
                            tx: self.round(tx),
                            ty: self.round(ty),
                        },
                        other => other,
                    }
                }),
                Placement::Spatial(placement) => Some(spatial_transformation(placement)),
            };

            let mut properties = self.user_properties(&component.user_properties);
            properties.push(self.property(
                "Layer",
                PropertyValue::Text(component_plan.layer.name.clone()),
            ));
            let instance = self.instance(
                &component.name,
                package,
                transformation,
                component.z_offset,
                properties,
            );
            let geometry_type = self.config.use_simplified.then_some(GeometryType::Component);
            let id = self.add_item(
                ItemSection::Assemblies,
                &component.name,
                ItemKind::Assembly {
                    instances: vec![instance],
                    geometry_type,
                    shape: None,
                },
                Vec::new(),
            );
            debug!(component = %component.name, id = %id, "已生成元件");
        }
    }

    fn emit_holes(&mut self, plan: &Plan<'_>) {
        for hole_plan in &plan.holes {
            let hole = hole_plan.source;
            let shape = self.shape(
                &hole_plan.curve,
                hole_plan.range,
                ShapeElementType::FeatureShapeElement,
                true,
            );
            let properties = self.user_properties(&hole.user_properties);
            let id = match (self.config.use_simplified, self.board_stratum) {
                (false, Some(stratum)) => {
                    let feature = self.document.add_third_item(
                        &hole.name,
                        ThirdItemKind::InterStratumFeature {
                            shape_element: shape,
                            feature_type: inter_stratum_type(hole.hole_type),
                            stratum,
                        },
                    );
                    self.wrap_traditional(&hole.name, feature, properties)
                }
                _ => self.simplified_placement(
                    &hole.name,
                    hole_geometry_type(hole.hole_type),
                    shape,
                    properties,
                ),
            };
            debug!(hole = %hole.name, id = %id, "已生成孔");
        }
    }

    fn emit_constraints(&mut self, plan: &Plan<'_>) {
        for constraint_plan in &plan.constraints {
            let constraint = constraint_plan.source;
            let keepout = constraint.constraint_type == ConstraintType::Keepout;
            let purpose = keep_purpose(constraint.purpose);
            let shape = self.shape(
                &constraint_plan.curve,
                constraint_plan.range,
                ShapeElementType::FeatureShapeElement,
                keepout,
            );
            let properties = self.user_properties(&constraint.user_properties);
            let id = if self.config.use_simplified {
                let geometry_type = if keepout {
                    GeometryType::Keepout(purpose)
                } else {
                    GeometryType::Keepin(purpose)
                };
                self.simplified_placement(&constraint.name, geometry_type, shape, properties)
            } else {
                let kind = if keepout {
                    ThirdItemKind::KeepOut {
                        shape_element: shape,
                        purpose,
                    }
                } else {
                    ThirdItemKind::KeepIn {
                        shape_element: shape,
                        purpose,
                    }
                };
                let third = self.document.add_third_item(&constraint.name, kind);
                self.wrap_traditional(&constraint.name, third, properties)
            };
            debug!(constraint = %constraint.name, id = %id, "已生成约束区域");
        }
    }
}

fn spatial_transformation(placement: &Placement3D) -> Transformation {
    let [tx, ty, tz] = placement.translation;
    Transformation::D3 {
        rotation: placement.rotation,
        tx,
        ty,
        tz,
    }
}

fn layer_purpose(layer_type: LayerType) -> LayerPurpose {
    match layer_type {
        LayerType::Signal => LayerPurpose::OtherSignal,
        LayerType::Plane => LayerPurpose::PowerOrGround,
        LayerType::Dielectric => LayerPurpose::Dielectric,
        LayerType::SolderMask => LayerPurpose::SolderMask,
        LayerType::SilkScreen => LayerPurpose::SilkScreen,
        LayerType::SolderPaste => LayerPurpose::SolderPaste,
        LayerType::Mechanical => LayerPurpose::Mechanical,
        LayerType::Documentation => LayerPurpose::Documentation,
    }
}

fn keep_purpose(purpose: ConstraintPurpose) -> KeepPurpose {
    match purpose {
        ConstraintPurpose::Route => KeepPurpose::Route,
        ConstraintPurpose::Component => KeepPurpose::ComponentPlacement,
        ConstraintPurpose::Via => KeepPurpose::Via,
        ConstraintPurpose::Testpoint => KeepPurpose::TestPoint,
        ConstraintPurpose::Other => KeepPurpose::Other,
    }
}

// Backdrill 已在校验阶段拒绝，这里按非金属化孔兜底。
fn hole_geometry_type(hole_type: HoleType) -> GeometryType {
    match hole_type {
        HoleType::Via => GeometryType::HoleVia,
        HoleType::Filled => GeometryType::HoleFilledVia,
        HoleType::Plated => GeometryType::HolePlated,
        HoleType::NonPlated | HoleType::Backdrill => GeometryType::HoleNonPlated,
    }
}

fn inter_stratum_type(hole_type: HoleType) -> InterStratumFeatureType {
    match hole_type {
        HoleType::Via => InterStratumFeatureType::Via,
        HoleType::Filled => InterStratumFeatureType::FilledVia,
        HoleType::Plated => InterStratumFeatureType::PlatedCutout,
        HoleType::NonPlated | HoleType::Backdrill => InterStratumFeatureType::NonplatedCutout,
    }
}
