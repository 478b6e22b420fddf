//! 输出文档图：点、几何、曲线集、形状元素、传统 ThirdItem 以及各类 Item。
//!
//! 文档只允许追加；各分区的顺序即序列化时的输出顺序，引用必须指向更早声明的实体。

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Matrix3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdxId(u64);

impl IdxId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IdxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}

/// 全局长度单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "um")]
    Micrometer,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "inch")]
    Inch,
    #[serde(rename = "mil")]
    Mil,
}

impl LengthUnit {
    pub fn as_idx_str(self) -> &'static str {
        match self {
            LengthUnit::Millimeter => "UNIT_MM",
            LengthUnit::Micrometer => "UNIT_MICRON",
            LengthUnit::Centimeter => "UNIT_CM",
            LengthUnit::Meter => "UNIT_M",
            LengthUnit::Inch => "UNIT_IN",
            LengthUnit::Mil => "UNIT_MIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianPoint {
    pub id: IdxId,
    pub x: f64,
    pub y: f64,
}

/// 二维几何图元，端点均以点 id 引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryKind {
    Line {
        start: IdxId,
        end: IdxId,
    },
    Arc {
        center: IdxId,
        radius_x: f64,
        radius_y: f64,
        start_angle: f64,
        sweep_angle: f64,
    },
    Circle {
        center: IdxId,
        radius: f64,
    },
    PolyLine {
        points: Vec<IdxId>,
    },
}

impl GeometryKind {
    pub fn references(&self) -> Vec<IdxId> {
        match self {
            GeometryKind::Line { start, end } => vec![*start, *end],
            GeometryKind::Arc { center, .. } | GeometryKind::Circle { center, .. } => {
                vec![*center]
            }
            GeometryKind::PolyLine { points } => points.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub id: IdxId,
    pub kind: GeometryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeDescriptionType {
    GeometricModel,
    Outline,
}

impl ShapeDescriptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeDescriptionType::GeometricModel => "GeometricModel",
            ShapeDescriptionType::Outline => "Outline",
        }
    }
}

/// 沿 Z 方向拉伸的二维曲线集合。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSet {
    pub id: IdxId,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub shape_description_type: ShapeDescriptionType,
    pub geometries: Vec<IdxId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeElementType {
    FeatureShapeElement,
    ComponentTermination,
    PartShapeElement,
}

impl ShapeElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeElementType::FeatureShapeElement => "FeatureShapeElement",
            ShapeElementType::ComponentTermination => "ComponentTermination",
            ShapeElementType::PartShapeElement => "PartShapeElement",
        }
    }
}

/// `inverted = true` 表示去除材料（孔、禁布区）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeElement {
    pub id: IdxId,
    pub element_type: ShapeElementType,
    pub inverted: bool,
    pub curve_set: IdxId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StratumSurface {
    PrimarySurface,
    SecondarySurface,
}

impl StratumSurface {
    pub fn as_str(self) -> &'static str {
        match self {
            StratumSurface::PrimarySurface => "PrimarySurface",
            StratumSurface::SecondarySurface => "SecondarySurface",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterStratumFeatureType {
    Via,
    FilledVia,
    PlatedCutout,
    NonplatedCutout,
}

impl InterStratumFeatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            InterStratumFeatureType::Via => "Via",
            InterStratumFeatureType::FilledVia => "FilledVia",
            InterStratumFeatureType::PlatedCutout => "PlatedCutout",
            InterStratumFeatureType::NonplatedCutout => "NonplatedCutout",
        }
    }
}

/// 禁布/限布区的约束目的。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepPurpose {
    Route,
    ComponentPlacement,
    Via,
    TestPoint,
    Other,
}

impl KeepPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            KeepPurpose::Route => "Route",
            KeepPurpose::ComponentPlacement => "ComponentPlacement",
            KeepPurpose::Via => "Via",
            KeepPurpose::TestPoint => "TestPoint",
            KeepPurpose::Other => "Other",
        }
    }

    fn geometry_suffix(self) -> &'static str {
        match self {
            KeepPurpose::Route => "ROUTE",
            KeepPurpose::ComponentPlacement => "COMPONENT",
            KeepPurpose::Via => "VIA",
            KeepPurpose::TestPoint => "TESTPOINT",
            KeepPurpose::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerPurpose {
    OtherSignal,
    PowerOrGround,
    Dielectric,
    SolderMask,
    SilkScreen,
    SolderPaste,
    Mechanical,
    Documentation,
    BoardOutline,
}

impl LayerPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerPurpose::OtherSignal => "OtherSignal",
            LayerPurpose::PowerOrGround => "PowerOrGround",
            LayerPurpose::Dielectric => "Dielectric",
            LayerPurpose::SolderMask => "SolderMask",
            LayerPurpose::SilkScreen => "SilkScreen",
            LayerPurpose::SolderPaste => "SolderPaste",
            LayerPurpose::Mechanical => "Mechanical",
            LayerPurpose::Documentation => "Documentation",
            LayerPurpose::BoardOutline => "BoardOutline",
        }
    }

    fn geometry_suffix(self) -> &'static str {
        match self {
            LayerPurpose::OtherSignal => "OTHERSIGNAL",
            LayerPurpose::PowerOrGround => "POWERGROUND",
            LayerPurpose::Dielectric => "DIELECTRIC",
            LayerPurpose::SolderMask => "SOLDERMASK",
            LayerPurpose::SilkScreen => "SILKSCREEN",
            LayerPurpose::SolderPaste => "SOLDERPASTE",
            LayerPurpose::Mechanical => "MECHANICAL",
            LayerPurpose::Documentation => "DOCUMENTATION",
            LayerPurpose::BoardOutline => "BOARD_OUTLINE",
        }
    }
}

/// 传统表示中位于形状元素与 Item 之间的语义层。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThirdItemKind {
    Stratum {
        shape_elements: Vec<IdxId>,
        surface: Option<StratumSurface>,
        technology: Option<IdxId>,
    },
    AssemblyComponent {
        shape_element: IdxId,
    },
    InterStratumFeature {
        shape_element: IdxId,
        feature_type: InterStratumFeatureType,
        stratum: IdxId,
    },
    KeepOut {
        shape_element: IdxId,
        purpose: KeepPurpose,
    },
    KeepIn {
        shape_element: IdxId,
        purpose: KeepPurpose,
    },
    FunctionalItemShape {
        shape_element: IdxId,
        functional_type: String,
    },
    StratumTechnology {
        technology_type: String,
        layer_purpose: LayerPurpose,
    },
}

impl ThirdItemKind {
    pub fn references(&self) -> Vec<IdxId> {
        match self {
            ThirdItemKind::Stratum {
                shape_elements,
                technology,
                ..
            } => {
                let mut refs = shape_elements.clone();
                refs.extend(technology.iter().copied());
                refs
            }
            ThirdItemKind::AssemblyComponent { shape_element }
            | ThirdItemKind::KeepOut { shape_element, .. }
            | ThirdItemKind::KeepIn { shape_element, .. }
            | ThirdItemKind::FunctionalItemShape { shape_element, .. } => vec![*shape_element],
            ThirdItemKind::InterStratumFeature {
                shape_element,
                stratum,
                ..
            } => vec![*shape_element, *stratum],
            ThirdItemKind::StratumTechnology { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirdItem {
    pub id: IdxId,
    pub name: String,
    pub kind: ThirdItemKind,
}

/// 简化表示中区分 Item 语义的 `geometryType`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    BoardOutline,
    Cutout,
    HoleVia,
    HoleFilledVia,
    HolePlated,
    HoleNonPlated,
    Keepout(KeepPurpose),
    Keepin(KeepPurpose),
    Component,
    Layer(LayerPurpose),
    LayerStackup,
}

impl GeometryType {
    pub fn as_idx_string(self) -> String {
        match self {
            GeometryType::BoardOutline => "BOARD_OUTLINE".to_string(),
            GeometryType::Cutout => "CUTOUT".to_string(),
            GeometryType::HoleVia => "HOLE_VIA".to_string(),
            GeometryType::HoleFilledVia => "HOLE_FILLED_VIA".to_string(),
            GeometryType::HolePlated => "HOLE_PLATED".to_string(),
            GeometryType::HoleNonPlated => "HOLE_NON_PLATED".to_string(),
            GeometryType::Keepout(purpose) => format!("KEEPOUT_AREA_{}", purpose.geometry_suffix()),
            GeometryType::Keepin(purpose) => format!("KEEPIN_AREA_{}", purpose.geometry_suffix()),
            GeometryType::Component => "COMPONENT".to_string(),
            GeometryType::Layer(purpose) => format!("LAYER_{}", purpose.geometry_suffix()),
            GeometryType::LayerStackup => "LAYER_STACKUP".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyKey {
    pub system_scope: String,
    pub object_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    Length(f64),
    Real(f64),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProperty {
    pub key: PropertyKey,
    pub value: PropertyValue,
    pub is_changed: Option<bool>,
    pub is_new: Option<bool>,
}

impl UserProperty {
    pub fn new(
        system_scope: impl Into<String>,
        object_name: impl Into<String>,
        value: PropertyValue,
    ) -> Self {
        Self {
            key: PropertyKey {
                system_scope: system_scope.into(),
                object_name: object_name.into(),
            },
            value,
            is_changed: None,
            is_new: None,
        }
    }
}

/// 二维仿射或三维刚体变换。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transformation {
    D2 {
        xx: f64,
        xy: f64,
        yx: f64,
        yy: f64,
        tx: f64,
        ty: f64,
    },
    D3 {
        rotation: [[f64; 3]; 3],
        tx: f64,
        ty: f64,
        tz: f64,
    },
}

impl Transformation {
    pub fn from_matrix(matrix: &Matrix3) -> Self {
        let [xx, xy, tx, yx, yy, ty, _, _, _] = matrix.to_rows();
        Transformation::D2 {
            xx,
            xy,
            yx,
            yy,
            tx,
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub id: IdxId,
    pub name: String,
    pub item: IdxId,
    pub transformation: Option<Transformation>,
    pub z_offset: Option<f64>,
    pub user_properties: Vec<UserProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePin {
    pub pin_number: String,
    pub primary: bool,
    pub point: IdxId,
    pub shape: Option<IdxId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Single {
        shape: IdxId,
        package_name: Option<String>,
        model3d: Option<IdxId>,
        package_pins: Vec<PackagePin>,
    },
    Assembly {
        instances: Vec<ItemInstance>,
        geometry_type: Option<GeometryType>,
        shape: Option<IdxId>,
    },
}

/// 历史追踪标识，仅在开启 `include_history` 时附加。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub system_scope: String,
    pub number: String,
    pub version: u32,
    pub revision: u32,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: IdxId,
    pub name: String,
    pub kind: ItemKind,
    pub user_properties: Vec<UserProperty>,
    pub identifier: Option<Identifier>,
}

impl Item {
    pub fn is_assembly(&self) -> bool {
        matches!(self.kind, ItemKind::Assembly { .. })
    }

    pub fn geometry_type(&self) -> Option<GeometryType> {
        match &self.kind {
            ItemKind::Assembly { geometry_type, .. } => *geometry_type,
            ItemKind::Single { .. } => None,
        }
    }

    pub fn instances(&self) -> &[ItemInstance] {
        match &self.kind {
            ItemKind::Assembly { instances, .. } => instances,
            ItemKind::Single { .. } => &[],
        }
    }

    fn references(&self) -> Vec<IdxId> {
        match &self.kind {
            ItemKind::Single {
                shape,
                model3d,
                package_pins,
                ..
            } => {
                let mut refs = vec![*shape];
                refs.extend(model3d.iter().copied());
                for pin in package_pins {
                    refs.push(pin.point);
                    refs.extend(pin.shape.iter().copied());
                }
                refs
            }
            ItemKind::Assembly {
                instances, shape, ..
            } => {
                let mut refs: Vec<IdxId> = shape.iter().copied().collect();
                refs.extend(instances.iter().map(|instance| instance.item));
                refs
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model3D {
    pub id: IdxId,
    pub identifier: String,
    pub format: String,
    pub version: Option<String>,
    pub location: Option<String>,
    pub transformation: Option<Transformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub description: String,
    pub creator_name: String,
    pub creator_company: String,
    pub creator_system: String,
    pub global_unit_length: LengthUnit,
    pub creation_date_time: DateTime<Utc>,
    pub modified_date_time: DateTime<Utc>,
}

/// 只支持完整基线发送。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessInstruction {
    pub description: Option<String>,
}

/// Item 所在的输出分区。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSection {
    Layers,
    Packages,
    Singles,
    Assemblies,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("{from} references {to} before it is declared")]
    ForwardReference { from: IdxId, to: IdxId },
    #[error("duplicate id {0}")]
    DuplicateId(IdxId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdxDocument {
    pub header: Header,
    pub process_instruction: ProcessInstruction,
    points: Vec<CartesianPoint>,
    geometries: Vec<Geometry>,
    curve_sets: Vec<CurveSet>,
    shape_elements: Vec<ShapeElement>,
    third_items: Vec<ThirdItem>,
    layers: Vec<Item>,
    models: Vec<Model3D>,
    packages: Vec<Item>,
    singles: Vec<Item>,
    assemblies: Vec<Item>,
    next_id: u64,
}

impl IdxDocument {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            process_instruction: ProcessInstruction::default(),
            points: Vec::new(),
            geometries: Vec::new(),
            curve_sets: Vec::new(),
            shape_elements: Vec::new(),
            third_items: Vec::new(),
            layers: Vec::new(),
            models: Vec::new(),
            packages: Vec::new(),
            singles: Vec::new(),
            assemblies: Vec::new(),
            next_id: 0,
        }
    }

    /// 分配下一个 id，计数从 1 开始。
    pub fn allocate_id(&mut self) -> IdxId {
        self.next_id += 1;
        IdxId(self.next_id)
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> IdxId {
        let id = self.allocate_id();
        self.points.push(CartesianPoint { id, x, y });
        id
    }

    pub fn add_geometry(&mut self, kind: GeometryKind) -> IdxId {
        let id = self.allocate_id();
        self.geometries.push(Geometry { id, kind });
        id
    }

    pub fn add_curve_set(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        shape_description_type: ShapeDescriptionType,
        geometries: Vec<IdxId>,
    ) -> IdxId {
        let id = self.allocate_id();
        self.curve_sets.push(CurveSet {
            id,
            lower_bound,
            upper_bound,
            shape_description_type,
            geometries,
        });
        id
    }

    pub fn add_shape_element(
        &mut self,
        element_type: ShapeElementType,
        inverted: bool,
        curve_set: IdxId,
    ) -> IdxId {
        let id = self.allocate_id();
        self.shape_elements.push(ShapeElement {
            id,
            element_type,
            inverted,
            curve_set,
        });
        id
    }

    pub fn add_third_item(&mut self, name: impl Into<String>, kind: ThirdItemKind) -> IdxId {
        let id = self.allocate_id();
        self.third_items.push(ThirdItem {
            id,
            name: name.into(),
            kind,
        });
        id
    }

    pub fn add_model(
        &mut self,
        identifier: impl Into<String>,
        format: impl Into<String>,
        version: Option<String>,
        location: Option<String>,
        transformation: Option<Transformation>,
    ) -> IdxId {
        let id = self.allocate_id();
        self.models.push(Model3D {
            id,
            identifier: identifier.into(),
            format: format.into(),
            version,
            location,
            transformation,
        });
        id
    }

    pub fn add_item(
        &mut self,
        section: ItemSection,
        name: impl Into<String>,
        kind: ItemKind,
        user_properties: Vec<UserProperty>,
        identifier: Option<Identifier>,
    ) -> IdxId {
        let id = self.allocate_id();
        let item = Item {
            id,
            name: name.into(),
            kind,
            user_properties,
            identifier,
        };
        match section {
            ItemSection::Layers => self.layers.push(item),
            ItemSection::Packages => self.packages.push(item),
            ItemSection::Singles => self.singles.push(item),
            ItemSection::Assemblies => self.assemblies.push(item),
        }
        id
    }

    pub fn points(&self) -> &[CartesianPoint] {
        &self.points
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn curve_sets(&self) -> &[CurveSet] {
        &self.curve_sets
    }

    pub fn shape_elements(&self) -> &[ShapeElement] {
        &self.shape_elements
    }

    pub fn third_items(&self) -> &[ThirdItem] {
        &self.third_items
    }

    pub fn layers(&self) -> &[Item] {
        &self.layers
    }

    pub fn models(&self) -> &[Model3D] {
        &self.models
    }

    pub fn packages(&self) -> &[Item] {
        &self.packages
    }

    pub fn singles(&self) -> &[Item] {
        &self.singles
    }

    pub fn assemblies(&self) -> &[Item] {
        &self.assemblies
    }

    pub fn point(&self, id: IdxId) -> Option<&CartesianPoint> {
        self.points.iter().find(|point| point.id == id)
    }

    pub fn shape_element(&self, id: IdxId) -> Option<&ShapeElement> {
        self.shape_elements.iter().find(|element| element.id == id)
    }

    pub fn curve_set(&self, id: IdxId) -> Option<&CurveSet> {
        self.curve_sets.iter().find(|set| set.id == id)
    }

    /// 按输出顺序遍历全部 Item。
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.layers
            .iter()
            .chain(&self.packages)
            .chain(&self.singles)
            .chain(&self.assemblies)
    }

    pub fn item(&self, id: IdxId) -> Option<&Item> {
        self.items().find(|item| item.id == id)
    }

    pub fn item_by_name(&self, name: &str) -> Option<&Item> {
        self.items().find(|item| item.name == name)
    }

    /// 顶层摆放项。Single 与摆放它的 Assembly 同名时，`item_by_name` 返回前者。
    pub fn assembly_by_name(&self, name: &str) -> Option<&Item> {
        self.assemblies.iter().find(|item| item.name == name)
    }

    /// 顶层实体数量（不含 Item 内部的实例）。
    pub fn entity_count(&self) -> usize {
        self.points.len()
            + self.geometries.len()
            + self.curve_sets.len()
            + self.shape_elements.len()
            + self.third_items.len()
            + self.layers.len()
            + self.models.len()
            + self.packages.len()
            + self.singles.len()
            + self.assemblies.len()
    }

    /// 校验 id 唯一且所有引用都指向输出顺序中更早出现的实体。
    pub fn check_references(&self) -> Result<(), DocumentError> {
        let mut declared: HashSet<IdxId> = HashSet::new();

        for point in &self.points {
            declare(&mut declared, point.id)?;
        }
        for geometry in &self.geometries {
            require(&declared, geometry.id, &geometry.kind.references())?;
            declare(&mut declared, geometry.id)?;
        }
        for curve_set in &self.curve_sets {
            require(&declared, curve_set.id, &curve_set.geometries)?;
            declare(&mut declared, curve_set.id)?;
        }
        for element in &self.shape_elements {
            require(&declared, element.id, &[element.curve_set])?;
            declare(&mut declared, element.id)?;
        }
        for third in &self.third_items {
            require(&declared, third.id, &third.kind.references())?;
            declare(&mut declared, third.id)?;
        }
        for item in &self.layers {
            require(&declared, item.id, &item.references())?;
            declare(&mut declared, item.id)?;
            for instance in item.instances() {
                declare(&mut declared, instance.id)?;
            }
        }
        for model in &self.models {
            declare(&mut declared, model.id)?;
        }
        for item in self
            .packages
            .iter()
            .chain(&self.singles)
            .chain(&self.assemblies)
        {
            require(&declared, item.id, &item.references())?;
            declare(&mut declared, item.id)?;
            for instance in item.instances() {
                declare(&mut declared, instance.id)?;
            }
        }
        Ok(())
    }
}

fn declare(declared: &mut HashSet<IdxId>, id: IdxId) -> Result<(), DocumentError> {
    if declared.insert(id) {
        Ok(())
    } else {
        Err(DocumentError::DuplicateId(id))
    }
}

fn require(declared: &HashSet<IdxId>, from: IdxId, refs: &[IdxId]) -> Result<(), DocumentError> {
    match refs.iter().find(|to| !declared.contains(to)) {
        Some(to) => Err(DocumentError::ForwardReference { from, to: *to }),
        None => Ok(()),
    }
}
