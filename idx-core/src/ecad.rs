//! ECAD 设计输入模型，由外部生产者提供，对核心只读。

use serde::{Deserialize, Serialize};

use crate::curve::{Arc, Circle, Curve, GeometryError, Line, Polyline, Rect};
use crate::geometry::{Matrix3, Point2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcadDesign {
    #[serde(default)]
    pub name: String,
    pub board: Board,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub stackups: Vec<Stackup>,
    #[serde(default)]
    pub models: Vec<Model3dDef>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub holes: Vec<Hole>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl EcadDesign {
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn stackup(&self, id: &str) -> Option<&Stackup> {
        self.stackups.iter().find(|stackup| stackup.id == id)
    }

    pub fn model(&self, id: &str) -> Option<&Model3dDef> {
        self.models.iter().find(|model| model.id == id)
    }

    pub fn footprint(&self, name: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|footprint| footprint.name == name)
    }
}

/// 输入几何：既可直接给出曲线，也可给出点列由内核构造多段线。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeSpec {
    Line(Line),
    Arc(Arc),
    Circle(Circle),
    Rect(Rect),
    Polyline(Polyline),
    Polygon {
        points: Vec<Point2>,
        #[serde(default = "default_closed")]
        closed: bool,
    },
    FilletedPolygon {
        points: Vec<Point2>,
        radius: f64,
    },
}

fn default_closed() -> bool {
    true
}

impl ShapeSpec {
    /// 经内核构造函数重新校验并生成曲线。
    pub fn to_curve(&self, tolerance: f64) -> Result<Curve, GeometryError> {
        let curve = match self {
            ShapeSpec::Line(line) => Curve::Line(Line::new(line.start, line.end)?),
            ShapeSpec::Arc(arc) => Curve::Arc(Arc::new(
                arc.center,
                arc.radius_x,
                arc.radius_y,
                arc.start_angle,
                arc.sweep_angle,
            )?),
            ShapeSpec::Circle(circle) => Curve::Circle(Circle::new(circle.center, circle.radius)?),
            ShapeSpec::Rect(rect) => Curve::Rect(Rect::new(rect.origin, rect.width, rect.height)?),
            ShapeSpec::Polyline(polyline) => {
                Curve::Polyline(Polyline::new(polyline.segments().to_vec())?)
            }
            ShapeSpec::Polygon { points, closed } => {
                Curve::Polyline(Polyline::from_points(points, tolerance, *closed)?)
            }
            ShapeSpec::FilletedPolygon { points, radius } => Curve::Polyline(
                Polyline::from_points_with_fillet(points, *radius, tolerance)?,
            ),
        };
        Ok(curve)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyInput {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

/// 用户自定义属性（位号、阻值、公差……）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub value: PropertyInput,
    /// 数值按长度属性输出。
    #[serde(default)]
    pub is_length: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZRange {
    pub lower: f64,
    pub upper: f64,
}

impl ZRange {
    pub fn new(lower: f64, upper: f64) -> Result<Self, GeometryError> {
        let range = Self { lower, upper };
        range.validate()?;
        Ok(range)
    }

    /// 上下界相等是合法的；下界高于上界才算错误。
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        if self.lower > self.upper {
            return Err(GeometryError::InvertedRange {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn thickness(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default = "default_board_name")]
    pub name: String,
    pub outline: ShapeSpec,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub stackup_id: Option<String>,
    #[serde(default)]
    pub cutouts: Vec<ShapeSpec>,
    #[serde(default)]
    pub user_properties: Vec<PropertySpec>,
}

fn default_board_name() -> String {
    "BOARD".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Signal,
    Plane,
    Dielectric,
    SolderMask,
    SilkScreen,
    SolderPaste,
    Mechanical,
    Documentation,
}

impl LayerType {
    /// 参与 ECAD/MCAD 协同的层类型。
    pub fn is_collaborative(self) -> bool {
        matches!(
            self,
            LayerType::Signal
                | LayerType::Plane
                | LayerType::Dielectric
                | LayerType::SolderMask
                | LayerType::SilkScreen
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub thickness: f64,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// 层叠结构，`layer_ids` 自顶向下排列，Z = 0 位于最底层的下表面。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stackup {
    pub id: String,
    pub name: String,
    pub layer_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement3D {
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model3dDef {
    pub id: String,
    pub identifier: String,
    pub format: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub transformation: Option<Placement3D>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub number: String,
    pub position: Point2,
    #[serde(default)]
    pub shape: Option<ShapeSpec>,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub name: String,
    pub outline: ShapeSpec,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub pins: Vec<Pin>,
    #[serde(default)]
    pub model3d_id: Option<String>,
}

/// 元件摆放：平面摆放的旋转角为角度制。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Planar {
        x: f64,
        y: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        mirror: bool,
    },
    Spatial(Placement3D),
}

impl Placement {
    /// translate · rotate · (mirror ? mirror-X : identity)，即先镜像再旋转最后平移。
    pub fn planar_matrix(&self) -> Option<Matrix3> {
        match *self {
            Placement::Planar {
                x,
                y,
                rotation,
                mirror,
            } => {
                let mirror = if mirror {
                    Matrix3::mirror_x()
                } else {
                    Matrix3::identity()
                };
                Some(
                    Matrix3::translate(x, y)
                        .multiply(&Matrix3::rotate(rotation.to_radians()))
                        .multiply(&mirror),
                )
            }
            Placement::Spatial(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub package_name: String,
    pub layer_id: String,
    pub placement: Placement,
    #[serde(default)]
    pub z_offset: Option<f64>,
    #[serde(default)]
    pub model3d_id: Option<String>,
    #[serde(default)]
    pub user_properties: Vec<PropertySpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleType {
    Via,
    Plated,
    NonPlated,
    Filled,
    Backdrill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpan {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub name: String,
    pub geometry: ShapeSpec,
    pub hole_type: HoleType,
    #[serde(default)]
    pub layer_span: Option<LayerSpan>,
    #[serde(default)]
    pub stackup_id: Option<String>,
    #[serde(default)]
    pub z_range: Option<ZRange>,
    #[serde(default)]
    pub user_properties: Vec<PropertySpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Keepout,
    Keepin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintPurpose {
    Route,
    Component,
    Via,
    Testpoint,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub purpose: ConstraintPurpose,
    pub geometry: ShapeSpec,
    #[serde(default)]
    pub layer_id: Option<String>,
    #[serde(default)]
    pub z_range: Option<ZRange>,
    #[serde(default)]
    pub user_properties: Vec<PropertySpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_deserializes_with_defaults() {
        let json = r#"{
            "board": {
                "outline": {"kind": "polygon", "points": [[0,0],[100,0],[100,80],[0,80]]},
                "thickness": 1.6
            }
        }"#;
        let design: EcadDesign = serde_json::from_str(json).unwrap();
        assert_eq!(design.board.name, "BOARD");
        assert!(design.components.is_empty());
        let curve = design.board.outline.to_curve(1e-6).unwrap();
        assert!(curve.is_closed());
    }

    #[test]
    fn shape_spec_revalidates_curves() {
        let json = r#"{"kind": "circle", "center": [0, 0], "radius": -1}"#;
        let spec: ShapeSpec = serde_json::from_str(json).unwrap();
        assert!(matches!(
            spec.to_curve(1e-6),
            Err(GeometryError::NonPositiveRadius(_))
        ));
    }

    #[test]
    fn property_values_keep_their_type() {
        let json = r#"[
            {"name": "designator", "value": "R1"},
            {"name": "pins", "value": 2},
            {"name": "tolerance", "value": 0.05},
            {"name": "dnp", "value": false}
        ]"#;
        let props: Vec<PropertySpec> = serde_json::from_str(json).unwrap();
        assert_eq!(props[0].value, PropertyInput::Text("R1".into()));
        assert_eq!(props[1].value, PropertyInput::Integer(2));
        assert_eq!(props[2].value, PropertyInput::Real(0.05));
        assert_eq!(props[3].value, PropertyInput::Boolean(false));
    }

    #[test]
    fn planar_placement_mirrors_then_rotates_then_translates() {
        let placement = Placement::Planar {
            x: 10.0,
            y: 5.0,
            rotation: 90.0,
            mirror: true,
        };
        let matrix = placement.planar_matrix().unwrap();
        // (1, 0) → 镜像 (-1, 0) → 旋转 90° (0, -1) → 平移 (10, 4)
        let mapped = matrix.transform_point(Point2::new(1.0, 0.0));
        assert!(mapped.approx_eq(Point2::new(10.0, 4.0), 1e-12));
    }

    #[test]
    fn equal_z_bounds_are_valid() {
        assert!(ZRange::new(0.8, 0.8).is_ok());
        assert!(matches!(
            ZRange::new(1.0, 0.0),
            Err(GeometryError::InvertedRange { .. })
        ));
    }

    #[test]
    fn only_core_layer_types_are_collaborative() {
        assert!(LayerType::SolderMask.is_collaborative());
        assert!(!LayerType::SolderPaste.is_collaborative());
        assert!(!LayerType::Documentation.is_collaborative());
    }
}
