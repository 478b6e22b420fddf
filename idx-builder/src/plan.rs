//! 构建前的集中校验：把输入几何转换为内核曲线并解析所有引用与 Z 范围。
//!
//! 任何错误都在这里返回，构建阶段只消费已校验的计划，因此不会产生半成品文档。

use std::collections::HashSet;

use idx_config::{BuildConfig, MAX_DECIMALS};
use idx_core::curve::{Curve, GeometryError, Segment};
use idx_core::ecad::{
    Component, Constraint, EcadDesign, Footprint, Hole, HoleType, Layer, Model3dDef, ShapeSpec,
    Stackup, ZRange,
};
use idx_core::geometry::Point2;
use tracing::debug;

use crate::errors::BuildError;

/// 一个层叠结构中每层的 Z 范围，顺序与输入一致（自顶向下）。
#[derive(Debug, Clone)]
pub(crate) struct StackRanges {
    pub id: String,
    pub ranges: Vec<(String, ZRange)>,
}

impl StackRanges {
    fn compute(stackup: &Stackup, design: &EcadDesign) -> Result<Self, BuildError> {
        let mut ranges = Vec::with_capacity(stackup.layer_ids.len());
        let mut z = 0.0;
        for layer_id in stackup.layer_ids.iter().rev() {
            let layer = design
                .layer(layer_id)
                .ok_or_else(|| BuildError::reference(&stackup.id, "layer_ids", layer_id))?;
            ranges.push((
                layer.id.clone(),
                ZRange {
                    lower: z,
                    upper: z + layer.thickness,
                },
            ));
            z += layer.thickness;
        }
        ranges.reverse();
        Ok(Self {
            id: stackup.id.clone(),
            ranges,
        })
    }

    pub fn total(&self) -> ZRange {
        let upper = self
            .ranges
            .iter()
            .map(|(_, range)| range.upper)
            .fold(0.0, f64::max);
        ZRange { lower: 0.0, upper }
    }

    pub fn layer(&self, layer_id: &str) -> Option<ZRange> {
        self.ranges
            .iter()
            .find(|(id, _)| id == layer_id)
            .map(|(_, range)| *range)
    }
}

#[derive(Debug)]
pub(crate) struct FootprintPlan<'a> {
    pub footprint: &'a Footprint,
    pub model: Option<&'a Model3dDef>,
    pub outline: Curve,
    pub pins: Vec<Option<Curve>>,
    pub range: ZRange,
}

/// 已解析引用的元件：封装以 `Plan::footprints` 中的下标给出，模型为元件覆盖或封装默认值。
#[derive(Debug)]
pub(crate) struct ComponentPlan<'a> {
    pub source: &'a Component,
    pub footprint: usize,
    pub model: Option<&'a Model3dDef>,
    pub layer: &'a Layer,
}

#[derive(Debug)]
pub(crate) struct ShapePlan<'a, T> {
    pub source: &'a T,
    pub curve: Curve,
    pub range: ZRange,
}

#[derive(Debug)]
pub(crate) struct Plan<'a> {
    pub design: &'a EcadDesign,
    pub board_outline: Curve,
    pub board_cutouts: Vec<Curve>,
    pub board_range: ZRange,
    pub board_stack: Option<StackRanges>,
    pub stacks: Vec<StackRanges>,
    pub footprints: Vec<FootprintPlan<'a>>,
    pub components: Vec<ComponentPlan<'a>>,
    pub holes: Vec<ShapePlan<'a, Hole>>,
    pub constraints: Vec<ShapePlan<'a, Constraint>>,
}

impl Plan<'_> {
    /// 层在板层叠中的范围，其次取包含该层的第一个层叠。
    pub fn layer_range(&self, layer_id: &str) -> Option<ZRange> {
        self.board_stack
            .as_ref()
            .and_then(|stack| stack.layer(layer_id))
            .or_else(|| self.stacks.iter().find_map(|stack| stack.layer(layer_id)))
    }
}

/// 取整后仍能被 `f64` 精确表示的最大缩放坐标（2^53）。
const MAX_SCALED_COORDINATE: f64 = 9_007_199_254_740_992.0;

/// 按 `precision` 取整时坐标允许的最大绝对值。点按取整后的坐标去重，超出范围会把不同的点合并。
#[derive(Debug, Clone, Copy)]
struct CoordinateLimit {
    precision: u32,
    tolerance: f64,
    max: f64,
}

impl CoordinateLimit {
    fn new(config: &BuildConfig) -> Self {
        Self {
            precision: config.precision,
            tolerance: config.tolerance(),
            max: MAX_SCALED_COORDINATE * config.tolerance(),
        }
    }

    fn check(&self, value: f64) -> Result<(), GeometryError> {
        if value.abs() > self.max {
            return Err(GeometryError::OutOfRange {
                value,
                precision: self.precision,
            });
        }
        Ok(())
    }

    fn check_point(&self, point: Point2) -> Result<(), GeometryError> {
        self.check(point.x())?;
        self.check(point.y())
    }

    /// 检查包围盒与所有圆心；圆弧的圆心可能落在包围盒之外。
    fn check_curve(&self, curve: &Curve) -> Result<(), GeometryError> {
        let bounds = curve.bounds();
        self.check_point(bounds.min())?;
        self.check_point(bounds.max())?;
        match curve {
            Curve::Arc(arc) => self.check_point(arc.center),
            Curve::Circle(circle) => self.check_point(circle.center),
            Curve::Polyline(polyline) => polyline.segments().iter().try_for_each(|segment| {
                match segment {
                    Segment::Arc(arc) => self.check_point(arc.center),
                    Segment::Line(_) => Ok(()),
                }
            }),
            Curve::Line(_) | Curve::Rect(_) => Ok(()),
        }
    }
}

fn to_curve(
    spec: &ShapeSpec,
    limit: &CoordinateLimit,
    entity: &str,
    field: &'static str,
    require_closed: bool,
) -> Result<Curve, BuildError> {
    let curve = spec
        .to_curve(limit.tolerance)
        .map_err(|source| BuildError::geometry(entity, field, source))?;
    limit
        .check_curve(&curve)
        .map_err(|source| BuildError::geometry(entity, field, source))?;
    if require_closed && !curve.is_closed() {
        return Err(BuildError::geometry(
            entity,
            field,
            GeometryError::OpenBoundary,
        ));
    }
    Ok(curve)
}

fn checked_range(range: ZRange, entity: &str, field: &'static str) -> Result<ZRange, BuildError> {
    range
        .validate()
        .map_err(|source| BuildError::geometry(entity, field, source))?;
    Ok(range)
}

fn ensure_unique<'a>(
    ids: impl Iterator<Item = &'a str>,
    field: &'static str,
) -> Result<(), BuildError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(BuildError::configuration(id, field, "duplicate id"));
        }
    }
    Ok(())
}

/// 按 board、layers、stackups、models、footprints、components、holes、constraints 的顺序校验，
/// 返回第一个遇到的错误。
pub(crate) fn prepare<'a>(
    design: &'a EcadDesign,
    config: &BuildConfig,
) -> Result<Plan<'a>, BuildError> {
    // 配置可能由调用方直接构造而未经过 `AppConfig::validate`
    if config.precision > MAX_DECIMALS {
        return Err(BuildError::configuration(
            "build",
            "precision",
            format!(
                "precision {} exceeds the maximum of {MAX_DECIMALS}",
                config.precision
            ),
        ));
    }
    let limit = CoordinateLimit::new(config);

    let board = &design.board;
    match (board.thickness, board.stackup_id.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(BuildError::configuration(
                &board.name,
                "thickness",
                "board specifies both thickness and stackup_id",
            ));
        }
        (None, None) => {
            return Err(BuildError::configuration(
                &board.name,
                "thickness",
                "board needs either thickness or stackup_id",
            ));
        }
        (Some(thickness), None) if !(thickness.is_finite() && thickness > 0.0) => {
            return Err(BuildError::configuration(
                &board.name,
                "thickness",
                format!("thickness must be positive, got {thickness}"),
            ));
        }
        (None, Some(stackup_id)) if design.stackup(stackup_id).is_none() => {
            return Err(BuildError::reference(&board.name, "stackup_id", stackup_id));
        }
        _ => {}
    }
    let board_outline = to_curve(&board.outline, &limit, &board.name, "outline", true)?;
    let board_cutouts = board
        .cutouts
        .iter()
        .map(|cutout| to_curve(cutout, &limit, &board.name, "cutouts", true))
        .collect::<Result<Vec<_>, _>>()?;

    ensure_unique(design.layers.iter().map(|layer| layer.id.as_str()), "id")?;
    for layer in &design.layers {
        if !(layer.thickness.is_finite() && layer.thickness >= 0.0) {
            return Err(BuildError::configuration(
                &layer.id,
                "thickness",
                format!("layer thickness must be non-negative, got {}", layer.thickness),
            ));
        }
    }

    ensure_unique(design.stackups.iter().map(|stackup| stackup.id.as_str()), "id")?;
    let stacks = design
        .stackups
        .iter()
        .map(|stackup| StackRanges::compute(stackup, design))
        .collect::<Result<Vec<_>, _>>()?;
    let board_stack = board
        .stackup_id
        .as_deref()
        .and_then(|id| stacks.iter().find(|stack| stack.id == id))
        .cloned();
    let board_range = match (&board_stack, board.thickness) {
        (Some(stack), _) => stack.total(),
        (None, Some(thickness)) => ZRange {
            lower: 0.0,
            upper: thickness,
        },
        (None, None) => ZRange {
            lower: 0.0,
            upper: 0.0,
        },
    };

    ensure_unique(design.models.iter().map(|model| model.id.as_str()), "id")?;

    ensure_unique(
        design.footprints.iter().map(|footprint| footprint.name.as_str()),
        "name",
    )?;
    let mut footprints = Vec::with_capacity(design.footprints.len());
    for footprint in &design.footprints {
        let model = footprint
            .model3d_id
            .as_deref()
            .map(|model_id| {
                design
                    .model(model_id)
                    .ok_or_else(|| BuildError::reference(&footprint.name, "model3d_id", model_id))
            })
            .transpose()?;
        let outline = to_curve(&footprint.outline, &limit, &footprint.name, "outline", true)?;
        let range = checked_range(
            ZRange {
                lower: 0.0,
                upper: footprint.height.unwrap_or(0.0),
            },
            &footprint.name,
            "height",
        )?;
        let pins = footprint
            .pins
            .iter()
            .map(|pin| {
                limit
                    .check_point(pin.position)
                    .map_err(|source| BuildError::geometry(&footprint.name, "pins", source))?;
                pin.shape
                    .as_ref()
                    .map(|shape| to_curve(shape, &limit, &footprint.name, "pins", false))
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;
        footprints.push(FootprintPlan {
            footprint,
            model,
            outline,
            pins,
            range,
        });
    }

    let mut components = Vec::with_capacity(design.components.len());
    for component in &design.components {
        let footprint = footprints
            .iter()
            .position(|plan| plan.footprint.name == component.package_name)
            .ok_or_else(|| {
                BuildError::reference(&component.name, "package_name", &component.package_name)
            })?;
        let layer = design.layer(&component.layer_id).ok_or_else(|| {
            BuildError::reference(&component.name, "layer_id", &component.layer_id)
        })?;
        let model = match component.model3d_id.as_deref() {
            Some(model_id) => Some(design.model(model_id).ok_or_else(|| {
                BuildError::reference(&component.name, "model3d_id", model_id)
            })?),
            None => footprints[footprint].model,
        };
        components.push(ComponentPlan {
            source: component,
            footprint,
            model,
            layer,
        });
    }

    let mut holes = Vec::with_capacity(design.holes.len());
    for hole in &design.holes {
        if hole.hole_type == HoleType::Backdrill {
            return Err(BuildError::UnsupportedFeature {
                entity: hole.name.clone(),
                feature: "backdrill holes have no output mapping".to_string(),
            });
        }
        let curve = to_curve(&hole.geometry, &limit, &hole.name, "geometry", true)?;
        let range = hole_range(hole, design, &stacks, board_stack.as_ref())?;
        holes.push(ShapePlan {
            source: hole,
            curve,
            range,
        });
    }

    let mut constraints = Vec::with_capacity(design.constraints.len());
    for constraint in &design.constraints {
        let curve = to_curve(
            &constraint.geometry,
            &limit,
            &constraint.name,
            "geometry",
            true,
        )?;
        let range = match (constraint.z_range, constraint.layer_id.as_deref()) {
            (Some(range), _) => checked_range(range, &constraint.name, "z_range")?,
            (None, Some(layer_id)) => {
                if design.layer(layer_id).is_none() {
                    return Err(BuildError::reference(&constraint.name, "layer_id", layer_id));
                }
                board_stack
                    .as_ref()
                    .and_then(|stack| stack.layer(layer_id))
                    .unwrap_or(board_range)
            }
            (None, None) => board_range,
        };
        constraints.push(ShapePlan {
            source: constraint,
            curve,
            range,
        });
    }

    debug!(
        footprints = footprints.len(),
        components = components.len(),
        holes = holes.len(),
        constraints = constraints.len(),
        "设计校验通过"
    );

    Ok(Plan {
        design,
        board_outline,
        board_cutouts,
        board_range,
        board_stack,
        stacks,
        footprints,
        components,
        holes,
        constraints,
    })
}

fn hole_range(
    hole: &Hole,
    design: &EcadDesign,
    stacks: &[StackRanges],
    board_stack: Option<&StackRanges>,
) -> Result<ZRange, BuildError> {
    if let Some(range) = hole.z_range {
        return checked_range(range, &hole.name, "z_range");
    }
    if let Some(stackup_id) = hole.stackup_id.as_deref() {
        return stacks
            .iter()
            .find(|stack| stack.id == stackup_id)
            .map(StackRanges::total)
            .ok_or_else(|| BuildError::reference(&hole.name, "stackup_id", stackup_id));
    }
    if let Some(span) = &hole.layer_span {
        let stack = board_stack.ok_or_else(|| {
            BuildError::configuration(
                &hole.name,
                "layer_span",
                "board has no stackup to resolve the layer span",
            )
        })?;
        let resolve = |layer_id: &str| -> Result<ZRange, BuildError> {
            if design.layer(layer_id).is_none() {
                return Err(BuildError::reference(&hole.name, "layer_span", layer_id));
            }
            stack.layer(layer_id).ok_or_else(|| {
                BuildError::configuration(
                    &hole.name,
                    "layer_span",
                    format!("layer `{layer_id}` is not part of stackup `{}`", stack.id),
                )
            })
        };
        let from = resolve(&span.from)?;
        let to = resolve(&span.to)?;
        return Ok(ZRange {
            lower: from.lower.min(to.lower),
            upper: from.upper.max(to.upper),
        });
    }
    Err(BuildError::configuration(
        &hole.name,
        "z_range",
        "hole needs a z_range, stackup_id or layer_span",
    ))
}
