//! 曲线图元：线段、（椭）圆弧、圆、矩形与复合多段线。
//!
//! `Curve` 是统一的带标签联合体，变换、包围盒与序列化逻辑都对它做穷尽匹配。

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Bounds2D, EPSILON, Matrix3, Point2, Vector2};

/// 判定多段线首尾闭合的容差。
pub const CLOSURE_TOLERANCE: f64 = 1e-10;

/// 导出多边形顶点时圆弧的默认最大步进角（5°）。
pub const DEFAULT_ANGLE_STEP: f64 = PI / 36.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("zero-length line at ({x}, {y})")]
    ZeroLengthLine { x: f64, y: f64 },
    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f64),
    #[error("rectangle size must be positive, got {width} x {height}")]
    NonPositiveSize { width: f64, height: f64 },
    #[error("{context} needs at least {required} distinct points, got {actual}")]
    TooFewPoints {
        context: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("arc sweep must be non-zero")]
    ZeroSweep,
    #[error("arc sweep {0} rad is not a full circle")]
    NotFullCircle(f64),
    #[error("split position {0} lies outside the arc")]
    SplitOutOfRange(f64),
    #[error("segment {index} does not start where the previous segment ends")]
    Discontinuous { index: usize },
    #[error("boundary is not closed")]
    OpenBoundary,
    #[error("non-finite coordinate or parameter")]
    NonFinite,
    #[error("lower bound {lower} exceeds upper bound {upper}")]
    InvertedRange { lower: f64, upper: f64 },
    #[error("coordinate {value} cannot be represented with {precision} decimals")]
    OutOfRange { value: f64, precision: u32 },
}

/// 把角度归一化到 `[0, 2π)`。
pub fn normalize_angle(angle: f64) -> f64 {
    let mut result = angle % TAU;
    if result < 0.0 {
        result += TAU;
    }
    if result >= TAU {
        result -= TAU;
    }
    result
}

fn ensure_finite(values: &[f64]) -> Result<(), GeometryError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFinite)
    }
}

/// 线段。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Result<Self, GeometryError> {
        let line = Self { start, end };
        line.validate()?;
        Ok(line)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_finite(&[self.start.x(), self.start.y(), self.end.x(), self.end.y()])?;
        if self.start.approx_eq(self.end, EPSILON) {
            return Err(GeometryError::ZeroLengthLine {
                x: self.start.x(),
                y: self.start.y(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// 单位方向向量。
    #[inline]
    pub fn direction(&self) -> Vector2 {
        (self.end - self.start).normalized()
    }

    #[inline]
    pub fn midpoint(&self) -> Point2 {
        self.start.lerp(self.end, 0.5)
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.start.lerp(self.end, t)
    }

    /// 点到起终点所在无限长直线的距离。
    pub fn distance_to_point(&self, point: Point2) -> f64 {
        let d = self.end - self.start;
        let len = d.length();
        if len <= EPSILON {
            return point.distance(self.start);
        }
        d.cross(point - self.start).abs() / len
    }

    /// 线段上离 `point` 最近的点，参数被限制在 `[0, 1]`。
    pub fn closest_point(&self, point: Point2) -> Point2 {
        let d = self.end - self.start;
        let len_sq = d.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(d) / len_sq).clamp(0.0, 1.0);
        self.point_at(t)
    }

    pub fn distance_to_segment(&self, point: Point2) -> f64 {
        point.distance(self.closest_point(point))
    }

    pub fn reversed(&self) -> Line {
        Line {
            start: self.end,
            end: self.start,
        }
    }

    pub fn transform(&self, matrix: &Matrix3) -> Line {
        Line {
            start: matrix.transform_point(self.start),
            end: matrix.transform_point(self.end),
        }
    }

    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::from_points([self.start, self.end])
    }
}

/// 广义椭圆弧，轴与坐标轴对齐。
///
/// `start_angle` 为椭圆参数角，构造时归一化到 `[0, 2π)`；
/// `sweep_angle` 带符号，正值为逆时针。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius_x: f64,
    pub radius_y: f64,
    pub start_angle: f64,
    pub sweep_angle: f64,
}

impl Arc {
    pub fn new(
        center: Point2,
        radius_x: f64,
        radius_y: f64,
        start_angle: f64,
        sweep_angle: f64,
    ) -> Result<Self, GeometryError> {
        let sweep_angle = sweep_angle.clamp(-TAU, TAU);
        let arc = Self {
            center,
            radius_x,
            radius_y,
            start_angle: normalize_angle(start_angle),
            sweep_angle,
        };
        arc.validate()?;
        Ok(arc)
    }

    pub fn circular(
        center: Point2,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
    ) -> Result<Self, GeometryError> {
        Self::new(center, radius, radius, start_angle, sweep_angle)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_finite(&[
            self.center.x(),
            self.center.y(),
            self.radius_x,
            self.radius_y,
            self.start_angle,
            self.sweep_angle,
        ])?;
        if self.radius_x <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(self.radius_x));
        }
        if self.radius_y <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(self.radius_y));
        }
        if self.sweep_angle.abs() <= EPSILON {
            return Err(GeometryError::ZeroSweep);
        }
        Ok(())
    }

    #[inline]
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep_angle
    }

    #[inline]
    pub fn is_circular(&self) -> bool {
        (self.radius_x - self.radius_y).abs() <= EPSILON
    }

    pub fn is_full_circle(&self) -> bool {
        self.is_circular() && (self.sweep_angle.abs() - TAU).abs() <= 1e-10
    }

    pub fn point_at_angle(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x() + self.radius_x * angle.cos(),
            self.center.y() + self.radius_y * angle.sin(),
        )
    }

    #[inline]
    pub fn start_point(&self) -> Point2 {
        self.point_at_angle(self.start_angle)
    }

    #[inline]
    pub fn end_point(&self) -> Point2 {
        self.point_at_angle(self.end_angle())
    }

    #[inline]
    pub fn midpoint(&self) -> Point2 {
        self.point_at_angle(self.start_angle + self.sweep_angle / 2.0)
    }

    /// 圆弧精确长度；椭圆弧按 Ramanujan 周长公式按扫角比例近似。
    pub fn length(&self) -> f64 {
        if self.is_circular() {
            return self.radius_x * self.sweep_angle.abs();
        }
        let a = self.radius_x;
        let b = self.radius_y;
        let h = ((a - b) / (a + b)).powi(2);
        let perimeter = PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
        perimeter * self.sweep_angle.abs() / TAU
    }

    /// 角度是否落在扫掠范围内（按扫掠方向计）。
    pub fn contains_angle(&self, angle: f64) -> bool {
        if self.sweep_angle.abs() >= TAU - 1e-12 {
            return true;
        }
        self.relative_angle(angle) <= self.sweep_angle.abs() + 1e-12
    }

    fn relative_angle(&self, angle: f64) -> f64 {
        if self.sweep_angle >= 0.0 {
            normalize_angle(angle - self.start_angle)
        } else {
            normalize_angle(self.start_angle - angle)
        }
    }

    fn parameter_angle_of(&self, point: Point2) -> f64 {
        let local = point - self.center;
        (local.y() / self.radius_y).atan2(local.x() / self.radius_x)
    }

    /// 在参数 `t ∈ (0, 1)` 处把圆弧一分为二。
    pub fn split_at_parameter(&self, t: f64) -> Result<(Arc, Arc), GeometryError> {
        if !(t > 0.0 && t < 1.0) {
            return Err(GeometryError::SplitOutOfRange(t));
        }
        let first_sweep = self.sweep_angle * t;
        let first = Arc {
            sweep_angle: first_sweep,
            ..*self
        };
        let second = Arc {
            start_angle: normalize_angle(self.start_angle + first_sweep),
            sweep_angle: self.sweep_angle - first_sweep,
            ..*self
        };
        Ok((first, second))
    }

    /// 在指定参数角处分割，角度必须位于弧内且不在端点上。
    pub fn split(&self, angle: f64) -> Result<(Arc, Arc), GeometryError> {
        if !self.contains_angle(angle) {
            return Err(GeometryError::SplitOutOfRange(angle));
        }
        let t = self.relative_angle(angle) / self.sweep_angle.abs();
        self.split_at_parameter(t)
            .map_err(|_| GeometryError::SplitOutOfRange(angle))
    }

    /// 两个半径同时外扩 `distance`（负值内缩）。
    pub fn offset(&self, distance: f64) -> Result<Arc, GeometryError> {
        let radius_x = self.radius_x + distance;
        let radius_y = self.radius_y + distance;
        if radius_x <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius_x));
        }
        if radius_y <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius_y));
        }
        Ok(Arc {
            radius_x,
            radius_y,
            ..*self
        })
    }

    /// 弦中点到弧中点的距离。
    pub fn sagitta(&self) -> f64 {
        let chord_mid = self.start_point().lerp(self.end_point(), 0.5);
        chord_mid.distance(self.midpoint())
    }

    /// 与线段的交点，在单位圆空间中解二次方程，按沿线段方向排序。
    pub fn intersect_line(&self, line: &Line) -> Vec<Point2> {
        let scale = |v: Vector2| Vector2::new(v.x() / self.radius_x, v.y() / self.radius_y);
        let origin = scale(line.start - self.center);
        let delta = scale(line.end - line.start);

        let a = delta.dot(delta);
        if a <= EPSILON * EPSILON {
            return Vec::new();
        }
        let b = 2.0 * origin.dot(delta);
        let c = origin.dot(origin) - 1.0;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < -1e-12 {
            return Vec::new();
        }

        let roots = if discriminant.abs() <= 1e-12 {
            vec![-b / (2.0 * a)]
        } else {
            let sqrt = discriminant.sqrt();
            vec![(-b - sqrt) / (2.0 * a), (-b + sqrt) / (2.0 * a)]
        };

        roots
            .into_iter()
            .filter(|t| (-1e-12..=1.0 + 1e-12).contains(t))
            .map(|t| line.point_at(t))
            .filter(|p| self.contains_angle(self.parameter_angle_of(*p)))
            .collect()
    }

    /// 按不超过 `max_angle_step` 的参数步长离散成点列（含首尾）。
    pub fn discretize(&self, max_angle_step: f64) -> Vec<Point2> {
        let step = if max_angle_step.is_finite() && max_angle_step.abs() > 1e-6 {
            max_angle_step.abs()
        } else {
            DEFAULT_ANGLE_STEP
        };
        let count = ((self.sweep_angle.abs() / step).ceil() as usize).max(1);
        (0..=count)
            .map(|i| {
                let angle = self.start_angle + self.sweep_angle * (i as f64 / count as f64);
                self.point_at_angle(angle)
            })
            .collect()
    }

    /// 近似变换：按矩阵轴向缩放系数重建一个轴对齐椭圆弧。
    ///
    /// 对平移、旋转、均匀缩放与镜像下的圆弧是精确的；存在错切或非均匀缩放叠加
    /// 旋转时，结果只是近似椭圆，不是精确的二次曲线变换。
    pub fn transform(&self, matrix: &Matrix3) -> Arc {
        let (sx, sy) = matrix.axis_scales();
        let center = matrix.transform_point(self.center);
        let (radius_x, radius_y) = if self.is_circular() && (sx - sy).abs() <= EPSILON {
            (self.radius_x * sx, self.radius_y * sx)
        } else {
            (self.radius_x * sx, self.radius_y * sy)
        };
        let mut arc = Arc {
            center,
            radius_x,
            radius_y,
            start_angle: 0.0,
            sweep_angle: if matrix.is_mirroring() {
                -self.sweep_angle
            } else {
                self.sweep_angle
            },
        };
        if radius_x > 0.0 && radius_y > 0.0 {
            let mapped_start = matrix.transform_point(self.start_point());
            arc.start_angle = normalize_angle(arc.parameter_angle_of(mapped_start));
        }
        arc
    }

    pub fn to_circle(&self) -> Result<Circle, GeometryError> {
        if self.is_full_circle() {
            Ok(Circle {
                center: self.center,
                radius: self.radius_x,
            })
        } else {
            Err(GeometryError::NotFullCircle(self.sweep_angle))
        }
    }

    pub fn reversed(&self) -> Arc {
        Arc {
            start_angle: normalize_angle(self.end_angle()),
            sweep_angle: -self.sweep_angle,
            ..*self
        }
    }

    pub fn distance_to_point(&self, point: Point2) -> f64 {
        if self.is_circular() {
            let local = point - self.center;
            if self.contains_angle(local.angle()) {
                return (local.length() - self.radius_x).abs();
            }
            return point
                .distance(self.start_point())
                .min(point.distance(self.end_point()));
        }
        polyline_distance(&self.discretize(PI / 360.0), point)
    }

    pub fn bounds(&self) -> Bounds2D {
        let mut bounds = Bounds2D::from_points([self.start_point(), self.end_point()]);
        for extreme in [0.0, FRAC_PI_2, PI, FRAC_PI_2 * 3.0] {
            if self.contains_angle(extreme) {
                bounds.expand_to_include(self.point_at_angle(extreme));
            }
        }
        bounds
    }
}

/// 圆。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Result<Self, GeometryError> {
        let circle = Self { center, radius };
        circle.validate()?;
        Ok(circle)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_finite(&[self.center.x(), self.center.y(), self.radius])?;
        if self.radius <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(self.radius));
        }
        Ok(())
    }

    #[inline]
    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }

    pub fn circumference(&self) -> f64 {
        TAU * self.radius
    }

    pub fn to_arc(&self) -> Arc {
        Arc {
            center: self.center,
            radius_x: self.radius,
            radius_y: self.radius,
            start_angle: 0.0,
            sweep_angle: TAU,
        }
    }

    /// 均匀缩放下仍为圆，否则退化为近似椭圆。
    pub fn transform(&self, matrix: &Matrix3) -> Curve {
        let (sx, sy) = matrix.axis_scales();
        if (sx - sy).abs() <= EPSILON {
            Curve::Circle(Circle {
                center: matrix.transform_point(self.center),
                radius: self.radius * sx,
            })
        } else {
            Curve::Arc(self.to_arc().transform(matrix))
        }
    }

    pub fn bounds(&self) -> Bounds2D {
        let r = Vector2::new(self.radius, self.radius);
        Bounds2D::new(self.center - r, self.center + r)
    }
}

/// 轴对齐矩形，`origin` 为左下角。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point2,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(origin: Point2, width: f64, height: f64) -> Result<Self, GeometryError> {
        let rect = Self {
            origin,
            width,
            height,
        };
        rect.validate()?;
        Ok(rect)
    }

    pub fn from_center(center: Point2, width: f64, height: f64) -> Result<Self, GeometryError> {
        Self::new(
            center - Vector2::new(width / 2.0, height / 2.0),
            width,
            height,
        )
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_finite(&[self.origin.x(), self.origin.y(), self.width, self.height])?;
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(GeometryError::NonPositiveSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// 逆时针四个角点，从左下角开始。
    pub fn corners(&self) -> [Point2; 4] {
        let (x0, y0) = (self.origin.x(), self.origin.y());
        let (x1, y1) = (x0 + self.width, y0 + self.height);
        [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    pub fn to_polyline(&self) -> Polyline {
        let corners = self.corners();
        let segments = (0..4)
            .map(|i| {
                Segment::Line(Line {
                    start: corners[i],
                    end: corners[(i + 1) % 4],
                })
            })
            .collect();
        Polyline { segments }
    }

    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::from_points(self.corners())
    }
}

/// 多段线中的一段。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Line(Line),
    Arc(Arc),
}

impl Segment {
    pub fn start_point(&self) -> Point2 {
        match self {
            Segment::Line(line) => line.start,
            Segment::Arc(arc) => arc.start_point(),
        }
    }

    pub fn end_point(&self) -> Point2 {
        match self {
            Segment::Line(line) => line.end,
            Segment::Arc(arc) => arc.end_point(),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Segment::Line(line) => line.length(),
            Segment::Arc(arc) => arc.length(),
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Segment::Line(line) => line.validate(),
            Segment::Arc(arc) => arc.validate(),
        }
    }

    fn point_at_length(&self, distance: f64) -> Point2 {
        let length = self.length();
        let t = if length <= EPSILON {
            0.0
        } else {
            (distance / length).clamp(0.0, 1.0)
        };
        match self {
            Segment::Line(line) => line.point_at(t),
            Segment::Arc(arc) => arc.point_at_angle(arc.start_angle + arc.sweep_angle * t),
        }
    }

    fn distance_to_point(&self, point: Point2) -> f64 {
        match self {
            Segment::Line(line) => line.distance_to_segment(point),
            Segment::Arc(arc) => arc.distance_to_point(point),
        }
    }

    pub fn transform(&self, matrix: &Matrix3) -> Segment {
        match self {
            Segment::Line(line) => Segment::Line(line.transform(matrix)),
            Segment::Arc(arc) => Segment::Arc(arc.transform(matrix)),
        }
    }

    pub fn bounds(&self) -> Bounds2D {
        match self {
            Segment::Line(line) => line.bounds(),
            Segment::Arc(arc) => arc.bounds(),
        }
    }
}

/// 由线段与圆弧首尾相接组成的复合曲线。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    segments: Vec<Segment>,
}

impl Polyline {
    /// 校验每段自身有效且首尾相接（容差 1e-6）。
    pub fn new(segments: Vec<Segment>) -> Result<Self, GeometryError> {
        let polyline = Self { segments };
        polyline.validate()?;
        Ok(polyline)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.segments.is_empty() {
            return Err(GeometryError::TooFewPoints {
                context: "polyline",
                required: 2,
                actual: 0,
            });
        }
        for (index, segment) in self.segments.iter().enumerate() {
            segment.validate()?;
            if index > 0 {
                let previous = self.segments[index - 1].end_point();
                if !previous.approx_eq(segment.start_point(), 1e-6) {
                    return Err(GeometryError::Discontinuous { index });
                }
            }
        }
        Ok(())
    }

    /// 去除相邻近重合点后依次连线；`close_path` 时补一段闭合线。
    pub fn from_points(
        points: &[Point2],
        tolerance: f64,
        close_path: bool,
    ) -> Result<Self, GeometryError> {
        let mut vertices = dedup_points(points, tolerance)?;
        if close_path && vertices.len() > 2 {
            let first = vertices[0];
            if vertices
                .last()
                .is_some_and(|last| last.approx_eq(first, tolerance))
            {
                vertices.pop();
            }
        }
        let required = if close_path { 3 } else { 2 };
        if vertices.len() < required {
            return Err(GeometryError::TooFewPoints {
                context: "polyline",
                required,
                actual: vertices.len(),
            });
        }

        let mut segments: Vec<Segment> = vertices
            .windows(2)
            .map(|pair| {
                Segment::Line(Line {
                    start: pair[0],
                    end: pair[1],
                })
            })
            .collect();
        if close_path {
            segments.push(Segment::Line(Line {
                start: vertices[vertices.len() - 1],
                end: vertices[0],
            }));
        }
        Ok(Self { segments })
    }

    /// 在内部顶点处插入与两侧边相切的圆角。
    ///
    /// 若首尾点重合，输入视为闭合环，每个顶点都参与倒角。某个顶点放不下
    /// 请求的半径（切线长超过较短邻边的一半）或转角接近 0/π 时，该顶点保持尖角。
    pub fn from_points_with_fillet(
        points: &[Point2],
        radius: f64,
        tolerance: f64,
    ) -> Result<Self, GeometryError> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius));
        }
        let mut vertices = dedup_points(points, tolerance)?;
        let closed = vertices.len() > 3
            && vertices[0].approx_eq(vertices[vertices.len() - 1], tolerance);
        if closed {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                context: "fillet",
                required: 3,
                actual: vertices.len(),
            });
        }

        let count = vertices.len();
        let mut fillets: Vec<Option<Fillet>> = Vec::with_capacity(count);
        for i in 0..count {
            let interior = closed || (i > 0 && i + 1 < count);
            if !interior {
                fillets.push(None);
                continue;
            }
            let previous = vertices[(i + count - 1) % count];
            let next = vertices[(i + 1) % count];
            fillets.push(compute_fillet(previous, vertices[i], next, radius)?);
        }

        let min_length = tolerance.max(EPSILON);
        let mut segments = Vec::new();
        let push_line = |segments: &mut Vec<Segment>, start: Point2, end: Point2| {
            if start.distance(end) > min_length {
                segments.push(Segment::Line(Line { start, end }));
            }
        };

        let mut current = match (&fillets[0], closed) {
            (Some(fillet), true) => fillet.tangent_out,
            _ => vertices[0],
        };
        let last_vertex = if closed { count } else { count - 1 };
        for i in 1..last_vertex {
            match &fillets[i] {
                Some(fillet) => {
                    push_line(&mut segments, current, fillet.tangent_in);
                    segments.push(Segment::Arc(fillet.arc));
                    current = fillet.tangent_out;
                }
                None => {
                    push_line(&mut segments, current, vertices[i]);
                    current = vertices[i];
                }
            }
        }
        if closed {
            match &fillets[0] {
                Some(fillet) => {
                    push_line(&mut segments, current, fillet.tangent_in);
                    segments.push(Segment::Arc(fillet.arc));
                }
                None => push_line(&mut segments, current, vertices[0]),
            }
        } else {
            push_line(&mut segments, current, vertices[count - 1]);
        }

        Ok(Self { segments })
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn start_point(&self) -> Point2 {
        self.segments
            .first()
            .map(Segment::start_point)
            .unwrap_or(Point2::ORIGIN)
    }

    pub fn end_point(&self) -> Point2 {
        self.segments
            .last()
            .map(Segment::end_point)
            .unwrap_or(Point2::ORIGIN)
    }

    pub fn is_closed(&self) -> bool {
        !self.segments.is_empty()
            && self
                .start_point()
                .approx_eq(self.end_point(), CLOSURE_TOLERANCE)
    }

    /// 所有段均为直线时可直接输出为点列。
    pub fn is_straight(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Line(_)))
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// 圆弧按 `max_angle_step` 离散后的顶点序列，闭合时首尾点相同。
    pub fn vertices(&self, max_angle_step: f64) -> Vec<Point2> {
        let mut points = Vec::new();
        if let Some(first) = self.segments.first() {
            points.push(first.start_point());
        }
        for segment in &self.segments {
            match segment {
                Segment::Line(line) => points.push(line.end),
                Segment::Arc(arc) => points.extend(arc.discretize(max_angle_step).into_iter().skip(1)),
            }
        }
        points
    }

    /// Douglas–Peucker 简化后重建为纯直线段，圆弧曲率会丢失。
    pub fn simplify(&self, tolerance: f64) -> Result<Polyline, GeometryError> {
        let vertices = self.vertices(DEFAULT_ANGLE_STEP);
        let closed = self.is_closed();
        let mut reduced = douglas_peucker(&vertices, tolerance);
        if closed && reduced.len() < 4 {
            reduced = vertices;
        }
        Polyline::from_points(&reduced, EPSILON, closed)
    }

    /// 按弧长参数化取点，`t` 被限制在 `[0, 1]`。
    pub fn point_at_parameter(&self, t: f64) -> Point2 {
        let total = self.length();
        let mut remaining = t.clamp(0.0, 1.0) * total;
        for segment in &self.segments {
            let length = segment.length();
            if remaining <= length {
                return segment.point_at_length(remaining);
            }
            remaining -= length;
        }
        self.end_point()
    }

    pub fn distance_to_point(&self, point: Point2) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.distance_to_point(point))
            .fold(f64::INFINITY, f64::min)
    }

    /// 点在曲线 `tolerance` 范围内，或闭合时位于内部（奇偶规则）。
    pub fn contains_point(&self, point: Point2, tolerance: f64) -> bool {
        if self.distance_to_point(point) <= tolerance {
            return true;
        }
        if !self.is_closed() {
            return false;
        }
        let ring = self.vertices(DEFAULT_ANGLE_STEP);
        let mut inside = false;
        for pair in ring.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a.y() > point.y()) != (b.y() > point.y()) {
                let x = a.x() + (point.y() - a.y()) / (b.y() - a.y()) * (b.x() - a.x());
                if point.x() < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn transform(&self, matrix: &Matrix3) -> Polyline {
        Polyline {
            segments: self
                .segments
                .iter()
                .map(|segment| segment.transform(matrix))
                .collect(),
        }
    }

    pub fn bounds(&self) -> Bounds2D {
        self.segments
            .iter()
            .fold(Bounds2D::empty(), |acc, segment| acc.combine(&segment.bounds()))
    }
}

struct Fillet {
    tangent_in: Point2,
    tangent_out: Point2,
    arc: Arc,
}

fn compute_fillet(
    previous: Point2,
    vertex: Point2,
    next: Point2,
    radius: f64,
) -> Result<Option<Fillet>, GeometryError> {
    let incoming = vertex - previous;
    let outgoing = next - vertex;
    let (len_in, len_out) = (incoming.length(), outgoing.length());
    let u_in = incoming.normalized();
    let u_out = outgoing.normalized();

    let turn = u_in.dot(u_out).clamp(-1.0, 1.0).acos();
    if turn < 1e-6 || PI - turn < 1e-6 {
        return Ok(None);
    }
    let tangent_length = radius * (turn / 2.0).tan();
    if tangent_length > 0.5 * len_in.min(len_out) + EPSILON {
        return Ok(None);
    }

    let tangent_in = vertex - u_in * tangent_length;
    let tangent_out = vertex + u_out * tangent_length;
    let turns_left = u_in.cross(u_out) > 0.0;
    let normal = if turns_left {
        u_in.perpendicular()
    } else {
        -u_in.perpendicular()
    };
    let center = tangent_in + normal * radius;
    let start_angle = (tangent_in - center).angle();
    let sweep = if turns_left { turn } else { -turn };
    let arc = Arc::circular(center, radius, start_angle, sweep)?;
    Ok(Some(Fillet {
        tangent_in,
        tangent_out,
        arc,
    }))
}

fn dedup_points(points: &[Point2], tolerance: f64) -> Result<Vec<Point2>, GeometryError> {
    let mut result: Vec<Point2> = Vec::with_capacity(points.len());
    for point in points {
        ensure_finite(&[point.x(), point.y()])?;
        if result
            .last()
            .is_some_and(|last| last.approx_eq(*point, tolerance))
        {
            continue;
        }
        result.push(*point);
    }
    Ok(result)
}

fn douglas_peucker(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let mut max_distance = 0.0;
    let mut index = 0;
    for (i, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let distance = Line {
            start: first,
            end: last,
        }
        .distance_to_segment(*point);
        if distance > max_distance {
            max_distance = distance;
            index = i;
        }
    }

    if max_distance > tolerance {
        let mut left = douglas_peucker(&points[..=index], tolerance);
        let right = douglas_peucker(&points[index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn polyline_distance(points: &[Point2], point: Point2) -> f64 {
    points
        .windows(2)
        .map(|pair| {
            Line {
                start: pair[0],
                end: pair[1],
            }
            .distance_to_segment(point)
        })
        .fold(f64::INFINITY, f64::min)
}

/// 统一的曲线联合体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    Line(Line),
    Arc(Arc),
    Circle(Circle),
    Rect(Rect),
    Polyline(Polyline),
}

impl Curve {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Curve::Line(_) => "line",
            Curve::Arc(_) => "arc",
            Curve::Circle(_) => "circle",
            Curve::Rect(_) => "rect",
            Curve::Polyline(_) => "polyline",
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Curve::Line(line) => line.validate(),
            Curve::Arc(arc) => arc.validate(),
            Curve::Circle(circle) => circle.validate(),
            Curve::Rect(rect) => rect.validate(),
            Curve::Polyline(polyline) => polyline.validate(),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Curve::Line(_) => false,
            Curve::Arc(arc) => arc.is_full_circle() || arc.start_point().approx_eq(arc.end_point(), CLOSURE_TOLERANCE),
            Curve::Circle(_) | Curve::Rect(_) => true,
            Curve::Polyline(polyline) => polyline.is_closed(),
        }
    }

    pub fn bounds(&self) -> Bounds2D {
        match self {
            Curve::Line(line) => line.bounds(),
            Curve::Arc(arc) => arc.bounds(),
            Curve::Circle(circle) => circle.bounds(),
            Curve::Rect(rect) => rect.bounds(),
            Curve::Polyline(polyline) => polyline.bounds(),
        }
    }

    /// 矩形变换后可能不再轴对齐，因此统一转为多段线。
    pub fn transform(&self, matrix: &Matrix3) -> Curve {
        match self {
            Curve::Line(line) => Curve::Line(line.transform(matrix)),
            Curve::Arc(arc) => Curve::Arc(arc.transform(matrix)),
            Curve::Circle(circle) => circle.transform(matrix),
            Curve::Rect(rect) => Curve::Polyline(rect.to_polyline().transform(matrix)),
            Curve::Polyline(polyline) => Curve::Polyline(polyline.transform(matrix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn square(size: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    #[test]
    fn zero_length_line_is_rejected() {
        let p = Point2::new(1.0, 1.0);
        assert!(matches!(
            Line::new(p, p),
            Err(GeometryError::ZeroLengthLine { .. })
        ));
    }

    #[test]
    fn line_distance_uses_infinite_line_but_closest_point_clamps() {
        let line = Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)).unwrap();
        let beyond = Point2::new(5.0, 2.0);
        assert!((line.distance_to_point(beyond) - 2.0).abs() < 1e-12);
        assert!(line.closest_point(beyond).approx_eq(Point2::new(1.0, 0.0), 1e-12));
        assert!(line.direction().approx_eq(Vector2::new(1.0, 0.0), 1e-12));
    }

    #[test]
    fn arc_start_angle_is_normalized() {
        let arc = Arc::circular(Point2::ORIGIN, 1.0, -FRAC_PI_2, PI).unwrap();
        assert!((arc.start_angle - 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert!(arc.end_point().approx_eq(Point2::new(0.0, 1.0), 1e-12));
        assert!(arc.midpoint().approx_eq(Point2::new(1.0, 0.0), 1e-12));
    }

    #[test]
    fn full_circle_arc_converts_to_circle() {
        let full = Arc::circular(Point2::new(2.0, 3.0), 1.5, 0.3, TAU).unwrap();
        assert!(full.is_full_circle());
        let circle = full.to_circle().expect("full circle");
        assert_eq!(circle.radius, 1.5);

        let partial = Arc::circular(Point2::new(2.0, 3.0), 1.5, 0.3, TAU - 0.01).unwrap();
        assert!(!partial.is_full_circle());
        assert!(matches!(partial.to_circle(), Err(GeometryError::NotFullCircle(_))));

        let ellipse = Arc::new(Point2::ORIGIN, 2.0, 1.0, 0.0, TAU).unwrap();
        assert!(!ellipse.is_full_circle());
    }

    #[test]
    fn arc_length_exact_and_ramanujan() {
        let quarter = Arc::circular(Point2::ORIGIN, 2.0, 0.0, FRAC_PI_2).unwrap();
        assert!((quarter.length() - PI).abs() < 1e-12);

        let ellipse = Arc::new(Point2::ORIGIN, 3.0, 1.0, 0.0, TAU).unwrap();
        // 3×1 椭圆周长约为 13.3649
        assert!((ellipse.length() - 13.3649).abs() < 1e-3);
    }

    #[test]
    fn contains_angle_respects_sweep_direction() {
        let ccw = Arc::circular(Point2::ORIGIN, 1.0, 0.0, FRAC_PI_2).unwrap();
        assert!(ccw.contains_angle(FRAC_PI_4));
        assert!(!ccw.contains_angle(PI));

        let cw = Arc::circular(Point2::ORIGIN, 1.0, 0.0, -FRAC_PI_2).unwrap();
        assert!(cw.contains_angle(-FRAC_PI_4));
        assert!(!cw.contains_angle(FRAC_PI_4));
    }

    #[test]
    fn split_produces_adjacent_arcs() {
        let arc = Arc::circular(Point2::ORIGIN, 1.0, 0.0, PI).unwrap();
        let (first, second) = arc.split(FRAC_PI_2).unwrap();
        assert!((first.sweep_angle - FRAC_PI_2).abs() < 1e-12);
        assert!(first.end_point().approx_eq(second.start_point(), 1e-12));
        assert!(second.end_point().approx_eq(arc.end_point(), 1e-12));
        assert!(arc.split(3.0 * FRAC_PI_2).is_err());
        assert!(arc.split_at_parameter(1.0).is_err());
    }

    #[test]
    fn offset_fails_when_radius_collapses() {
        let arc = Arc::circular(Point2::ORIGIN, 1.0, 0.0, PI).unwrap();
        assert!((arc.offset(0.5).unwrap().radius_x - 1.5).abs() < 1e-12);
        assert!(matches!(
            arc.offset(-1.0),
            Err(GeometryError::NonPositiveRadius(_))
        ));
    }

    #[test]
    fn sagitta_of_semicircle_is_radius() {
        let arc = Arc::circular(Point2::ORIGIN, 2.0, 0.0, PI).unwrap();
        assert!((arc.sagitta() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn line_intersection_in_ellipse_space() {
        let ellipse = Arc::new(Point2::ORIGIN, 2.0, 1.0, 0.0, TAU).unwrap();
        let line = Line::new(Point2::new(-5.0, 0.0), Point2::new(5.0, 0.0)).unwrap();
        let hits = ellipse.intersect_line(&line);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].approx_eq(Point2::new(-2.0, 0.0), 1e-9));
        assert!(hits[1].approx_eq(Point2::new(2.0, 0.0), 1e-9));

        let upper = Arc::new(Point2::ORIGIN, 2.0, 1.0, 0.0, PI).unwrap();
        let vertical = Line::new(Point2::new(0.0, -5.0), Point2::new(0.0, 5.0)).unwrap();
        let hits = upper.intersect_line(&vertical);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].approx_eq(Point2::new(0.0, 1.0), 1e-9));
    }

    #[test]
    fn discretize_honours_step() {
        let arc = Arc::circular(Point2::ORIGIN, 1.0, 0.0, FRAC_PI_2).unwrap();
        let points = arc.discretize(PI / 8.0);
        assert_eq!(points.len(), 5);
        assert!(points[0].approx_eq(arc.start_point(), 1e-12));
        assert!(points[4].approx_eq(arc.end_point(), 1e-12));
    }

    #[test]
    fn arc_transform_is_exact_for_rigid_motion() {
        let arc = Arc::circular(Point2::new(1.0, 0.0), 1.0, 0.0, FRAC_PI_2).unwrap();
        let matrix = Matrix3::translate(3.0, 4.0).multiply(&Matrix3::rotate(FRAC_PI_2));
        let moved = arc.transform(&matrix);
        assert!(moved.start_point().approx_eq(matrix.transform_point(arc.start_point()), 1e-9));
        assert!(moved.end_point().approx_eq(matrix.transform_point(arc.end_point()), 1e-9));

        let mirrored = arc.transform(&Matrix3::mirror_x());
        assert!(mirrored.sweep_angle < 0.0);
        assert!(mirrored.end_point().approx_eq(Point2::new(-1.0, 1.0), 1e-9));
    }

    #[test]
    fn from_points_closed_is_closed() {
        let mut points = square(10.0);
        points.insert(1, Point2::new(1e-9, 0.0));
        let polyline = Polyline::from_points(&points, 1e-6, true).unwrap();
        assert!(polyline.is_closed());
        assert_eq!(polyline.segments().len(), 4);
        assert!((polyline.length() - 40.0).abs() < 1e-9);

        let rebuilt =
            Polyline::from_points(&polyline.vertices(DEFAULT_ANGLE_STEP), 1e-6, true).unwrap();
        assert!(rebuilt.bounds().approx_eq(&polyline.bounds(), 1e-6));
    }

    #[test]
    fn from_points_requires_enough_points() {
        let err = Polyline::from_points(&[Point2::ORIGIN, Point2::new(1e-12, 0.0)], 1e-6, false)
            .unwrap_err();
        assert!(matches!(err, GeometryError::TooFewPoints { actual: 1, .. }));
    }

    #[test]
    fn fillet_rounds_every_corner_that_fits() {
        let mut points = square(10.0);
        points.push(points[0]);
        let polyline = Polyline::from_points_with_fillet(&points, 1.0, 1e-6).unwrap();
        let arcs = polyline
            .segments()
            .iter()
            .filter(|segment| matches!(segment, Segment::Arc(_)))
            .count();
        assert_eq!(arcs, 4);
        assert!(polyline.is_closed());
        let expected = 4.0 * 8.0 + TAU;
        assert!((polyline.length() - expected).abs() < 1e-9);
    }

    #[test]
    fn oversized_fillet_leaves_sharp_corner() {
        // 中间顶点两侧边长 2 与 10，半径 5 无法放入较短边的一半
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 10.0),
        ];
        let polyline = Polyline::from_points_with_fillet(&points, 5.0, 1e-6).unwrap();
        assert_eq!(polyline.segments().len(), 2);
        assert!(polyline.segments().iter().all(|s| matches!(s, Segment::Line(_))));
        assert!(polyline.end_point().approx_eq(Point2::new(2.0, 10.0), 1e-12));
    }

    #[test]
    fn fillet_arc_is_tangent_and_inside_corner() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ];
        let polyline = Polyline::from_points_with_fillet(&points, 2.0, 1e-6).unwrap();
        let segments = polyline.segments();
        assert_eq!(segments.len(), 3);
        let Segment::Arc(arc) = segments[1] else {
            panic!("expected fillet arc");
        };
        assert!(arc.start_point().approx_eq(Point2::new(8.0, 0.0), 1e-9));
        assert!(arc.end_point().approx_eq(Point2::new(10.0, 2.0), 1e-9));
        assert!(arc.center.approx_eq(Point2::new(8.0, 2.0), 1e-9));
        assert!(arc.sweep_angle > 0.0);
    }

    #[test]
    fn collinear_vertex_is_not_filleted() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
        ];
        let polyline = Polyline::from_points_with_fillet(&points, 1.0, 1e-6).unwrap();
        assert!(polyline.is_straight());
    }

    #[test]
    fn simplify_drops_redundant_vertices() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.001),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ];
        let polyline = Polyline::from_points(&points, 1e-9, false).unwrap();
        let simplified = polyline.simplify(0.01).unwrap();
        assert_eq!(simplified.segments().len(), 2);
    }

    #[test]
    fn point_at_parameter_walks_arc_length() {
        let polyline = Polyline::from_points(&square(10.0), 1e-9, true).unwrap();
        assert!(polyline.point_at_parameter(0.0).approx_eq(Point2::new(0.0, 0.0), 1e-12));
        assert!(polyline.point_at_parameter(0.375).approx_eq(Point2::new(10.0, 5.0), 1e-9));
        assert!(polyline.point_at_parameter(1.0).approx_eq(Point2::new(0.0, 0.0), 1e-9));
    }

    #[test]
    fn contains_point_for_closed_and_open() {
        let closed = Polyline::from_points(&square(10.0), 1e-9, true).unwrap();
        assert!(closed.contains_point(Point2::new(5.0, 5.0), 1e-6));
        assert!(closed.contains_point(Point2::new(10.0, 3.0), 1e-6));
        assert!(!closed.contains_point(Point2::new(15.0, 5.0), 1e-6));

        let open = Polyline::from_points(&square(10.0), 1e-9, false).unwrap();
        assert!(!open.contains_point(Point2::new(5.0, 5.0), 1e-6));
        assert!(open.contains_point(Point2::new(5.0, 0.0), 1e-6));
    }

    #[test]
    fn polyline_new_rejects_gaps() {
        let a = Segment::Line(Line::new(Point2::ORIGIN, Point2::new(1.0, 0.0)).unwrap());
        let b = Segment::Line(Line::new(Point2::new(2.0, 0.0), Point2::new(3.0, 0.0)).unwrap());
        assert!(matches!(
            Polyline::new(vec![a, b]),
            Err(GeometryError::Discontinuous { index: 1 })
        ));
    }

    #[test]
    fn curve_dispatch_is_exhaustive() {
        let rect = Curve::Rect(Rect::from_center(Point2::ORIGIN, 4.0, 2.0).unwrap());
        assert!(rect.is_closed());
        let rotated = rect.transform(&Matrix3::rotate(FRAC_PI_2));
        assert_eq!(rotated.kind_name(), "polyline");
        let bounds = rotated.bounds();
        assert!((bounds.width() - 2.0).abs() < 1e-9);
        assert!((bounds.height() - 4.0).abs() < 1e-9);

        let circle = Curve::Circle(Circle::new(Point2::ORIGIN, 1.0).unwrap());
        assert_eq!(circle.transform(&Matrix3::scale(2.0)).kind_name(), "circle");
        assert_eq!(circle.transform(&Matrix3::scale_xy(2.0, 1.0)).kind_name(), "arc");
        assert!(!Curve::Line(Line::new(Point2::ORIGIN, Point2::new(1.0, 1.0)).unwrap()).is_closed());
    }

    #[test]
    fn curves_deserialize_from_tagged_json() {
        let json = r#"{"kind":"circle","center":[1.0,2.0],"radius":0.5}"#;
        let curve: Curve = serde_json::from_str(json).unwrap();
        assert_eq!(curve, Curve::Circle(Circle::new(Point2::new(1.0, 2.0), 0.5).unwrap()));
    }
}
