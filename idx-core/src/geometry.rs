//! 基础二维几何：点、向量、仿射矩阵与轴对齐包围盒。
//!
//! 所有类型都是不可变值类型，内部以 `glam` 双精度类型承载。

use std::ops::{Add, Mul, Neg, Sub};

use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// 点/向量比较时使用的默认容差。
pub const EPSILON: f64 = 1e-9;

/// 矩阵求逆时判定奇异的行列式阈值。
pub const SINGULAR_DETERMINANT: f64 = 1e-10;

/// 二维点，内部以 `glam::DVec2` 表示。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2(pub DVec2);

impl Point2 {
    pub const ORIGIN: Point2 = Point2(DVec2::ZERO);

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    #[inline]
    pub fn from_vec(vec: DVec2) -> Self {
        Self(vec)
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn translate(self, offset: Vector2) -> Self {
        Self(self.0 + offset.0)
    }

    #[inline]
    pub fn vector_to(self, other: Point2) -> Vector2 {
        Vector2(other.0 - self.0)
    }

    #[inline]
    pub fn distance(self, other: Point2) -> f64 {
        self.0.distance(other.0)
    }

    #[inline]
    pub fn as_vec2(self) -> DVec2 {
        self.0
    }

    /// 两点在 `tolerance` 内视为同一点（逐坐标比较）。
    #[inline]
    pub fn approx_eq(self, other: Point2, tolerance: f64) -> bool {
        self.0.abs_diff_eq(other.0, tolerance)
    }

    #[inline]
    pub fn lerp(self, other: Point2, t: f64) -> Point2 {
        Self(self.0.lerp(other.0, t))
    }
}

impl From<DVec2> for Point2 {
    fn from(value: DVec2) -> Self {
        Self::from_vec(value)
    }
}

impl Add<Vector2> for Point2 {
    type Output = Point2;

    fn add(self, rhs: Vector2) -> Point2 {
        self.translate(rhs)
    }
}

impl Sub<Vector2> for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Vector2) -> Point2 {
        Point2(self.0 - rhs.0)
    }
}

impl Sub for Point2 {
    type Output = Vector2;

    fn sub(self, rhs: Point2) -> Vector2 {
        Vector2(self.0 - rhs.0)
    }
}

/// 二维向量。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2(pub DVec2);

impl Vector2 {
    pub const ZERO: Vector2 = Vector2(DVec2::ZERO);

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    #[inline]
    pub fn from_points(start: Point2, end: Point2) -> Self {
        Self(end.0 - start.0)
    }

    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self(DVec2::new(angle.cos(), angle.sin()))
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.0.length()
    }

    #[inline]
    pub fn length_squared(self) -> f64 {
        self.0.length_squared()
    }

    #[inline]
    pub fn dot(self, other: Vector2) -> f64 {
        self.0.dot(other.0)
    }

    /// 二维叉积（z 分量），正值表示 `other` 位于左侧。
    #[inline]
    pub fn cross(self, other: Vector2) -> f64 {
        self.0.perp_dot(other.0)
    }

    /// 单位化；长度为 0 时返回零向量而不是 NaN。
    #[inline]
    pub fn normalized(self) -> Vector2 {
        Self(self.0.normalize_or_zero())
    }

    /// 逆时针旋转 90° 的法向量。
    #[inline]
    pub fn perpendicular(self) -> Vector2 {
        Self(self.0.perp())
    }

    #[inline]
    pub fn angle(self) -> f64 {
        self.0.y.atan2(self.0.x)
    }

    #[inline]
    pub fn approx_eq(self, other: Vector2, tolerance: f64) -> bool {
        self.0.abs_diff_eq(other.0, tolerance)
    }

    #[inline]
    pub fn as_vec2(self) -> DVec2 {
        self.0
    }
}

impl From<DVec2> for Vector2 {
    fn from(value: DVec2) -> Self {
        Self(value)
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2(self.0 + rhs.0)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2(self.0 - rhs.0)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2(self.0 * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Vector2 {
        Vector2(-self.0)
    }
}

/// 3×3 仿射矩阵（列向量约定，最后一行恒为 `0 0 1`）。
///
/// 对外以行主序 9 元组交换数据：`[xx, xy, tx, yx, yy, ty, 0, 0, 1]`，
/// 即 `x' = xx·x + xy·y + tx`，`y' = yx·x + yy·y + ty`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3(pub DMat3);

impl Matrix3 {
    pub const IDENTITY: Matrix3 = Matrix3(DMat3::IDENTITY);

    #[inline]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// 由行主序数组构造。
    pub fn from_rows(rows: [f64; 9]) -> Self {
        Self(DMat3::from_cols_array(&rows).transpose())
    }

    /// 导出为行主序数组。
    pub fn to_rows(&self) -> [f64; 9] {
        self.0.transpose().to_cols_array()
    }

    /// 沿 X 方向镜像（`x → -x`），即以 Y 轴为对称轴。
    pub fn mirror_x() -> Self {
        Self::scale_xy(-1.0, 1.0)
    }

    /// 沿 Y 方向镜像（`y → -y`），即以 X 轴为对称轴。
    pub fn mirror_y() -> Self {
        Self::scale_xy(1.0, -1.0)
    }

    /// 绕原点逆时针旋转（弧度）。
    pub fn rotate(angle: f64) -> Self {
        Self(DMat3::from_angle(angle))
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self(DMat3::from_translation(DVec2::new(tx, ty)))
    }

    pub fn scale(factor: f64) -> Self {
        Self::scale_xy(factor, factor)
    }

    pub fn scale_xy(sx: f64, sy: f64) -> Self {
        Self(DMat3::from_scale(DVec2::new(sx, sy)))
    }

    /// 矩阵乘积 `self · other`。
    ///
    /// 结果作用于点时等价于先应用 `other` 再应用 `self`：
    /// `a.multiply(&b).transform_point(p) == a.transform_point(b.transform_point(p))`。
    pub fn multiply(&self, other: &Matrix3) -> Matrix3 {
        Matrix3(self.0 * other.0)
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// `|det| < 1e-10` 时视为奇异，返回 `None`。
    pub fn inverse(&self) -> Option<Matrix3> {
        if self.determinant().abs() < SINGULAR_DETERMINANT {
            None
        } else {
            Some(Matrix3(self.0.inverse()))
        }
    }

    pub fn transform_point(&self, point: Point2) -> Point2 {
        Point2(self.0.transform_point2(point.0))
    }

    /// 对向量应用完整仿射变换（旋转/缩放/错切以及平移）。
    ///
    /// 只需要方向时请使用 [`Matrix3::transform_direction`]。
    pub fn transform_vector(&self, vector: Vector2) -> Vector2 {
        Vector2(self.0.transform_point2(vector.0))
    }

    /// 只应用线性部分，不含平移。
    pub fn transform_direction(&self, vector: Vector2) -> Vector2 {
        Vector2(self.0.transform_vector2(vector.0))
    }

    /// 平移分量 `(tx, ty)`。
    pub fn translation(&self) -> Vector2 {
        let z = self.0.z_axis;
        Vector2::new(z.x, z.y)
    }

    /// X 轴基向量的朝向角。
    pub fn rotation_angle(&self) -> f64 {
        let x = self.0.x_axis;
        x.y.atan2(x.x)
    }

    /// 两个基向量的长度，即近似的轴向缩放系数。
    pub fn axis_scales(&self) -> (f64, f64) {
        let x = self.0.x_axis;
        let y = self.0.y_axis;
        (
            DVec2::new(x.x, x.y).length(),
            DVec2::new(y.x, y.y).length(),
        )
    }

    /// 线性部分行列式为负时，变换会翻转环绕方向。
    pub fn is_mirroring(&self) -> bool {
        let x = self.0.x_axis;
        let y = self.0.y_axis;
        x.x * y.y - x.y * y.x < 0.0
    }

    pub fn approx_eq(&self, other: &Matrix3, tolerance: f64) -> bool {
        self.0.abs_diff_eq(other.0, tolerance)
    }

    /// 构造一个最后一行为 `0 0 1` 的矩阵，供 3D 变换的二维投影使用。
    pub fn from_linear(xx: f64, xy: f64, yx: f64, yy: f64, tx: f64, ty: f64) -> Self {
        Self(DMat3::from_cols(
            DVec3::new(xx, yx, 0.0),
            DVec3::new(xy, yy, 0.0),
            DVec3::new(tx, ty, 1.0),
        ))
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 轴对齐边界框。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2D {
    min: Point2,
    max: Point2,
}

impl Bounds2D {
    #[inline]
    pub fn new(min: Point2, max: Point2) -> Self {
        Self {
            min: Point2::from_vec(min.as_vec2().min(max.as_vec2())),
            max: Point2::from_vec(min.as_vec2().max(max.as_vec2())),
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point2>,
    {
        let mut bounds = Self::empty();
        for point in points {
            bounds.expand_to_include(point);
        }
        bounds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x() > self.max.x() || self.min.y() > self.max.y()
    }

    #[inline]
    pub fn min(&self) -> Point2 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point2 {
        self.max
    }

    #[inline]
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x() - self.min.x()
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y() - self.min.y()
        }
    }

    pub fn expand_to_include(&mut self, point: Point2) {
        if self.is_empty() {
            self.min = point;
            self.max = point;
            return;
        }
        self.min = Point2::from_vec(self.min.as_vec2().min(point.as_vec2()));
        self.max = Point2::from_vec(self.max.as_vec2().max(point.as_vec2()));
    }

    /// 返回同时包含两者的新包围盒。
    pub fn combine(&self, other: &Bounds2D) -> Bounds2D {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let mut combined = *self;
        combined.expand_to_include(other.min);
        combined.expand_to_include(other.max);
        combined
    }

    /// 闭区间判定，边界上的点视为包含。
    pub fn contains(&self, point: Point2) -> bool {
        !self.is_empty()
            && point.x() >= self.min.x()
            && point.x() <= self.max.x()
            && point.y() >= self.min.y()
            && point.y() <= self.max.y()
    }

    pub fn intersects(&self, other: &Bounds2D) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x() <= other.max.x()
            && self.max.x() >= other.min.x()
            && self.min.y() <= other.max.y()
            && self.max.y() >= other.min.y()
    }

    /// 变换四个角点后重新求包围盒。
    ///
    /// 旋转时结果不是紧包围盒（会比真实几何体偏大），这是已知限制。
    pub fn transform(&self, matrix: &Matrix3) -> Bounds2D {
        if self.is_empty() {
            return *self;
        }
        let corners = [
            self.min,
            Point2::new(self.max.x(), self.min.y()),
            self.max,
            Point2::new(self.min.x(), self.max.y()),
        ];
        Bounds2D::from_points(corners.into_iter().map(|p| matrix.transform_point(p)))
    }

    #[inline]
    pub fn center(&self) -> Point2 {
        debug_assert!(!self.is_empty());
        Point2::from_vec((self.min.as_vec2() + self.max.as_vec2()) * 0.5)
    }

    pub fn approx_eq(&self, other: &Bounds2D, tolerance: f64) -> bool {
        self.min.approx_eq(other.min, tolerance) && self.max.approx_eq(other.max, tolerance)
    }
}

impl Default for Bounds2D {
    fn default() -> Self {
        Self::empty()
    }
}
