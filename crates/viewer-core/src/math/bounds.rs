//! 軸平行バウンディングボックス
//!
//! ローカル空間の箱はメッシュの頂点から一度だけ計算し、
//! ワールド空間の箱はインスタンスの変換を通して求める

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// 軸平行バウンディングボックス (AABB)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// 最小コーナー
    pub min: Vec3,
    /// 最大コーナー
    pub max: Vec3,
}

impl Aabb {
    /// 最小・最大コーナーからAABBを作成
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// `center`を中心に、辺の長さ`size`の箱を作成
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// 全ての点を含む最小の箱。空ならNone
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for p in rest {
            bounds.min = bounds.min.min(*p);
            bounds.max = bounds.max.max(*p);
        }
        Some(bounds)
    }

    /// 二つの箱の和
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// 任意個の箱の和。空ならNone
    pub fn union_all<I>(boxes: I) -> Option<Aabb>
    where
        I: IntoIterator<Item = Aabb>,
    {
        boxes.into_iter().reduce(|a, b| a.union(&b))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// 点が箱の内側にあるか（境界を含む）
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// 8つのコーナー（最小コーナーが先頭）
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }

    /// アフィン行列で写した箱を囲むワールド空間の箱
    ///
    /// 中心は行列全体で、半径は線形部分の絶対値で写す。
    /// 8コーナーを変換して囲み直した結果と一致する
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let center = matrix.transform_point3(self.center());
        let half = self.size() * 0.5;

        let linear = Mat3::from_mat4(*matrix);
        let abs = Mat3::from_cols(
            linear.x_axis.abs(),
            linear.y_axis.abs(),
            linear.z_axis.abs(),
        );
        let extent = abs * half;

        Aabb {
            min: center - extent,
            max: center + extent,
        }
    }

    /// 許容誤差付きの比較
    pub fn abs_diff_eq(&self, other: &Aabb, epsilon: f32) -> bool {
        self.min.abs_diff_eq(other.min, epsilon) && self.max.abs_diff_eq(other.max, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_from_points() {
        let points = [
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 4.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_union_commutative() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-2.0), Vec3::splat(0.5));
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).min, Vec3::splat(-2.0));
        assert_eq!(a.union(&b).max, Vec3::ONE);
    }

    #[test]
    fn test_center_and_size() {
        let aabb = Aabb::from_center_size(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.size(), Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_contains() {
        let aabb = Aabb::from_center_size(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains(Vec3::ZERO));
        assert!(aabb.contains(Vec3::splat(0.5)));
        assert!(!aabb.contains(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_transformed_translation() {
        let aabb = Aabb::from_center_size(Vec3::ZERO, Vec3::ONE);
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, -5.0)));
        assert!(moved.abs_diff_eq(
            &Aabb::new(Vec3::new(9.5, -0.5, -5.5), Vec3::new(10.5, 0.5, -4.5)),
            1e-5
        ));
    }

    #[test]
    fn test_transformed_matches_corner_refit() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(3.0, 1.0, 2.0));
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 0.5),
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.3),
            Vec3::new(4.0, -1.0, 2.0),
        );
        let corners: Vec<Vec3> = aabb.corners().iter().map(|c| m.transform_point3(*c)).collect();
        let refit = Aabb::from_points(&corners).unwrap();
        assert!(aabb.transformed(&m).abs_diff_eq(&refit, 1e-4));
    }
}
