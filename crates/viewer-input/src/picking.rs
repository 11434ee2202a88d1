//! ピッキングとヒット解決
//!
//! ピック結果は手前から順に並ぶ。描画側のピック処理か、CPUレイキャストの
//! `pick_scene`から得る。`HitResolver`がScene Registryの要素に引き当てる

use glam::Vec3;
use viewer_core::{Aabb, ModelId, ModelInstance, SceneRegistry};

/// レイキャスト用のレイ
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// 始点
    pub origin: Vec3,
    /// 方向（正規化済み）
    pub direction: Vec3,
}

impl Ray {
    /// 新しいレイを作成（方向は正規化する）
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// レイ上の距離`t`の点
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// スラブ法によるAABBとの交差判定
    /// 当たれば交点までの距離を返す
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        // ゼロ除算を避けるため微小値を使う
        let inv = |d: f32| if d.abs() > f32::EPSILON { 1.0 / d } else { f32::MAX };
        let inv_dir = Vec3::new(
            inv(self.direction.x),
            inv(self.direction.y),
            inv(self.direction.z),
        );

        let t1 = (aabb.min - self.origin) * inv_dir;
        let t2 = (aabb.max - self.origin) * inv_dir;

        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Möller–Trumbore ray/triangle test, both faces
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// 描画されるが選択対象にならない補助表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperKind {
    Gizmo,
    BoundingBox,
    PivotMarker,
}

/// ピック結果が指すもの
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Renderable {
    MeshInstance(ModelId),
    Helper(HelperKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub target: Renderable,
    pub distance: f32,
}

impl PickHit {
    pub fn mesh(id: impl Into<ModelId>, distance: f32) -> Self {
        Self {
            target: Renderable::MeshInstance(id.into()),
            distance,
        }
    }

    pub fn helper(kind: HelperKind, distance: f32) -> Self {
        Self {
            target: Renderable::Helper(kind),
            distance,
        }
    }
}

/// レジストリ内の全モデルに対するCPUピッキング
/// ワールドバウンディングボックスで絞り込み、ワールド空間の三角形で判定する。
/// 結果は手前から順
pub fn pick_scene(ray: &Ray, registry: &SceneRegistry) -> Vec<PickHit> {
    let mut hits: Vec<PickHit> = registry
        .all()
        .iter()
        .filter(|instance| ray.intersect_aabb(&instance.world_bounds()).is_some())
        .filter_map(|instance| {
            nearest_triangle_hit(ray, instance).map(|t| PickHit::mesh(instance.id().clone(), t))
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

fn nearest_triangle_hit(ray: &Ray, instance: &ModelInstance) -> Option<f32> {
    let transform = instance.local_transform();
    instance
        .mesh()
        .triangles()
        .filter_map(|[a, b, c]| {
            ray.intersect_triangle(
                transform.transform_point3(a),
                transform.transform_point3(b),
                transform.transform_point3(c),
            )
        })
        .min_by(|a, b| a.total_cmp(b))
}

/// ピック結果をScene Registryの要素に引き当てる
pub struct HitResolver;

impl HitResolver {
    /// 補助表示は飛ばす。見るのは最初のメッシュのヒットだけで、
    /// そのIDがレジストリになければ後続のヒットは試さずNone
    pub fn resolve<'a>(hits: &[PickHit], registry: &'a SceneRegistry) -> Option<&'a ModelInstance> {
        let id = hits.iter().find_map(|hit| match &hit.target {
            Renderable::MeshInstance(id) => Some(id),
            Renderable::Helper(_) => None,
        })?;
        registry.find(id.as_str())
    }
}
