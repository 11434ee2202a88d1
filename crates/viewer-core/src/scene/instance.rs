use crate::components::{Material, ModelId, Transform};
use crate::math::{Aabb, Mat4, Vec3};
use crate::mesh::Mesh;

/// シーンに配置されたモデル
///
/// `local_bounds`は生成時にメッシュから一度だけ計算する。
/// `local_transform`はSceneRegistry経由でのみ更新される
#[derive(Debug, Clone)]
pub struct ModelInstance {
    id: ModelId,
    mesh: Mesh,
    material: Material,
    local_transform: Mat4,
    local_bounds: Aabb,
}

impl ModelInstance {
    pub fn new(id: impl Into<ModelId>, mesh: Mesh, material: Material, local_transform: Mat4) -> Self {
        // 空メッシュは原点の点として扱う
        let local_bounds = mesh
            .bounds()
            .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO));
        Self {
            id: id.into(),
            mesh,
            material,
            local_transform,
            local_bounds,
        }
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// 位置・回転・スケールに分解した現在の変換（プロパティ表示用）
    pub fn transform(&self) -> Transform {
        Transform::from_matrix(&self.local_transform)
    }

    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    /// 現在の変換を適用したワールド空間のバウンディングボックス
    pub fn world_bounds(&self) -> Aabb {
        self.local_bounds.transformed(&self.local_transform)
    }

    pub(crate) fn set_local_transform(&mut self, transform: Mat4) {
        self.local_transform = transform;
    }
}
