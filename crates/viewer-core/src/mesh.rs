use bytemuck::{Pod, Zeroable};

use crate::error::{Result, SceneError};
use crate::math::{Aabb, Vec2, Vec3};

/// 描画連携用の頂点構造体
/// 位置、法線、色を含む（GPUバッファへそのままアップロードできる）
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    /// 新しい頂点を作成
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, normal, color }
    }
}

/// 三角形メッシュ
///
/// 不変条件:
/// - `normals.len() == positions.len()`
/// - `uvs`は空か`positions`と同じ長さ
/// - `indices.len()`は3の倍数で、全インデックスが頂点数未満
///
/// フィールドは非公開で、生成時に検証する
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
}

impl Mesh {
    /// 検証付きでメッシュを作成
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let mesh = Self {
            positions,
            normals,
            uvs: Vec::new(),
            indices,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// 法線を自動生成してメッシュを作成
    pub fn from_positions(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        check_indices(positions.len(), &indices)?;
        let normals = Self::generate_normals(&positions, &indices);
        Self::new(positions, normals, indices)
    }

    /// UVを付与する（空または頂点数と同じ長さ）
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Result<Self> {
        if !uvs.is_empty() && uvs.len() != self.positions.len() {
            return Err(SceneError::InvalidMesh(format!(
                "{} uvs for {} positions",
                uvs.len(),
                self.positions.len()
            )));
        }
        self.uvs = uvs;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.normals.len() != self.positions.len() {
            return Err(SceneError::InvalidMesh(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            )));
        }
        check_indices(self.positions.len(), &self.indices)
    }

    /// 1x1x1、原点中心のキューブ（面ごとに頂点を分けたフラット法線）
    pub fn cube() -> Self {
        // (法線, 面内のu方向, 面内のv方向)
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            let center = normal * 0.5;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                positions.push(center + u * su + v * sv);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            normals,
            uvs: Vec::new(),
            indices,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// 頂点数を取得
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// インデックス数を取得
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 三角形数を取得
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// 三角形ごとの頂点位置をイテレート
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    /// 頂点位置の算術平均（空のメッシュは原点）
    pub fn centroid(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self.positions.iter().copied().sum();
        sum / self.positions.len() as f32
    }

    /// 重心が原点に来るよう全頂点を移動し、移動前の重心を返す
    pub fn recenter(&mut self) -> Vec3 {
        let centroid = self.centroid();
        for p in &mut self.positions {
            *p -= centroid;
        }
        centroid
    }

    /// ローカル座標系でのバウンディングボックス
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// 面積重み付きのスムーズ法線を生成
    /// 縮退三角形しか接していない頂点の法線はゼロになる
    pub fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; positions.len()];

        for tri in indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            // 外積の長さは三角形面積の2倍なので、そのまま重みになる
            let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        normals
    }

    /// GPUアップロード用のインターリーブ頂点配列
    pub fn to_vertices(&self, color: [f32; 3]) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| Vertex::new(p.to_array(), n.to_array(), color))
            .collect()
    }
}

fn check_indices(vertex_count: usize, indices: &[u32]) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(SceneError::InvalidMesh(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(SceneError::InvalidMesh(format!(
            "index {} out of range for {} positions",
            bad, vertex_count
        )));
    }
    Ok(())
}
