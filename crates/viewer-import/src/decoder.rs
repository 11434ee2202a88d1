//! デコーダー
//!
//! フォーマットごとのデコーダーが生のサブメッシュ（多角形面のまま）を返し、
//! `RawMesh::into_mesh`が三角形分割・法線生成・UV反転を行って`Mesh`にする。

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use viewer_core::{ImportConfig, Mesh};

use crate::error::{ImportError, Result};

/// デコード対象のファイル
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(path, bytes))
    }

    /// エラーメッセージ用の表示名
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// メッシュ変換時のオプション
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeOptions {
    pub triangulate: bool,
    pub generate_normals: bool,
    pub flip_uvs: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            generate_normals: true,
            flip_uvs: true,
        }
    }
}

impl From<&ImportConfig> for DecodeOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            triangulate: config.triangulate,
            generate_normals: config.generate_normals,
            flip_uvs: config.flip_uvs,
        }
    }
}

/// デコーダーが返す生のサブメッシュ
///
/// `normals`と`uvs`は空か`positions`と同じ長さ。`faces`は頂点インデックスの多角形
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub faces: Vec<Vec<u32>>,
}

impl RawMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 頂点か面のどちらかがない
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || !self.faces.iter().any(|f| f.len() >= 3)
    }

    /// 検証済みの三角形メッシュに変換する
    pub fn into_mesh(self, options: &DecodeOptions) -> Result<Mesh> {
        let RawMesh {
            name,
            positions,
            normals,
            mut uvs,
            faces,
        } = self;

        let mut indices = Vec::with_capacity(faces.len() * 3);
        for face in &faces {
            match face.len() {
                // 点・線は描画対象外
                0..=2 => continue,
                3 => indices.extend_from_slice(face),
                n if options.triangulate => {
                    for i in 1..n - 1 {
                        indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                n => {
                    return Err(ImportError::InvalidMesh(format!(
                        "'{}' has a {}-sided face and triangulation is disabled",
                        name, n
                    )));
                }
            }
        }

        let mesh = if normals.len() == positions.len() {
            Mesh::new(positions, normals, indices)?
        } else if options.generate_normals {
            Mesh::from_positions(positions, indices)?
        } else {
            return Err(ImportError::InvalidMesh(format!(
                "'{}' has no normals and normal generation is disabled",
                name
            )));
        };

        if uvs.len() != mesh.vertex_count() {
            uvs.clear();
        }
        if options.flip_uvs {
            for uv in &mut uvs {
                uv.y = 1.0 - uv.y;
            }
        }
        Ok(mesh.with_uvs(uvs)?)
    }
}

/// デコード結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScene {
    pub meshes: Vec<RawMesh>,
}

/// ファイル形式ごとのデコーダー
pub trait SceneDecoder: Send + Sync {
    /// ログ用の名前
    fn name(&self) -> &'static str;

    /// 対応する拡張子（小文字、ドットなし）
    fn extensions(&self) -> &'static [&'static str];

    fn decode(&self, source: &SourceFile) -> Result<RawScene>;

    fn handles(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
