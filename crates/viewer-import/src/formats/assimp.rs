//! Assimp経由のデコーダー
//!
//! OBJ、FBX、Collada (DAE)、STL などの解析はAssimpに任せる。
//! 三角形分割と法線生成はAssimpの後処理で行い、UVの反転は`RawMesh::into_mesh`で行う

use glam::{Vec2, Vec3};
use log::debug;
use russimp::scene::{PostProcess, Scene};

use crate::decoder::{DecodeOptions, RawMesh, RawScene, SceneDecoder, SourceFile};
use crate::error::{ImportError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct AssimpDecoder {
    options: DecodeOptions,
}

impl AssimpDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    fn post_process(&self) -> Vec<PostProcess> {
        let mut steps = Vec::new();
        if self.options.triangulate {
            steps.push(PostProcess::Triangulate);
        }
        if self.options.generate_normals {
            steps.push(PostProcess::GenerateNormals);
        }
        steps
    }
}

impl SceneDecoder for AssimpDecoder {
    fn name(&self) -> &'static str {
        "assimp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["obj", "fbx", "dae", "stl", "ply", "3ds"]
    }

    fn decode(&self, source: &SourceFile) -> Result<RawScene> {
        if source.bytes.is_empty() {
            return Err(ImportError::NoScene(source.display_name()));
        }

        // 拡張子をAssimpの形式判定のヒントにする
        let hint = source
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let scene = Scene::from_buffer(&source.bytes, self.post_process(), &hint)
            .map_err(|err| ImportError::Parse(format!("{}: {:?}", source.display_name(), err)))?;
        if scene.root.is_none() {
            return Err(ImportError::NoScene(source.display_name()));
        }

        debug!(
            "Assimp decoded {} meshes from {}",
            scene.meshes.len(),
            source.display_name()
        );

        let meshes = scene
            .meshes
            .into_iter()
            .map(|mesh| {
                let uvs = mesh
                    .texture_coords
                    .first()
                    .and_then(|channel| channel.as_ref())
                    .map(|coords| coords.iter().map(|t| Vec2::new(t.x, t.y)).collect())
                    .unwrap_or_default();

                RawMesh {
                    name: mesh.name,
                    positions: mesh.vertices.iter().map(|v| Vec3::new(v.x, v.y, v.z)).collect(),
                    normals: mesh.normals.iter().map(|n| Vec3::new(n.x, n.y, n.z)).collect(),
                    uvs,
                    faces: mesh.faces.into_iter().map(|face| face.0).collect(),
                }
            })
            .collect();

        Ok(RawScene { meshes })
    }
}
