//! glTF/GLBデコーダー

use glam::{Mat3, Mat4, Vec2, Vec3};
use gltf::mesh::Mode;
use log::debug;

use crate::decoder::{RawMesh, RawScene, SceneDecoder, SourceFile};
use crate::error::{ImportError, Result};

pub struct GltfDecoder;

impl SceneDecoder for GltfDecoder {
    fn name(&self) -> &'static str {
        "gltf"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["gltf", "glb"]
    }

    fn decode(&self, source: &SourceFile) -> Result<RawScene> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(&source.bytes)
            .map_err(|e| ImportError::Parse(format!("Failed to parse glTF: {}", e)))?;

        let buffers = gltf::import_buffers(&document, source.path.parent(), blob)
            .map_err(|e| ImportError::Parse(format!("Failed to load glTF buffers: {}", e)))?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| ImportError::NoScene(source.display_name()))?;

        let mut meshes = Vec::new();
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, &buffers, &mut meshes);
        }
        Ok(RawScene { meshes })
    }
}

/// ノードツリーをたどり、各ノードのワールド変換をメッシュに焼き込む
fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<RawMesh>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .or_else(|| node.name())
            .map(String::from)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let primitive_count = mesh.primitives().count();

        for primitive in mesh.primitives() {
            let name = if primitive_count > 1 {
                format!("{}_{}", mesh_name, primitive.index())
            } else {
                mesh_name.clone()
            };
            if let Some(raw) = read_primitive(name, &primitive, buffers, world) {
                out.push(raw);
            }
        }
    }

    for child in node.children() {
        collect_node(&child, world, buffers, out);
    }
}

fn read_primitive(
    name: String,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    world: Mat4,
) -> Option<RawMesh> {
    let mode = primitive.mode();
    if !matches!(mode, Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan) {
        debug!("Skipping {:?} primitive in '{}'", mode, name);
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<Vec3> = reader
        .read_positions()?
        .map(|p| world.transform_point3(Vec3::from(p)))
        .collect();

    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|iter| {
            iter.map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero())
                .collect()
        })
        .unwrap_or_default();

    let uvs: Vec<Vec2> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().map(Vec2::from).collect())
        .unwrap_or_default();

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let mut raw = RawMesh::new(name);
    raw.faces = triangles(mode, &indices);
    raw.positions = positions;
    raw.normals = normals;
    raw.uvs = uvs;
    Some(raw)
}

/// ストリップ・ファンを三角形リストに展開する
fn triangles(mode: Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    match mode {
        Mode::TriangleStrip => (0..indices.len().saturating_sub(2))
            .map(|i| {
                // 奇数番目は巻き順を反転
                if i % 2 == 0 {
                    vec![indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    vec![indices[i + 1], indices[i], indices[i + 2]]
                }
            })
            .collect(),
        Mode::TriangleFan => (1..indices.len().saturating_sub(1))
            .map(|i| vec![indices[0], indices[i], indices[i + 1]])
            .collect(),
        _ => indices.chunks_exact(3).map(|tri| tri.to_vec()).collect(),
    }
}
