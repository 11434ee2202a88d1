//! 標準のデコーダー

mod assimp;
mod gltf;

use std::sync::Arc;

use crate::decoder::{DecodeOptions, SceneDecoder};

pub use self::assimp::AssimpDecoder;
pub use self::gltf::GltfDecoder;

/// 標準のデコーダー一式（glTFは`gltf`クレート、それ以外はAssimp）
pub fn default_decoders(options: &DecodeOptions) -> Vec<Arc<dyn SceneDecoder>> {
    vec![Arc::new(GltfDecoder), Arc::new(AssimpDecoder::new(*options))]
}
