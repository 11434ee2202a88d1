//! Mesh Importer
//!
//! 読み込みは二段階。`MeshImporter::load`はシーンに触れずにデコードと正規化を
//! 行うので、どのスレッドでも実行できる。`ImportedFile::into_instances`が
//! レジストリを持つスレッドでIDを割り当てる

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use log::{info, warn};
use viewer_core::{ImportConfig, Material, Mesh, ModelId, ModelInstance, SceneRegistry};

use crate::decoder::{DecodeOptions, SceneDecoder, SourceFile};
use crate::error::{ImportError, Result};
use crate::formats::default_decoders;

/// 読み込みの中断フラグ
/// サブメッシュの変換の合間に確認される
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 正規化の設定
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub decode: DecodeOptions,
    /// 頂点を重心基準に移動する
    pub recenter: bool,
    /// 重心の分だけ初期変換を平行移動し、元の配置を保つ
    pub preserve_placement: bool,
    pub material: Material,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            decode: DecodeOptions::from(config),
            recenter: config.recenter,
            preserve_placement: config.preserve_placement,
            material: Material::with_diffuse(config.default_color),
        }
    }
}

/// 正規化済みのサブメッシュ（ID未割り当て）
#[derive(Debug, Clone)]
pub struct PreparedModel {
    /// ファイル内での名前（ログ用）
    pub source_name: String,
    pub mesh: Mesh,
    /// 重心移動前の重心位置
    pub centroid: Vec3,
    pub initial_transform: Mat4,
}

/// デコード・正規化を終えたファイル
#[derive(Debug, Clone)]
pub struct ImportedFile {
    pub path: PathBuf,
    /// IDの基になる名前（ファイル名から拡張子を除いたもの）
    pub base_name: String,
    pub material: Material,
    pub models: Vec<PreparedModel>,
}

impl ImportedFile {
    /// レジストリの既存IDと、このバッチ内で先に割り当てたIDの両方を避けてIDを振る
    pub fn into_instances(self, registry: &SceneRegistry) -> Vec<ModelInstance> {
        let mut assigned: HashSet<String> = HashSet::new();
        let material = self.material;

        self.models
            .into_iter()
            .map(|model| {
                let id = ModelId::unique(&self.base_name, |candidate| {
                    registry.contains(candidate) || assigned.contains(candidate)
                });
                assigned.insert(id.to_string());
                ModelInstance::new(id, model.mesh, material, model.initial_transform)
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct MeshImporter {
    decoders: Vec<Arc<dyn SceneDecoder>>,
    options: ImportOptions,
}

impl MeshImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            decoders: default_decoders(&options.decode),
            options,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(ImportOptions::from(config))
    }

    /// デコーダーを追加する（先に登録したものより優先）
    pub fn with_decoder(mut self, decoder: Arc<dyn SceneDecoder>) -> Self {
        self.decoders.insert(0, decoder);
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// ファイルを読み込み、シーンに追加できるモデルを返す
    pub fn import(&self, path: impl AsRef<Path>, registry: &SceneRegistry) -> Result<Vec<ModelInstance>> {
        Ok(self.load(path)?.into_instances(registry))
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<ImportedFile> {
        self.load_with_cancel(path, &CancelToken::new())
    }

    pub fn load_with_cancel(&self, path: impl AsRef<Path>, cancel: &CancelToken) -> Result<ImportedFile> {
        let path = path.as_ref();
        let decoder = self.decoder_for(path)?;
        let source = SourceFile::read(path)?;
        self.load_source(decoder.as_ref(), &source, cancel)
    }

    /// 読み込み済みのバイト列から変換する
    pub fn load_source(
        &self,
        decoder: &dyn SceneDecoder,
        source: &SourceFile,
        cancel: &CancelToken,
    ) -> Result<ImportedFile> {
        let scene = decoder.decode(source)?;
        let display = source.display_name();

        let mut models = Vec::with_capacity(scene.meshes.len());
        for raw in scene.meshes {
            if cancel.is_cancelled() {
                info!("Import of {} cancelled", display);
                return Err(ImportError::Cancelled);
            }
            if raw.is_empty() {
                warn!("Skipping empty mesh '{}' in {}", raw.name, display);
                continue;
            }

            let source_name = raw.name.clone();
            let mut mesh = raw.into_mesh(&self.options.decode)?;
            let centroid = if self.options.recenter {
                mesh.recenter()
            } else {
                mesh.centroid()
            };
            let initial_transform = if self.options.recenter && self.options.preserve_placement {
                Mat4::from_translation(centroid)
            } else {
                Mat4::IDENTITY
            };

            models.push(PreparedModel {
                source_name,
                mesh,
                centroid,
                initial_transform,
            });
        }

        if models.is_empty() {
            return Err(ImportError::NoMeshes(display));
        }

        let base_name = source
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("model")
            .to_string();

        info!(
            "Loaded {} meshes from {} with the {} decoder",
            models.len(),
            display,
            decoder.name()
        );

        Ok(ImportedFile {
            path: source.path.clone(),
            base_name,
            material: self.options.material,
            models,
        })
    }

    fn decoder_for(&self, path: &Path) -> Result<Arc<dyn SceneDecoder>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| ImportError::UnsupportedFormat(path.display().to_string()))?;

        self.decoders
            .iter()
            .find(|d| d.handles(&extension))
            .cloned()
            .ok_or(ImportError::UnsupportedFormat(extension))
    }
}

impl Default for MeshImporter {
    fn default() -> Self {
        Self::new(ImportOptions::default())
    }
}

impl std::fmt::Debug for MeshImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.decoders.iter().map(|d| d.name()).collect();
        f.debug_struct("MeshImporter")
            .field("decoders", &names)
            .field("options", &self.options)
            .finish()
    }
}
