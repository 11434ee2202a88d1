//! ビューアー設定
//!
//! TOMLから読み込む。全てのセクションと項目に既定値があり、
//! 空のファイルでも標準の動作になる

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub import: ImportConfig,
    pub selection: SelectionConfig,
    pub gizmo: GizmoConfig,
    pub camera: CameraConfig,
}

/// メッシュ読み込み時のオプション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 多角形を三角形に分割する
    pub triangulate: bool,
    /// 法線がないファイルでは法線を生成する
    pub generate_normals: bool,
    /// UVのv座標を反転する
    pub flip_uvs: bool,
    /// 頂点を重心基準に移動する
    pub recenter: bool,
    /// 重心移動した分を初期Transformで補い、元の配置を保つ
    pub preserve_placement: bool,
    /// 読み込んだモデルの拡散色 (RGBA)
    pub default_color: [f32; 4],
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            triangulate: true,
            generate_normals: true,
            flip_uvs: true,
            recenter: true,
            preserve_placement: true,
            default_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// 選択中モデルの輪郭色
    pub highlight_color: String,
    /// 選択範囲のバウンディングボックスを表示する
    pub show_bounding_box: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            highlight_color: "#00FFDE".to_string(),
            show_bounding_box: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoConfig {
    /// "translate" | "rotate" | "scale" のいずれか
    pub mode: String,
    /// カメラ距離に対するGizmoの大きさ
    pub screen_scale: f32,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            mode: "translate".to_string(),
            screen_scale: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    /// 中ボタンドラッグ時の移動量（ピクセルあたり）
    pub pan_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [10.0, 10.0, 10.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 45.0,
            pan_speed: 0.01,
        }
    }
}

impl ViewerConfig {
    /// TOML文字列から設定を読み込む
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// TOMLファイルから設定を読み込む
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }
}
