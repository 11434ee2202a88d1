//! シーン関連のエラー型

use thiserror::Error;

/// シーン操作のエラー
#[derive(Debug, Error)]
pub enum SceneError {
    /// 同じIDのモデルが既に登録されている
    #[error("Duplicate model id: {0}")]
    DuplicateId(String),

    /// メッシュの不変条件違反（インデックス範囲外、法線数の不一致など）
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// シーン操作のResult型
pub type Result<T> = std::result::Result<T, SceneError>;

impl From<toml::de::Error> for SceneError {
    fn from(err: toml::de::Error) -> Self {
        SceneError::Config(err.to_string())
    }
}
