//! 読み込みのエラー型

use thiserror::Error;
use viewer_core::SceneError;

#[derive(Debug, Error)]
pub enum ImportError {
    /// ファイルを開けない・読めない
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// シーン（ルート）が見つからない
    #[error("No scene in {0}")]
    NoScene(String),

    /// 使えるメッシュが一つもない
    #[error("No meshes in {0}")]
    NoMeshes(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Import cancelled")]
    Cancelled,

    #[error("Import worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

impl From<SceneError> for ImportError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::InvalidMesh(msg) => ImportError::InvalidMesh(msg),
            SceneError::Io(e) => ImportError::Io(e),
            other => ImportError::InvalidMesh(other.to_string()),
        }
    }
}
