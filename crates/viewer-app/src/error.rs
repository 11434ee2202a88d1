use thiserror::Error;
use viewer_core::SceneError;
use viewer_import::ImportError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
