pub mod decoder;
pub mod error;
pub mod formats;
pub mod importer;
pub mod worker;

// 再エクスポート
pub use decoder::{DecodeOptions, RawMesh, RawScene, SceneDecoder, SourceFile};
pub use error::{ImportError, Result};
pub use formats::{AssimpDecoder, GltfDecoder};
pub use importer::{CancelToken, ImportOptions, ImportedFile, MeshImporter, PreparedModel};
pub use worker::{ImportOutcome, ImportTicket, ImportWorker};
