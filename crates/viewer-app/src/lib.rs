//! Viewer Session
//!
//! UI側から呼ばれるイベントスレッド上の窓口。
//! ポインタ操作、読み込み要求、削除、バウンディングボックス表示を扱う

mod error;
mod session;
pub mod utils;

pub use error::{Result, SessionError};
pub use session::{ImportReport, ViewerSession};
pub use utils::init_logging;

pub use viewer_core;
pub use viewer_import;
pub use viewer_input;
