pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod mesh;
pub mod scene;
pub mod selection;
pub mod viewport;

// 再エクスポート
pub use components::{Material, ModelId, Transform};
pub use config::{CameraConfig, GizmoConfig, ImportConfig, SelectionConfig, ViewerConfig};
pub use error::{Result, SceneError};
pub use events::{SceneEvent, SelectionEvent, SubscriptionId, Subscribers};
pub use math::Aabb;
pub use mesh::{Mesh, Vertex};
pub use scene::{ModelInstance, SceneRegistry};
pub use selection::SelectionSet;
pub use viewport::Viewport;

pub use glam;
