pub mod camera;
pub mod gizmo;
pub mod picking;

pub use camera::Camera;
pub use gizmo::{GizmoAxis, GizmoMode, GizmoState};
pub use picking::{pick_scene, HelperKind, HitResolver, PickHit, Ray, Renderable};

// 同じバージョンのglamを使えるように再エクスポート
pub use glam;
