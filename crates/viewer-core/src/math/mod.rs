//! 数学型
//!
//! glamの型を再エクスポートし、バウンディングボックスを提供する

mod bounds;

pub use bounds::Aabb;
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// 行列の近似比較（浮動小数点誤差を許容）
pub fn mat4_approx_eq(a: &Mat4, b: &Mat4, epsilon: f32) -> bool {
    a.abs_diff_eq(*b, epsilon)
}
