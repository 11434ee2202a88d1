use glam::{Mat4, Vec2, Vec3};
use viewer_core::CameraConfig;

use crate::picking::Ray;

/// 3Dカメラ
/// 位置、注視点、上方向ベクトルを持つ透視投影カメラ
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// 中ボタンドラッグの移動量（ピクセルあたり）
    pub pan_speed: f32,
}

impl Camera {
    /// デフォルト値で新しいカメラを作成
    pub fn new(aspect: f32) -> Self {
        Self::from_config(&CameraConfig::default(), aspect)
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from(config.position),
            target: Vec3::from(config.target),
            up: Vec3::Y,
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
            pan_speed: config.pan_speed,
        }
    }

    /// View-Projection行列を構築
    pub fn view_projection(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, self.up);
        let proj = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        proj * view
    }

    /// スクリーン座標（左上原点、ピクセル）からワールド空間のレイを作る
    pub fn screen_ray(&self, screen: Vec2, viewport_size: Vec2) -> Ray {
        let ndc = Vec2::new(
            2.0 * screen.x / viewport_size.x - 1.0,
            1.0 - 2.0 * screen.y / viewport_size.y,
        );

        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }

    /// 画面上のドラッグ量だけカメラを平行移動する（視線方向は保つ）
    pub fn pan(&mut self, delta: Vec2) {
        let look = (self.target - self.position).normalize_or_zero();
        let right = look.cross(self.up).normalize_or_zero();
        let up = right.cross(look).normalize_or_zero();

        let offset = right * (-delta.x * self.pan_speed) + up * (delta.y * self.pan_speed);
        self.position += offset;
        self.target += offset;
    }

    /// カメラ位置を設定
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// カメラの注視点を設定
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// アスペクト比を設定
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_new() {
        let camera = Camera::new(16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.up, Vec3::Y);
        assert!((camera.fov - 45.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_view_projection_not_identity() {
        let camera = Camera::new(1.0);
        assert_ne!(camera.view_projection(), Mat4::IDENTITY);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::new(1.0);
        let ray = camera.screen_ray(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));

        let expected = (camera.target - camera.position).normalize();
        assert!(ray.direction.abs_diff_eq(expected, 1e-4));
        // 原点付近を通る
        let t = (camera.target - ray.origin).dot(ray.direction);
        assert!(ray.at(t).abs_diff_eq(camera.target, 1e-3));
    }

    #[test]
    fn test_screen_ray_left_is_left() {
        let mut camera = Camera::new(1.0);
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        let ray = camera.screen_ray(Vec2::new(0.0, 300.0), Vec2::new(600.0, 600.0));
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y.abs() < 1e-4);
    }

    #[test]
    fn test_pan_keeps_view_direction() {
        let mut camera = Camera::new(1.0);
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        let before = camera.target - camera.position;

        camera.pan(Vec2::new(100.0, 0.0));
        // 右へドラッグするとカメラは左へ
        assert!((camera.position.x - (-1.0)).abs() < 1e-5);
        assert!((camera.target - camera.position).abs_diff_eq(before, 1e-5));

        camera.pan(Vec2::new(0.0, 100.0));
        assert!((camera.position.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_set_aspect() {
        let mut camera = Camera::new(1.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
