//! ピボット操作用Gizmo
//! 選択グループのピボット位置に表示し、ドラッグ量からピボットの新しい変換を求める

use glam::{Mat4, Quat, Vec3};
use viewer_core::{Aabb, GizmoConfig, Transform};

use crate::picking::Ray;

/// Gizmoモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl std::str::FromStr for GizmoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "translate" | "move" => Ok(GizmoMode::Translate),
            "rotate" => Ok(GizmoMode::Rotate),
            "scale" => Ok(GizmoMode::Scale),
            other => Err(format!("unknown gizmo mode '{}'", other)),
        }
    }
}

/// Gizmo軸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoAxis {
    #[default]
    None,
    X,
    Y,
    Z,
    XY,
    YZ,
    XZ,
    All,
}

impl GizmoAxis {
    /// 単一軸の方向
    fn direction(self) -> Option<Vec3> {
        match self {
            GizmoAxis::X => Some(Vec3::X),
            GizmoAxis::Y => Some(Vec3::Y),
            GizmoAxis::Z => Some(Vec3::Z),
            _ => None,
        }
    }

    /// 軸方向の成分だけを残すマスク
    fn mask(self) -> Vec3 {
        match self {
            GizmoAxis::X => Vec3::X,
            GizmoAxis::Y => Vec3::Y,
            GizmoAxis::Z => Vec3::Z,
            GizmoAxis::XY => Vec3::new(1.0, 1.0, 0.0),
            GizmoAxis::YZ => Vec3::new(0.0, 1.0, 1.0),
            GizmoAxis::XZ => Vec3::new(1.0, 0.0, 1.0),
            GizmoAxis::All => Vec3::ONE,
            GizmoAxis::None => Vec3::ZERO,
        }
    }
}

impl std::str::FromStr for GizmoAxis {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "x" => GizmoAxis::X,
            "y" => GizmoAxis::Y,
            "z" => GizmoAxis::Z,
            "xy" => GizmoAxis::XY,
            "yz" => GizmoAxis::YZ,
            "xz" => GizmoAxis::XZ,
            "all" => GizmoAxis::All,
            _ => GizmoAxis::None,
        })
    }
}

impl std::fmt::Display for GizmoAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GizmoAxis::None => "none",
            GizmoAxis::X => "x",
            GizmoAxis::Y => "y",
            GizmoAxis::Z => "z",
            GizmoAxis::XY => "xy",
            GizmoAxis::YZ => "yz",
            GizmoAxis::XZ => "xz",
            GizmoAxis::All => "all",
        };
        f.write_str(s)
    }
}

/// Gizmo状態
#[derive(Debug, Clone)]
pub struct GizmoState {
    /// 現在のモード
    pub mode: GizmoMode,
    /// 表示フラグ（選択が空でないとき）
    pub visible: bool,
    /// Gizmo位置（ピボットの平行移動成分）
    pub position: Vec3,
    /// Gizmo回転（ピボットの回転成分）
    pub rotation: Quat,
    /// ホバー中の軸
    pub hovered_axis: GizmoAxis,
    /// 操作中の軸
    pub active_axis: GizmoAxis,
    /// カメラ距離に対する表示サイズ
    pub screen_scale: f32,
}

impl Default for GizmoState {
    fn default() -> Self {
        Self {
            mode: GizmoMode::Translate,
            visible: false,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            hovered_axis: GizmoAxis::None,
            active_axis: GizmoAxis::None,
            screen_scale: 0.15,
        }
    }
}

// ========================================================================
// ヘルパー関数
// ========================================================================

/// レイと平面の交差判定（距離を返す）
fn ray_plane_intersection(ray: &Ray, plane_point: Vec3, plane_normal: Vec3) -> Option<f32> {
    let denom = ray.direction.dot(plane_normal);
    if denom.abs() < 1e-6 {
        return None; // レイと平面が平行
    }

    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    (t >= 0.0).then_some(t)
}

fn ray_plane_intersection_point(ray: &Ray, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    ray_plane_intersection(ray, plane_point, plane_normal).map(|t| ray.at(t))
}

/// レイと有限長の円柱（太くした線分）の交差判定
fn ray_cylinder_intersection(ray: &Ray, start: Vec3, end: Vec3, radius: f32) -> Option<f32> {
    let axis = end - start;
    let axis_len = axis.length();
    if axis_len < 1e-6 {
        return None;
    }
    let axis_dir = axis / axis_len;

    let oc = ray.origin - start;

    // 円柱軸に垂直な成分で二次方程式を解く
    let ray_perp = ray.direction - axis_dir * ray.direction.dot(axis_dir);
    let oc_perp = oc - axis_dir * oc.dot(axis_dir);

    let a = ray_perp.dot(ray_perp);
    if a < 1e-12 {
        return None; // 軸と平行
    }
    let b = 2.0 * ray_perp.dot(oc_perp);
    let c = oc_perp.dot(oc_perp) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)]
        .into_iter()
        .filter(|t| *t >= 0.0)
        .find(|t| {
            let projection = (ray.at(*t) - start).dot(axis_dir);
            (0.0..=axis_len).contains(&projection)
        })
}

/// 近い方を残す
fn nearest(current: Option<(GizmoAxis, f32)>, axis: GizmoAxis, t: Option<f32>) -> Option<(GizmoAxis, f32)> {
    match (current, t) {
        (Some((_, prev)), Some(t)) if t < prev => Some((axis, t)),
        (None, Some(t)) => Some((axis, t)),
        _ => current,
    }
}

impl GizmoState {
    pub fn from_config(config: &GizmoConfig) -> Self {
        Self {
            mode: config.mode.parse().unwrap_or_else(|err| {
                log::warn!("{}, using translate", err);
                GizmoMode::Translate
            }),
            screen_scale: config.screen_scale,
            ..Self::default()
        }
    }

    /// ピボットの位置・回転に合わせる
    pub fn sync_to_pivot(&mut self, pivot: &Mat4, visible: bool) {
        let parts = Transform::from_matrix(pivot);
        self.position = parts.position;
        self.rotation = parts.rotation;
        self.visible = visible;
        if !visible {
            self.hovered_axis = GizmoAxis::None;
            self.active_axis = GizmoAxis::None;
        }
    }

    /// Gizmoスケールを取得（ヒットテスト用）
    pub fn gizmo_scale(&self, camera_position: Vec3) -> f32 {
        (camera_position - self.position).length() * self.screen_scale
    }

    /// レイとGizmo軸のヒットテスト
    pub fn hit_test(&self, ray: &Ray, camera_position: Vec3) -> GizmoAxis {
        if !self.visible {
            return GizmoAxis::None;
        }

        let scale = self.gizmo_scale(camera_position);
        let mut closest = nearest(None, GizmoAxis::All, self.hit_test_center_box(ray, scale));

        match self.mode {
            GizmoMode::Translate | GizmoMode::Scale => {
                for axis in [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z] {
                    closest = nearest(closest, axis, self.hit_test_axis(ray, axis, scale));
                }
                // 平面ハンドルはTranslateのみ
                if self.mode == GizmoMode::Translate {
                    for axis in [GizmoAxis::XY, GizmoAxis::YZ, GizmoAxis::XZ] {
                        closest = nearest(closest, axis, self.hit_test_plane_handle(ray, axis, scale));
                    }
                }
            }
            GizmoMode::Rotate => {
                for axis in [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z] {
                    closest = nearest(closest, axis, self.hit_test_circle(ray, axis, scale));
                }
            }
        }

        closest.map(|(axis, _)| axis).unwrap_or(GizmoAxis::None)
    }

    /// 軸を円柱として扱う
    fn hit_test_axis(&self, ray: &Ray, axis: GizmoAxis, scale: f32) -> Option<f32> {
        let dir = axis.direction()?;
        ray_cylinder_intersection(ray, self.position, self.position + dir * scale, scale * 0.08)
    }

    fn hit_test_center_box(&self, ray: &Ray, scale: f32) -> Option<f32> {
        let aabb = Aabb::from_center_size(self.position, Vec3::splat(scale * 0.24));
        ray.intersect_aabb(&aabb)
    }

    fn hit_test_plane_handle(&self, ray: &Ray, axis: GizmoAxis, scale: f32) -> Option<f32> {
        let (v1, v2, normal) = match axis {
            GizmoAxis::XY => (Vec3::X, Vec3::Y, Vec3::Z),
            GizmoAxis::YZ => (Vec3::Y, Vec3::Z, Vec3::X),
            GizmoAxis::XZ => (Vec3::X, Vec3::Z, Vec3::Y),
            _ => return None,
        };

        let offset = scale * 0.3;
        let size = scale * 0.25;
        let center = self.position + (v1 + v2) * (offset + size * 0.5);

        let t = ray_plane_intersection(ray, center, normal)?;
        let local = ray.at(t) - self.position;
        let handle = offset..=offset + size;

        (handle.contains(&local.dot(v1)) && handle.contains(&local.dot(v2))).then_some(t)
    }

    /// 回転用リング（半径 ± threshold）
    fn hit_test_circle(&self, ray: &Ray, axis: GizmoAxis, scale: f32) -> Option<f32> {
        let normal = axis.direction()?;
        let t = ray_plane_intersection(ray, self.position, normal)?;
        let dist = (ray.at(t) - self.position).length();

        ((dist - scale).abs() < scale * 0.1).then_some(t)
    }

    /// Translateモードのドラッグ移動量を計算
    pub fn calculate_translate_drag(
        &self,
        axis: GizmoAxis,
        ray: &Ray,
        prev_ray: &Ray,
        camera_position: Vec3,
    ) -> Vec3 {
        let plane_normal = self.drag_plane_normal(axis, camera_position);

        let prev_point = ray_plane_intersection_point(prev_ray, self.position, plane_normal);
        let curr_point = ray_plane_intersection_point(ray, self.position, plane_normal);

        match (prev_point, curr_point) {
            // 軸方向成分のみ取り出す
            (Some(prev), Some(curr)) => (curr - prev) * axis.mask(),
            _ => Vec3::ZERO,
        }
    }

    /// Scaleモードのドラッグ量（Gizmoサイズに対する比率）
    pub fn calculate_scale_drag(
        &self,
        axis: GizmoAxis,
        ray: &Ray,
        prev_ray: &Ray,
        camera_position: Vec3,
    ) -> Vec3 {
        let delta = self.calculate_translate_drag(axis, ray, prev_ray, camera_position);
        delta / self.gizmo_scale(camera_position)
    }

    /// Rotateモードのドラッグ回転量を計算
    pub fn calculate_rotate_drag(&self, axis: GizmoAxis, ray: &Ray, prev_ray: &Ray) -> Quat {
        let Some(rotation_axis) = axis.direction() else {
            return Quat::IDENTITY;
        };

        let prev_point = ray_plane_intersection_point(prev_ray, self.position, rotation_axis);
        let curr_point = ray_plane_intersection_point(ray, self.position, rotation_axis);

        let (Some(prev), Some(curr)) = (prev_point, curr_point) else {
            return Quat::IDENTITY;
        };

        let prev_dir = (prev - self.position).normalize_or_zero();
        let curr_dir = (curr - self.position).normalize_or_zero();
        if prev_dir == Vec3::ZERO || curr_dir == Vec3::ZERO {
            return Quat::IDENTITY;
        }

        let angle = prev_dir.dot(curr_dir).clamp(-1.0, 1.0).acos();
        let sign = if prev_dir.cross(curr_dir).dot(rotation_axis) >= 0.0 { 1.0 } else { -1.0 };

        Quat::from_axis_angle(rotation_axis, angle * sign)
    }

    /// ドラッグ1ステップ分をピボットに適用した新しい変換
    pub fn drag_pivot(
        &self,
        axis: GizmoAxis,
        ray: &Ray,
        prev_ray: &Ray,
        camera_position: Vec3,
        pivot: Mat4,
    ) -> Mat4 {
        match self.mode {
            GizmoMode::Translate => {
                let delta = self.calculate_translate_drag(axis, ray, prev_ray, camera_position);
                Mat4::from_translation(delta) * pivot
            }
            GizmoMode::Rotate => {
                // ピボット位置を中心に回す
                let rotation = self.calculate_rotate_drag(axis, ray, prev_ray);
                let center = pivot.w_axis.truncate();
                Mat4::from_translation(center)
                    * Mat4::from_quat(rotation)
                    * Mat4::from_translation(-center)
                    * pivot
            }
            GizmoMode::Scale => {
                let drag = self.calculate_scale_drag(axis, ray, prev_ray, camera_position);
                let factor = if axis == GizmoAxis::All {
                    Vec3::splat(1.0 + (drag.x + drag.y + drag.z) / 3.0)
                } else {
                    Vec3::ONE + drag
                };
                // ピボットのローカル軸でスケール
                pivot * Mat4::from_scale(factor.max(Vec3::splat(0.01)))
            }
        }
    }

    /// ドラッグ用の平面法線を計算
    /// 単一軸では、軸を含む平面のうち視線に垂直に近い方を使う
    fn drag_plane_normal(&self, axis: GizmoAxis, camera_position: Vec3) -> Vec3 {
        let view_dir = (self.position - camera_position).normalize_or_zero();

        match axis {
            GizmoAxis::X if view_dir.y.abs() > view_dir.z.abs() => Vec3::Y,
            GizmoAxis::X => Vec3::Z,
            GizmoAxis::Y if view_dir.x.abs() > view_dir.z.abs() => Vec3::X,
            GizmoAxis::Y => Vec3::Z,
            GizmoAxis::Z if view_dir.x.abs() > view_dir.y.abs() => Vec3::X,
            GizmoAxis::Z => Vec3::Y,
            GizmoAxis::XY => Vec3::Z,
            GizmoAxis::YZ => Vec3::X,
            GizmoAxis::XZ => Vec3::Y,
            GizmoAxis::All => view_dir,
            GizmoAxis::None => Vec3::Y,
        }
    }
}
