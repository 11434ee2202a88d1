//! Selection Set
//!
//! 選択中モデルの集合と、グループ操作用のピボットを管理する。
//!
//! 各メンバーは選択時にピボットからの相対オフセットを記録し、
//! ピボットが動くと `member = pivot * offset` で全メンバーを追従させる。
//! メンバーの増減でピボットを集合の中心へ移すときは、残りのメンバーの
//! オフセットを新しいピボット基準で取り直す（メンバーの位置は変わらない）。

use std::collections::HashMap;

use log::{debug, warn};

use crate::components::ModelId;
use crate::events::{SelectionEvent, SubscriptionId, Subscribers};
use crate::math::{Aabb, Mat4};
use crate::scene::SceneRegistry;

#[derive(Debug)]
pub struct SelectionSet {
    /// 選択順のメンバー（重複なし）
    members: Vec<ModelId>,
    offsets: HashMap<ModelId, Mat4>,
    pivot: Mat4,
    bounds: Option<Aabb>,
    subscribers: Subscribers<SelectionEvent>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            offsets: HashMap::new(),
            pivot: Mat4::IDENTITY,
            bounds: None,
            subscribers: Subscribers::new(),
        }
    }

    /// クリック時の選択切り替え
    ///
    /// 選択済みなら`additive`に関わらず外す。未選択なら、`additive`でない
    /// 場合は既存の選択をクリアしてから追加する
    pub fn toggle(&mut self, registry: &SceneRegistry, id: &str, additive: bool) {
        if self.contains(id) {
            self.remove(registry, id);
            return;
        }
        if !registry.contains(id) {
            warn!("Ignoring selection of unknown model '{}'", id);
            return;
        }
        if !additive {
            self.clear();
        }
        self.add(registry, id);
    }

    /// メンバーを追加
    /// 選択済み、またはレジストリに存在しないIDなら何もせずfalse
    pub fn add(&mut self, registry: &SceneRegistry, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        let Some(instance) = registry.find(id) else {
            warn!("Ignoring selection of unknown model '{}'", id);
            return false;
        };

        let was_visible = self.manipulator_visible();
        let id = instance.id().clone();
        self.members.push(id.clone());
        self.update_bounds(registry);
        self.recenter_pivot(registry);
        debug!("Selected '{}' ({} selected)", id, self.members.len());

        // 通知はピボットとオフセットが確定してから
        self.subscribers.emit(&SelectionEvent::MemberAdded(id));
        self.subscribers.emit(&SelectionEvent::BoundsChanged(self.bounds));
        self.subscribers.emit(&SelectionEvent::PivotChanged(self.pivot));
        if !was_visible {
            self.subscribers
                .emit(&SelectionEvent::ManipulatorVisibilityChanged(true));
        }
        true
    }

    /// メンバーを外す
    /// 未選択なら何もせずfalse
    pub fn remove(&mut self, registry: &SceneRegistry, id: &str) -> bool {
        let Some(index) = self.members.iter().position(|m| m.as_str() == id) else {
            return false;
        };

        let id = self.members.remove(index);
        self.offsets.remove(&id);
        self.update_bounds(registry);
        if self.members.is_empty() {
            self.pivot = Mat4::IDENTITY;
        } else {
            self.recenter_pivot(registry);
        }
        debug!("Deselected '{}' ({} selected)", id, self.members.len());

        self.subscribers.emit(&SelectionEvent::MemberRemoved(id));
        self.subscribers.emit(&SelectionEvent::BoundsChanged(self.bounds));
        self.subscribers.emit(&SelectionEvent::PivotChanged(self.pivot));
        if self.members.is_empty() {
            self.subscribers
                .emit(&SelectionEvent::ManipulatorVisibilityChanged(false));
        }
        true
    }

    /// 全メンバーを外す（バウンディングボックスの再計算は一度だけ）
    pub fn clear(&mut self) {
        if self.members.is_empty() {
            return;
        }

        let removed = std::mem::take(&mut self.members);
        self.offsets.clear();
        self.bounds = None;
        self.pivot = Mat4::IDENTITY;
        debug!("Cleared selection of {} models", removed.len());

        for id in removed {
            self.subscribers.emit(&SelectionEvent::MemberRemoved(id));
        }
        self.subscribers.emit(&SelectionEvent::BoundsChanged(None));
        self.subscribers.emit(&SelectionEvent::PivotChanged(self.pivot));
        self.subscribers
            .emit(&SelectionEvent::ManipulatorVisibilityChanged(false));
    }

    /// ピボットの新しい変換を全メンバーへ適用する
    ///
    /// 各メンバーの変換は `pivot * offset` になる。オフセットは変更しないため、
    /// 同じ変換を繰り返し適用しても結果は変わらない。選択が空なら何もしない
    pub fn apply_pivot_transform(&mut self, registry: &mut SceneRegistry, pivot: Mat4) {
        if self.members.is_empty() {
            return;
        }

        for id in &self.members {
            let Some(offset) = self.offsets.get(id) else {
                continue;
            };
            if !registry.set_local_transform(id.as_str(), pivot * *offset) {
                warn!("Selected model '{}' is no longer in the scene", id);
            }
        }

        self.pivot = pivot;
        self.update_bounds(registry);
        self.subscribers.emit(&SelectionEvent::PivotChanged(pivot));
        self.subscribers.emit(&SelectionEvent::BoundsChanged(self.bounds));
    }

    /// レジストリから消えたメンバーを外し、バウンディングボックスを再計算する
    pub fn refresh(&mut self, registry: &SceneRegistry) {
        let stale: Vec<ModelId> = self
            .members
            .iter()
            .filter(|id| !registry.contains(id.as_str()))
            .cloned()
            .collect();

        for id in stale {
            warn!("Dropping stale selection of '{}'", id);
            self.remove(registry, id.as_str());
        }
        self.update_bounds(registry);
        self.subscribers.emit(&SelectionEvent::BoundsChanged(self.bounds));
    }

    /// 選択順のメンバー
    pub fn members(&self) -> &[ModelId] {
        &self.members
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m.as_str() == id)
    }

    /// モデルごとの選択表示フラグ
    pub fn is_selected(&self, id: &str) -> bool {
        self.contains(id)
    }

    pub fn pivot(&self) -> Mat4 {
        self.pivot
    }

    /// 選択中の全モデルのワールド空間バウンディングボックスの和
    pub fn aggregate_bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Gizmoを表示するか（メンバーが一つ以上）
    pub fn manipulator_visible(&self) -> bool {
        !self.members.is_empty()
    }

    /// ピボット座標系でのメンバーの相対オフセット
    pub fn relative_offset(&self, id: &str) -> Option<Mat4> {
        self.offsets.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SelectionEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn update_bounds(&mut self, registry: &SceneRegistry) {
        let bounds = Aabb::union_all(
            self.members
                .iter()
                .filter_map(|id| registry.find(id.as_str()))
                .map(|instance| instance.world_bounds()),
        );
        self.bounds = bounds;
    }

    /// ピボットを集合の中心へ移し、全メンバーのオフセットを取り直す
    fn recenter_pivot(&mut self, registry: &SceneRegistry) {
        let Some(bounds) = self.bounds else {
            return;
        };

        self.pivot = Mat4::from_translation(bounds.center());
        let inverse = self.pivot.inverse();

        self.offsets.clear();
        for id in &self.members {
            if let Some(instance) = registry.find(id.as_str()) {
                self.offsets
                    .insert(id.clone(), inverse * instance.local_transform());
            }
        }

        debug!("Pivot moved to {:?}", bounds.center());
    }
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Material;
    use crate::math::{Quat, Vec3};
    use crate::mesh::Mesh;
    use crate::scene::ModelInstance;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn cube_at(id: &str, position: Vec3) -> ModelInstance {
        ModelInstance::new(
            id,
            Mesh::cube(),
            Material::default(),
            Mat4::from_translation(position),
        )
    }

    fn scene() -> SceneRegistry {
        let mut registry = SceneRegistry::new();
        registry.add(cube_at("a", Vec3::ZERO)).unwrap();
        registry.add(cube_at("b", Vec3::new(10.0, 0.0, 0.0))).unwrap();
        registry.add(cube_at("c", Vec3::new(0.0, 0.0, -4.0))).unwrap();
        registry
    }

    fn transform_of(registry: &SceneRegistry, id: &str) -> Mat4 {
        registry.find(id).unwrap().local_transform()
    }

    #[test]
    fn test_toggle_single_member_off() {
        let registry = scene();
        let mut selection = SelectionSet::new();

        selection.toggle(&registry, "a", false);
        assert_eq!(selection.members(), &[ModelId::new("a")]);

        selection.toggle(&registry, "a", false);
        assert!(selection.is_empty());
        assert!(selection.aggregate_bounds().is_none());
        assert!(!selection.manipulator_visible());
    }

    #[test]
    fn test_toggle_replaces_unless_additive() {
        let registry = scene();
        let mut selection = SelectionSet::new();

        selection.toggle(&registry, "a", false);
        selection.toggle(&registry, "b", false);
        assert_eq!(selection.members(), &[ModelId::new("b")]);

        selection.toggle(&registry, "c", true);
        assert_eq!(selection.members(), &[ModelId::new("b"), ModelId::new("c")]);

        // 選択済みはadditiveでも外れる
        selection.toggle(&registry, "b", true);
        assert_eq!(selection.members(), &[ModelId::new("c")]);
    }

    #[test]
    fn test_add_unknown_or_duplicate_is_noop() {
        let registry = scene();
        let mut selection = SelectionSet::new();

        assert!(!selection.add(&registry, "missing"));
        assert!(selection.add(&registry, "a"));
        assert!(!selection.add(&registry, "a"));
        assert_eq!(selection.len(), 1);

        // 未知のIDへのtoggleは既存の選択を壊さない
        selection.toggle(&registry, "missing", false);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        assert!(!selection.remove(&registry, "b"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_pivot_at_aggregate_center() {
        let registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        let bounds = selection.aggregate_bounds().unwrap();
        assert!(bounds.abs_diff_eq(
            &Aabb::new(Vec3::splat(-0.5), Vec3::new(10.5, 0.5, 0.5)),
            1e-5
        ));
        let expected = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        assert!(selection.pivot().abs_diff_eq(expected, 1e-5));
        assert!(selection.manipulator_visible());
        assert!(selection.is_selected("b"));
        assert!(!selection.is_selected("c"));
    }

    #[test]
    fn test_bounds_order_independent() {
        let registry = scene();

        let mut forward = SelectionSet::new();
        for id in ["a", "b", "c"] {
            forward.add(&registry, id);
        }
        let mut backward = SelectionSet::new();
        for id in ["c", "b", "a"] {
            backward.add(&registry, id);
        }

        let expected = Aabb::union_all(registry.all().iter().map(|m| m.world_bounds())).unwrap();
        assert!(forward.aggregate_bounds().unwrap().abs_diff_eq(&expected, 1e-5));
        assert!(backward.aggregate_bounds().unwrap().abs_diff_eq(&expected, 1e-5));
    }

    #[test]
    fn test_bounds_use_transformed_geometry() {
        let mut registry = SceneRegistry::new();
        let rotated = Mat4::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_4),
            Vec3::new(3.0, 0.0, 0.0),
        );
        registry
            .add(ModelInstance::new("r", Mesh::cube(), Material::default(), rotated))
            .unwrap();

        let mut selection = SelectionSet::new();
        selection.add(&registry, "r");

        let bounds = selection.aggregate_bounds().unwrap();
        let half_diagonal = 0.5 * std::f32::consts::SQRT_2;
        assert!((bounds.max.x - (3.0 + half_diagonal)).abs() < 1e-5);
        assert!((bounds.max.y - half_diagonal).abs() < 1e-5);
    }

    #[test]
    fn test_apply_moves_group() {
        let mut registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        // ピボット(5,0,0)を(5,5,0)へ
        let moved = Mat4::from_translation(Vec3::new(5.0, 5.0, 0.0));
        selection.apply_pivot_transform(&mut registry, moved);

        assert!(transform_of(&registry, "a")
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)), 1e-5));
        assert!(transform_of(&registry, "b")
            .abs_diff_eq(Mat4::from_translation(Vec3::new(10.0, 5.0, 0.0)), 1e-5));
        // 非選択モデルは動かない
        assert!(transform_of(&registry, "c")
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 0.0, -4.0)), 1e-6));

        assert_eq!(selection.pivot(), moved);
        assert!(selection
            .aggregate_bounds()
            .unwrap()
            .center()
            .abs_diff_eq(Vec3::new(5.0, 5.0, 0.0), 1e-5));
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        let pivot = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(1.0, 2.0, 3.0),
        );
        selection.apply_pivot_transform(&mut registry, pivot);
        let first: Vec<Mat4> = registry.all().iter().map(|m| m.local_transform()).collect();

        selection.apply_pivot_transform(&mut registry, pivot);
        let second: Vec<Mat4> = registry.all().iter().map(|m| m.local_transform()).collect();

        for (a, b) in first.iter().zip(&second) {
            assert!(a.abs_diff_eq(*b, 1e-5));
        }
    }

    #[test]
    fn test_rotation_about_pivot() {
        let mut registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        // (5,0,0)を中心にZ軸回りで180度
        let pivot = Mat4::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::PI),
            Vec3::new(5.0, 0.0, 0.0),
        );
        selection.apply_pivot_transform(&mut registry, pivot);

        let a = transform_of(&registry, "a").transform_point3(Vec3::ZERO);
        let b = transform_of(&registry, "b").transform_point3(Vec3::ZERO);
        assert!(a.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
        assert!(b.abs_diff_eq(Vec3::ZERO, 1e-4));
    }

    #[test]
    fn test_membership_change_keeps_members_in_place() {
        let mut registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        let rotated = Mat4::from_rotation_translation(
            Quat::from_rotation_y(1.0),
            Vec3::new(5.0, 1.0, 0.0),
        );
        selection.apply_pivot_transform(&mut registry, rotated);
        let before_a = transform_of(&registry, "a");
        let before_b = transform_of(&registry, "b");

        // ピボットが中心に戻っても、現在のピボットを再適用して位置が跳ばないこと
        selection.add(&registry, "c");
        let current = selection.pivot();
        selection.apply_pivot_transform(&mut registry, current);
        assert!(transform_of(&registry, "a").abs_diff_eq(before_a, 1e-4));
        assert!(transform_of(&registry, "b").abs_diff_eq(before_b, 1e-4));

        selection.remove(&registry, "c");
        let current = selection.pivot();
        selection.apply_pivot_transform(&mut registry, current);
        assert!(transform_of(&registry, "a").abs_diff_eq(before_a, 1e-4));
        assert!(transform_of(&registry, "b").abs_diff_eq(before_b, 1e-4));
    }

    #[test]
    fn test_relative_offset_maps_pivot_to_member() {
        let registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        for id in ["a", "b"] {
            let offset = selection.relative_offset(id).unwrap();
            assert!((selection.pivot() * offset).abs_diff_eq(transform_of(&registry, id), 1e-5));
        }
        assert!(selection.relative_offset("c").is_none());
    }

    #[test]
    fn test_apply_on_empty_selection_is_noop() {
        let mut registry = scene();
        let mut selection = SelectionSet::new();
        let before: Vec<Mat4> = registry.all().iter().map(|m| m.local_transform()).collect();

        selection.apply_pivot_transform(&mut registry, Mat4::from_translation(Vec3::ONE));

        let after: Vec<Mat4> = registry.all().iter().map(|m| m.local_transform()).collect();
        assert_eq!(before, after);
        assert_eq!(selection.pivot(), Mat4::IDENTITY);
    }

    #[test]
    fn test_clear() {
        let registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        selection.clear();
        assert!(selection.is_empty());
        assert!(selection.aggregate_bounds().is_none());
        assert!(selection.relative_offset("a").is_none());
        assert!(!selection.manipulator_visible());
    }

    #[test]
    fn test_refresh_drops_removed_models() {
        let mut registry = scene();
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        selection.add(&registry, "b");

        registry.remove("b");
        selection.refresh(&registry);

        assert_eq!(selection.members(), &[ModelId::new("a")]);
        assert!(selection
            .aggregate_bounds()
            .unwrap()
            .abs_diff_eq(&registry.find("a").unwrap().world_bounds(), 1e-6));
    }

    #[test]
    fn test_add_events_carry_settled_state() {
        let registry = scene();
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut selection = SelectionSet::new();
        selection.add(&registry, "a");
        let sink = events.clone();
        selection.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        selection.add(&registry, "b");

        // 二つ目の追加では表示状態は変わらない
        assert_eq!(
            *events.borrow(),
            vec![
                SelectionEvent::MemberAdded("b".into()),
                SelectionEvent::BoundsChanged(selection.aggregate_bounds()),
                SelectionEvent::PivotChanged(selection.pivot()),
            ]
        );
        let center = selection.aggregate_bounds().unwrap().center();
        assert!(selection.pivot().w_axis.truncate().abs_diff_eq(center, 1e-5));
        assert!(selection.relative_offset("a").is_some());
        assert!(selection.relative_offset("b").is_some());
    }

    #[test]
    fn test_events() {
        let registry = scene();
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut selection = SelectionSet::new();
        let sink = events.clone();
        selection.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        selection.add(&registry, "a");
        selection.remove(&registry, "a");

        let bounds = registry.find("a").unwrap().world_bounds();
        assert_eq!(
            *events.borrow(),
            vec![
                SelectionEvent::MemberAdded("a".into()),
                SelectionEvent::BoundsChanged(Some(bounds)),
                SelectionEvent::PivotChanged(Mat4::IDENTITY),
                SelectionEvent::ManipulatorVisibilityChanged(true),
                SelectionEvent::MemberRemoved("a".into()),
                SelectionEvent::BoundsChanged(None),
                SelectionEvent::PivotChanged(Mat4::IDENTITY),
                SelectionEvent::ManipulatorVisibilityChanged(false),
            ]
        );
    }
}
