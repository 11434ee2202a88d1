//! Viewport
//!
//! Scene RegistryとSelection Setを一組で所有し、両者の整合性を保つ

use std::collections::HashSet;

use log::{error, info};

use crate::components::ModelId;
use crate::error::{Result, SceneError};
use crate::events::{SceneEvent, SubscriptionId};
use crate::math::{Aabb, Mat4};
use crate::scene::{ModelInstance, SceneRegistry};
use crate::selection::SelectionSet;

#[derive(Debug, Default)]
pub struct Viewport {
    registry: SceneRegistry,
    selection: SelectionSet,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// モデルをまとめて追加する
    ///
    /// 全IDを先に検査し、一つでも重複があれば何も追加しない
    pub fn insert_models(&mut self, models: Vec<ModelInstance>) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for model in &models {
            let id = model.id().as_str();
            if self.registry.contains(id) || !seen.insert(id) {
                error!("Import batch rejected: duplicate model id '{}'", id);
                return Err(SceneError::DuplicateId(id.to_string()));
            }
        }

        let count = models.len();
        for model in models {
            self.registry.add(model)?;
        }
        info!("Inserted {} models ({} in scene)", count, self.registry.len());
        Ok(())
    }

    /// モデルを削除する。選択中なら先に選択から外す
    pub fn remove_model(&mut self, id: &str) -> Option<ModelInstance> {
        self.selection.remove(&self.registry, id);
        self.registry.remove(id)
    }

    /// 選択中のモデルを全て削除し、削除したIDを返す
    pub fn delete_selected(&mut self) -> Vec<ModelId> {
        let targets: Vec<ModelId> = self.selection.members().to_vec();
        self.selection.clear();

        targets
            .into_iter()
            .filter(|id| self.registry.remove(id.as_str()).is_some())
            .collect()
    }

    pub fn select(&mut self, id: &str, additive: bool) {
        self.selection.toggle(&self.registry, id, additive);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn apply_pivot_transform(&mut self, pivot: Mat4) {
        self.selection.apply_pivot_transform(&mut self.registry, pivot);
    }

    pub fn selection_bounds(&self) -> Option<Aabb> {
        self.selection.aggregate_bounds()
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// シーンの変更通知を購読する
    ///
    /// レジストリへの可変参照は渡さない。追加と削除はこの型のメソッドに限る
    pub fn subscribe_scene(&mut self, callback: impl FnMut(&SceneEvent) + 'static) -> SubscriptionId {
        self.registry.subscribe(callback)
    }

    pub fn unsubscribe_scene(&mut self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Material;
    use crate::math::Vec3;
    use crate::mesh::Mesh;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn cube_at(id: &str, x: f32) -> ModelInstance {
        ModelInstance::new(
            id,
            Mesh::cube(),
            Material::default(),
            Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
        )
    }

    #[test]
    fn test_insert_batch_all_or_nothing() {
        let mut viewport = Viewport::new();
        viewport.insert_models(vec![cube_at("a", 0.0)]).unwrap();

        let result = viewport.insert_models(vec![cube_at("b", 1.0), cube_at("a", 2.0)]);
        assert!(matches!(result, Err(SceneError::DuplicateId(_))));
        assert_eq!(viewport.registry().len(), 1);

        let result = viewport.insert_models(vec![cube_at("c", 1.0), cube_at("c", 2.0)]);
        assert!(result.is_err());
        assert_eq!(viewport.registry().len(), 1);
    }

    #[test]
    fn test_remove_evicts_from_selection() {
        let mut viewport = Viewport::new();
        viewport
            .insert_models(vec![cube_at("a", 0.0), cube_at("b", 4.0)])
            .unwrap();
        viewport.select("a", false);
        viewport.select("b", true);

        assert!(viewport.remove_model("a").is_some());
        assert_eq!(viewport.selection().members(), &[ModelId::new("b")]);
        let bounds = viewport.selection_bounds().unwrap();
        assert!(bounds.center().abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_delete_selected() {
        let mut viewport = Viewport::new();
        viewport
            .insert_models(vec![cube_at("a", 0.0), cube_at("b", 4.0), cube_at("c", 8.0)])
            .unwrap();
        viewport.select("a", false);
        viewport.select("c", true);

        let deleted = viewport.delete_selected();
        assert_eq!(deleted, vec![ModelId::new("a"), ModelId::new("c")]);
        assert_eq!(viewport.registry().len(), 1);
        assert!(viewport.selection().is_empty());
        assert!(viewport.selection_bounds().is_none());
    }

    #[test]
    fn test_every_removal_path_evicts_selection() {
        let mut viewport = Viewport::new();
        viewport
            .insert_models(vec![cube_at("a", 0.0), cube_at("b", 4.0), cube_at("c", 8.0)])
            .unwrap();
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = removed.clone();
        viewport.subscribe_scene(move |event| {
            if let SceneEvent::Removed { id, .. } = event {
                sink.borrow_mut().push(id.clone());
            }
        });

        viewport.select("a", false);
        viewport.select("b", true);
        viewport.remove_model("a");
        assert!(!viewport.selection().contains("a"));
        assert!(viewport.selection().manipulator_visible());
        let bounds = viewport.selection_bounds().unwrap();
        assert!(bounds.center().abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5));

        viewport.delete_selected();
        assert!(viewport.selection().is_empty());
        assert!(!viewport.selection().manipulator_visible());
        assert!(viewport.selection_bounds().is_none());

        // 未選択のモデルの削除は選択に影響しない
        viewport.select("c", false);
        assert!(viewport.remove_model("missing").is_none());
        assert_eq!(viewport.selection().members(), &[ModelId::new("c")]);

        assert_eq!(*removed.borrow(), vec![ModelId::new("a"), ModelId::new("b")]);
    }

    #[test]
    fn test_group_move() {
        let mut viewport = Viewport::new();
        viewport
            .insert_models(vec![cube_at("a", 0.0), cube_at("b", 4.0)])
            .unwrap();
        viewport.select("a", false);
        viewport.select("b", true);

        let pivot = viewport.selection().pivot() * Mat4::from_translation(Vec3::Y);
        viewport.apply_pivot_transform(pivot);

        let b = viewport.registry().find("b").unwrap().local_transform();
        assert!(b.abs_diff_eq(Mat4::from_translation(Vec3::new(4.0, 1.0, 0.0)), 1e-5));
    }
}
