use log::{error, info};

use super::instance::ModelInstance;
use crate::components::ModelId;
use crate::error::{Result, SceneError};
use crate::events::{SceneEvent, SubscriptionId, Subscribers};
use crate::math::Mat4;

/// 配置済みモデルの順序付きコレクション
/// 挿入順を保持し、IDの一意性を保証する
#[derive(Debug, Default)]
pub struct SceneRegistry {
    models: Vec<ModelInstance>,
    subscribers: Subscribers<SceneEvent>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// モデルを末尾に追加
    /// 同じIDが既に存在する場合は`DuplicateId`
    pub fn add(&mut self, instance: ModelInstance) -> Result<()> {
        if self.contains(instance.id().as_str()) {
            error!("Rejected duplicate model id '{}'", instance.id());
            return Err(SceneError::DuplicateId(instance.id().to_string()));
        }

        let id = instance.id().clone();
        let index = self.models.len();
        self.models.push(instance);
        info!("Added model '{}' ({} in scene)", id, self.models.len());

        self.subscribers.emit(&SceneEvent::Inserted { id, index });
        Ok(())
    }

    /// モデルを削除
    /// 存在しないIDなら何もせずNone。
    /// 選択からの除外と組にするため、外部からは`Viewport::remove_model`経由で呼ぶ
    pub(crate) fn remove(&mut self, id: &str) -> Option<ModelInstance> {
        let index = self.index_of(id)?;
        let instance = self.models.remove(index);
        info!("Removed model '{}' ({} in scene)", instance.id(), self.models.len());

        self.subscribers.emit(&SceneEvent::Removed {
            id: instance.id().clone(),
            index,
        });
        Some(instance)
    }

    pub fn find(&self, id: &str) -> Option<&ModelInstance> {
        self.models.iter().find(|m| m.id().as_str() == id)
    }

    /// 挿入順の全モデル
    pub fn all(&self) -> &[ModelInstance] {
        &self.models
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModelId> + '_ {
        self.models.iter().map(|m| m.id())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SceneEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// ローカル変換を更新（Selection Setのみが呼ぶ）
    /// 成功時true、存在しないIDならfalse
    pub(crate) fn set_local_transform(&mut self, id: &str, transform: Mat4) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let instance = &mut self.models[index];
        instance.set_local_transform(transform);

        let event = SceneEvent::TransformChanged {
            id: instance.id().clone(),
            transform,
        };
        self.subscribers.emit(&event);
        true
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.models.iter().position(|m| m.id().as_str() == id)
    }
}
