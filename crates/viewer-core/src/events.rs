//! 変更通知モジュール
//!
//! Scene RegistryとSelection Setの変更をコールバックで購読する

use crate::components::ModelId;
use crate::math::{Aabb, Mat4};

/// 購読ID
pub type SubscriptionId = u32;

/// Scene Registryの変更イベント
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// `index`の位置にモデルが追加された
    Inserted { id: ModelId, index: usize },
    /// `index`の位置にあったモデルが削除された
    Removed { id: ModelId, index: usize },
    /// ローカル変換が更新された
    TransformChanged { id: ModelId, transform: Mat4 },
}

/// Selection Setの変更イベント
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    MemberAdded(ModelId),
    MemberRemoved(ModelId),
    PivotChanged(Mat4),
    BoundsChanged(Option<Aabb>),
    ManipulatorVisibilityChanged(bool),
}

type Callback<E> = Box<dyn FnMut(&E)>;

/// 購読者リスト
/// 登録順にコールバックを呼び出す
pub struct Subscribers<E> {
    callbacks: Vec<(SubscriptionId, Callback<E>)>,
    next_id: SubscriptionId,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// 成功時true、未登録のIDならfalse
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sid, _)| *sid != id);
        self.callbacks.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}
