use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use log::{debug, info, warn};
use viewer_core::{Aabb, ModelId, ViewerConfig, Viewport};
use viewer_import::{CancelToken, ImportTicket, ImportWorker, ImportedFile, MeshImporter};
use viewer_input::{
    pick_scene, Camera, GizmoAxis, GizmoMode, GizmoState, HitResolver, PickHit, Ray,
};

use crate::error::Result;

/// バックグラウンド読み込みの結果
#[derive(Debug)]
pub struct ImportReport {
    pub ticket: ImportTicket,
    pub path: PathBuf,
    pub result: Result<Vec<ModelId>>,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    axis: GizmoAxis,
    prev_ray: Ray,
}

#[derive(Debug)]
pub struct ViewerSession {
    config: ViewerConfig,
    viewport: Viewport,
    importer: MeshImporter,
    worker: ImportWorker,
    pending: HashMap<ImportTicket, CancelToken>,
    camera: Camera,
    gizmo: GizmoState,
    drag: Option<DragState>,
    show_bounding_box: bool,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let importer = MeshImporter::from_config(&config.import);
        let worker = ImportWorker::spawn(importer.clone())?;

        Ok(Self {
            viewport: Viewport::new(),
            importer,
            worker,
            pending: HashMap::new(),
            camera: Camera::from_config(&config.camera, 1.0),
            gizmo: GizmoState::from_config(&config.gizmo),
            drag: None,
            show_bounding_box: config.selection.show_bounding_box,
            config,
        })
    }

    /// ファイルを読み込んでシーンに追加する（ブロッキング）
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<ModelId>> {
        let path = path.as_ref();
        let models = self.importer.import(path, self.viewport.registry())?;
        let ids: Vec<ModelId> = models.iter().map(|model| model.id().clone()).collect();
        self.viewport.insert_models(models)?;

        info!("Imported {} models from {}", ids.len(), path.display());
        Ok(ids)
    }

    /// バックグラウンドでの読み込みを要求する
    pub fn request_import(&mut self, path: impl Into<PathBuf>) -> Result<ImportTicket> {
        let (ticket, cancel) = self.worker.submit(path)?;
        self.pending.insert(ticket, cancel);
        Ok(ticket)
    }

    /// 未完了の読み込みを中断する。該当する要求がなければ`false`
    pub fn cancel_import(&mut self, ticket: ImportTicket) -> bool {
        match self.pending.get(&ticket) {
            Some(cancel) => {
                cancel.cancel();
                debug!("Cancel requested for import ticket {}", ticket.value());
                true
            }
            None => false,
        }
    }

    pub fn pending_imports(&self) -> usize {
        self.pending.len()
    }

    /// 完了した読み込みをシーンに反映する
    ///
    /// IDの割り当てと追加はこの呼び出し元のスレッドで行う
    pub fn poll_imports(&mut self) -> Vec<ImportReport> {
        let mut reports = Vec::new();
        for outcome in self.worker.drain() {
            self.pending.remove(&outcome.ticket);
            let result = self.insert_imported(outcome.result);

            match &result {
                Ok(ids) => info!("Imported {} models from {}", ids.len(), outcome.path.display()),
                Err(err) => warn!("Import of {} failed: {}", outcome.path.display(), err),
            }
            reports.push(ImportReport {
                ticket: outcome.ticket,
                path: outcome.path,
                result,
            });
        }
        reports
    }

    /// ポインタ押下。Gizmoに当たればドラッグ開始、それ以外はピッキング
    pub fn pointer_down(&mut self, screen: Vec2, viewport_size: Vec2, shift: bool) {
        let ray = self.ray_at(screen, viewport_size);

        let axis = self.gizmo.hit_test(&ray, self.camera.position);
        if axis != GizmoAxis::None {
            debug!("Gizmo drag started on {}", axis);
            self.gizmo.active_axis = axis;
            self.drag = Some(DragState { axis, prev_ray: ray });
            return;
        }

        let hits = pick_scene(&ray, self.viewport.registry());
        self.handle_pick(&hits, shift);
    }

    /// ピック結果で選択を更新する
    ///
    /// ヒットなしなら選択解除。ヘルパーにだけ当たった場合は何もしない
    pub fn handle_pick(&mut self, hits: &[PickHit], shift: bool) {
        if hits.is_empty() {
            self.viewport.clear_selection();
        } else if let Some(id) =
            HitResolver::resolve(hits, self.viewport.registry()).map(|model| model.id().clone())
        {
            self.viewport.select(id.as_str(), shift);
        }
        self.sync_gizmo();
    }

    /// ポインタ移動。ドラッグ中ならピボットを動かし選択全体に反映する
    pub fn pointer_move(&mut self, screen: Vec2, viewport_size: Vec2) {
        let ray = self.ray_at(screen, viewport_size);

        let Some(drag) = self.drag.as_mut() else {
            self.gizmo.hovered_axis = self.gizmo.hit_test(&ray, self.camera.position);
            return;
        };

        let pivot = self.gizmo.drag_pivot(
            drag.axis,
            &ray,
            &drag.prev_ray,
            self.camera.position,
            self.viewport.selection().pivot(),
        );
        drag.prev_ray = ray;

        self.viewport.apply_pivot_transform(pivot);
        self.sync_gizmo();
    }

    pub fn pointer_up(&mut self) {
        if self.drag.take().is_some() {
            debug!("Gizmo drag finished");
        }
        self.gizmo.active_axis = GizmoAxis::None;
    }

    /// 中ボタンドラッグによるカメラ移動
    pub fn pan_camera(&mut self, delta: Vec2) {
        self.camera.pan(delta);
    }

    /// 選択中のモデルを削除する
    pub fn delete_selected(&mut self) -> Vec<ModelId> {
        self.drag = None;
        let removed = self.viewport.delete_selected();
        if !removed.is_empty() {
            info!("Deleted {} models", removed.len());
        }
        self.sync_gizmo();
        removed
    }

    pub fn set_gizmo_mode(&mut self, mode: GizmoMode) {
        self.gizmo.mode = mode;
    }

    pub fn set_show_bounding_box(&mut self, show: bool) {
        self.show_bounding_box = show;
    }

    /// 表示すべき選択範囲のバウンディングボックス
    pub fn bounding_box_overlay(&self) -> Option<Aabb> {
        if self.show_bounding_box {
            self.viewport.selection_bounds()
        } else {
            None
        }
    }

    /// 選択中のモデルなら強調表示色を返す
    pub fn highlight_color(&self, id: &str) -> Option<&str> {
        self.viewport
            .selection()
            .is_selected(id)
            .then_some(self.config.selection.highlight_color.as_str())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn gizmo(&self) -> &GizmoState {
        &self.gizmo
    }

    fn ray_at(&mut self, screen: Vec2, viewport_size: Vec2) -> Ray {
        if viewport_size.y > 0.0 {
            self.camera.set_aspect(viewport_size.x / viewport_size.y);
        }
        self.camera.screen_ray(screen, viewport_size)
    }

    fn insert_imported(&mut self, loaded: viewer_import::Result<ImportedFile>) -> Result<Vec<ModelId>> {
        let models = loaded?.into_instances(self.viewport.registry());
        let ids: Vec<ModelId> = models.iter().map(|model| model.id().clone()).collect();
        self.viewport.insert_models(models)?;
        Ok(ids)
    }

    fn sync_gizmo(&mut self) {
        let selection = self.viewport.selection();
        self.gizmo
            .sync_to_pivot(&selection.pivot(), selection.manipulator_visible());
    }
}
