//! バックグラウンド読み込み
//!
//! 専用スレッドでデコードし、結果はシーンを持つスレッドで取り出してIDを振る

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, error};

use crate::error::{ImportError, Result};
use crate::importer::{CancelToken, ImportedFile, MeshImporter};

/// 読み込み要求の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportTicket(u64);

impl ImportTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct ImportJob {
    ticket: ImportTicket,
    path: PathBuf,
    cancel: CancelToken,
}

/// 完了した読み込み
#[derive(Debug)]
pub struct ImportOutcome {
    pub ticket: ImportTicket,
    pub path: PathBuf,
    pub result: Result<ImportedFile>,
}

pub struct ImportWorker {
    tx: mpsc::Sender<ImportJob>,
    rx: mpsc::Receiver<ImportOutcome>,
    next_ticket: u64,
}

impl ImportWorker {
    pub fn spawn(importer: MeshImporter) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<ImportJob>();
        let (result_tx, result_rx) = mpsc::channel();

        thread::Builder::new()
            .name("mesh-import".to_string())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    let ImportJob { ticket, path, cancel } = job;
                    debug!("Decoding {} (ticket {})", path.display(), ticket.0);
                    let result = if cancel.is_cancelled() {
                        Err(ImportError::Cancelled)
                    } else {
                        importer.load_with_cancel(&path, &cancel)
                    };
                    if result_tx.send(ImportOutcome { ticket, path, result }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|err| {
                error!("Failed to spawn import worker: {err:?}");
                ImportError::Worker(err.to_string())
            })?;

        Ok(Self {
            tx,
            rx: result_rx,
            next_ticket: 1,
        })
    }

    /// 読み込みを要求する。返したトークンで中断できる
    pub fn submit(&mut self, path: impl Into<PathBuf>) -> Result<(ImportTicket, CancelToken)> {
        let ticket = ImportTicket(self.next_ticket);
        self.next_ticket += 1;
        let cancel = CancelToken::new();

        let job = ImportJob {
            ticket,
            path: path.into(),
            cancel: cancel.clone(),
        };
        self.tx
            .send(job)
            .map_err(|_| ImportError::Worker("import worker has stopped".to_string()))?;
        Ok((ticket, cancel))
    }

    /// 完了済みの結果を全て取り出す（ブロックしない）
    pub fn drain(&self) -> Vec<ImportOutcome> {
        let mut results = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            results.push(result);
        }
        results
    }

    /// 次の結果を最大`timeout`待つ
    pub fn wait(&self, timeout: Duration) -> Option<ImportOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl std::fmt::Debug for ImportWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportWorker")
            .field("next_ticket", &self.next_ticket)
            .finish()
    }
}
