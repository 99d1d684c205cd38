//! Bounded-concurrency execution of a download plan.

use std::{
    collections::BTreeSet,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use playport_assets::{AssetCache, AssetCacheEntry, store};
use playport_core::{AssetId, CancelFlag};
use tokio::{
    sync::{Mutex, Semaphore, mpsc::UnboundedSender},
    task::JoinSet,
};

use crate::{
    error::{DownloadError, FetchError},
    fetcher::AssetFetcher,
    plan::DownloadTask,
};

/// Progress notifications. The executor never blocks on the receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Started { asset_id: AssetId, name: String, index: usize, total: usize },
    Retrying { asset_id: AssetId, url: String },
    Completed { asset_id: AssetId, path: PathBuf, bytes: usize },
    Failed { asset_id: AssetId, message: String },
    Cancelled { remaining: usize },
    Finished { succeeded: usize, failed: usize },
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub succeeded: Vec<AssetId>,
    pub failed: Vec<(AssetId, String)>,
    /// Never started because the run was cancelled.
    pub skipped: Vec<AssetId>,
    pub cancelled: bool,
    pub created_folders: Vec<PathBuf>,
}

impl DownloadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Creates every missing ancestor directory of the task targets, shallowest first.
pub fn prepare_folders(tasks: &[DownloadTask]) -> io::Result<Vec<PathBuf>> {
    let mut needed: BTreeSet<(usize, PathBuf)> = BTreeSet::new();
    for task in tasks {
        for ancestor in task.target.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            needed.insert((ancestor.components().count(), ancestor.to_path_buf()));
        }
    }

    let mut created = Vec::new();
    for (_, dir) in needed {
        if dir.is_dir() {
            continue;
        }
        match std::fs::create_dir(&dir) {
            Ok(()) => created.push(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }

    if !created.is_empty() {
        log::debug!("Created {} download folders", created.len());
    }
    Ok(created)
}

pub struct DownloadExecutor {
    fetcher: Arc<dyn AssetFetcher>,
    max_concurrent: usize,
    cancel: CancelFlag,
    events: Option<UnboundedSender<DownloadEvent>>,
}

impl DownloadExecutor {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, max_concurrent: usize, cancel: CancelFlag) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            cancel,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: UnboundedSender<DownloadEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    /// Runs `tasks` in order with at most `max_concurrent` transfers in flight,
    /// then persists the cache to `cache_path`, also when cancelled.
    pub async fn run(
        &self,
        tasks: Vec<DownloadTask>,
        cache: Arc<Mutex<AssetCache>>,
        cache_path: &Path,
    ) -> DownloadReport {
        let mut report = DownloadReport::default();
        let total = tasks.len();

        match prepare_folders(&tasks) {
            Ok(created) => report.created_folders = created,
            Err(e) => log::error!("Failed to prepare download folders: {}", e),
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut running = JoinSet::new();
        let mut unfinished = BTreeSet::new();
        let mut pending = tasks.into_iter().enumerate();

        for (index, task) in pending.by_ref() {
            if self.cancel.is_cancelled() {
                report.skipped.push(task.asset_id);
                break;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                report.skipped.push(task.asset_id);
                break;
            };

            // Cancellation may have arrived while waiting for a slot.
            if self.cancel.is_cancelled() {
                report.skipped.push(task.asset_id);
                break;
            }

            self.emit(DownloadEvent::Started {
                asset_id: task.asset_id,
                name: task.asset.name.clone(),
                index,
                total,
            });

            let fetcher = self.fetcher.clone();
            let cache = cache.clone();
            let events = self.events.clone();
            let asset_id = task.asset_id;
            unfinished.insert(asset_id);
            running.spawn(async move {
                let _permit = permit;
                (asset_id, download_one(fetcher.as_ref(), task, &cache, events.as_ref()).await)
            });
        }

        report.skipped.extend(pending.map(|(_, task)| task.asset_id));
        if !report.skipped.is_empty() {
            report.cancelled = true;
            log::warn!(
                "Download cancelled, {} tasks not started; waiting for running transfers",
                report.skipped.len()
            );
            self.emit(DownloadEvent::Cancelled {
                remaining: report.skipped.len(),
            });
        }

        while let Some(joined) = running.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("Download task panicked or was aborted: {}", e);
                    continue;
                }
            };
            unfinished.remove(&outcome.0);

            match outcome {
                (asset_id, Ok(path)) => {
                    log::debug!("Asset {} saved to {:?}", asset_id, path);
                    report.succeeded.push(asset_id);
                }
                (asset_id, Err(e)) => {
                    log::error!("Download failed: {}", e);
                    self.emit(DownloadEvent::Failed {
                        asset_id,
                        message: e.to_string(),
                    });
                    report.failed.push((asset_id, e.to_string()));
                }
            }
        }

        // Tasks that never reported back panicked or were aborted.
        for asset_id in unfinished {
            let message = "download task did not complete".to_string();
            self.emit(DownloadEvent::Failed {
                asset_id,
                message: message.clone(),
            });
            report.failed.push((asset_id, message));
        }

        if let Err(e) = cache.lock().await.save(cache_path) {
            log::error!("Failed to save asset cache to {:?}: {}", cache_path, e);
        }

        self.emit(DownloadEvent::Finished {
            succeeded: report.succeeded.len(),
            failed: report.failed.len(),
        });
        log::info!(
            "Downloads finished: {} succeeded, {} failed, {} skipped",
            report.succeeded.len(),
            report.failed.len(),
            report.skipped.len()
        );
        report
    }
}

async fn download_one(
    fetcher: &dyn AssetFetcher,
    task: DownloadTask,
    cache: &Mutex<AssetCache>,
    events: Option<&UnboundedSender<DownloadEvent>>,
) -> Result<PathBuf, DownloadError> {
    let asset_id = task.asset_id;

    let bytes = match fetcher.fetch(&task.url).await {
        Err(FetchError::Status { code: 403, url }) if task.alternate_url.is_some() => {
            let alternate = task.alternate_url.as_deref().unwrap_or_default();
            log::warn!(
                "Asset {} '{}' forbidden at {}, retrying with {}",
                asset_id,
                task.asset.name,
                url,
                alternate
            );
            if let Some(sender) = events {
                let _ = sender.send(DownloadEvent::Retrying {
                    asset_id,
                    url: alternate.to_string(),
                });
            }
            fetcher.fetch(alternate).await
        }
        other => other,
    }
    .map_err(|source| DownloadError::Fetch { asset_id, source })?;

    let target = task.target.clone();
    let write_target = target.clone();
    let size = bytes.len();
    tokio::task::spawn_blocking(move || store::write_atomic(&write_target, &bytes))
        .await
        .map_err(|source| DownloadError::Join { asset_id, source })?
        .map_err(|source| DownloadError::Write {
            asset_id,
            path: target.clone(),
            source,
        })?;

    let now = Utc::now();
    let entry = AssetCacheEntry {
        local_path: target.clone(),
        hash: task.asset.hash.clone(),
        last_modified: task.asset.modified_at.unwrap_or(now),
        file_size: size as u64,
        downloaded_at: now,
        usage_count: task.usage_count,
    };
    cache.lock().await.insert(asset_id, entry);

    log::info!("Downloaded asset {} '{}' ({} bytes)", asset_id, task.asset.name, size);
    if let Some(sender) = events {
        let _ = sender.send(DownloadEvent::Completed {
            asset_id,
            path: target.clone(),
            bytes: size,
        });
    }
    Ok(target)
}
