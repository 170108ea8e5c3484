// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobUpdate, ScrapeJob};
use crate::domain::repositories::job_repository::JobRepository;
use crate::infrastructure::metrics;
use crate::workers::scrape_job_worker::{
    JobOutcome, ProgressCallback, ScrapeJobWorker, INTERRUPTED_BY_SHUTDOWN,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 外层任务被中止时连带中止内层任务
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// 任务调度特质
///
/// 接收已持久化的任务并在后台执行，调用方不等待任务结束
pub trait JobScheduler: Send + Sync {
    fn schedule(&self, job: ScrapeJob);
}

/// 工作管理器
///
/// 每个抓取任务一个 tokio 任务，同时运行的数量受信号量限制，
/// 等待许可的任务保持 `pending`。任务内的 panic 在边界处捕获并写为 `failed`。
/// 关闭后不会留下停在 `pending` 或 `running` 的任务。
pub struct WorkerManager {
    worker: Arc<ScrapeJobWorker>,
    jobs: Arc<dyn JobRepository>,
    permits: Arc<Semaphore>,
    on_progress: Option<ProgressCallback>,
    handles: Mutex<Vec<(Uuid, AbortHandle)>>,
}

impl WorkerManager {
    pub fn new(
        worker: Arc<ScrapeJobWorker>,
        jobs: Arc<dyn JobRepository>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            worker,
            jobs,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            on_progress: None,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// 为所有任务设置进度回调
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// 在后台启动任务，立即返回
    ///
    /// 返回的句柄在任务结束后给出结果；管理器关闭后未开始或被强制中止的任务
    /// 返回 `None`。
    pub fn spawn_job(&self, job: ScrapeJob) -> JoinHandle<Option<JobOutcome>> {
        let job_id = job.id;
        let worker = self.worker.clone();
        let jobs = self.jobs.clone();
        let permits = self.permits.clone();
        let on_progress = self.on_progress.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!(job_id = %job_id, "Worker manager closed before job started");
                mark_interrupted(jobs.as_ref(), job_id).await;
                return None;
            };

            let inner = tokio::spawn(async move { worker.run(&job, on_progress).await });
            let _guard = AbortOnDrop(inner.abort_handle());

            match inner.await {
                Ok(outcome) => Some(outcome),
                Err(e) if e.is_panic() => {
                    error!(job_id = %job_id, "Scrape job panicked: {}", e);
                    let update = JobUpdate::failed("Scrape job terminated unexpectedly");
                    if let Err(write_err) = jobs.update(job_id, &update).await {
                        error!(job_id = %job_id, "Failed to record job failure: {}", write_err);
                    }
                    metrics::record_job_finished(&JobOutcome::Failed.to_string());
                    Some(JobOutcome::Failed)
                }
                Err(_) => None,
            }
        });

        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|(_, h)| !h.is_finished());
            handles.push((job_id, handle.abort_handle()));
        }
        handle
    }

    /// 关闭管理器
    ///
    /// 停止接收新任务，等待许可的任务直接写为 `failed`；运行中的任务在下一个
    /// 检查点停下并写为 `failed`。`grace` 到期后仍未结束的任务被中止，
    /// 其记录同样写为 `failed`。已终止的任务不受影响。
    pub async fn shutdown(&self, grace: Duration) {
        self.permits.close();
        self.worker.request_stop();

        let tracked = match self.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => return,
        };
        info!("Shutting down {} scrape job task(s)", tracked.len());

        let deadline = Instant::now() + grace;
        while tracked.iter().any(|(_, h)| !h.is_finished()) && Instant::now() < deadline {
            sleep(SHUTDOWN_POLL_INTERVAL).await;
        }

        for (job_id, handle) in &tracked {
            if !handle.is_finished() {
                warn!(job_id = %job_id, "Scrape job did not stop in time, aborting");
                handle.abort();
            }
            mark_interrupted(self.jobs.as_ref(), *job_id).await;
        }
    }
}

/// 把未终止的任务写为 `failed`，终止状态的任务由存储层的守卫保持不变
async fn mark_interrupted(jobs: &dyn JobRepository, job_id: Uuid) {
    if let Err(e) = jobs
        .update(job_id, &JobUpdate::failed(INTERRUPTED_BY_SHUTDOWN))
        .await
    {
        error!(job_id = %job_id, "Failed to record job interruption: {}", e);
    }
}

impl JobScheduler for WorkerManager {
    fn schedule(&self, job: ScrapeJob) {
        info!(job_id = %job.id, "Scheduling scrape job");
        drop(self.spawn_job(job));
    }
}
