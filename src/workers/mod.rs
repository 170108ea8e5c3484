// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 抓取任务的执行与后台调度
pub mod manager;
pub mod scrape_job_worker;

pub use manager::{JobScheduler, WorkerManager};
pub use scrape_job_worker::{JobOutcome, ProgressCallback, ScrapeJobWorker};
