// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const LISTINGS_SCRAPED: &str = "leadscout_listings_scraped_total";
pub const AGENTS_CREATED: &str = "leadscout_agents_created_total";
pub const ITEMS_SKIPPED: &str = "leadscout_items_skipped_total";
pub const JOBS_FINISHED: &str = "leadscout_jobs_finished_total";
pub const ITEMS_PROCESSED: &str = "leadscout_items_processed_total";

/// 启动 Prometheus 导出器
///
/// 未启用或地址无效时只记录日志，不影响服务启动。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!(LISTINGS_SCRAPED, "Listings newly stored by scrape jobs");
    describe_counter!(AGENTS_CREATED, "Agents created by identity resolution");
    describe_counter!(ITEMS_SKIPPED, "Detail pages skipped after a navigation or storage error");
    describe_counter!(JOBS_FINISHED, "Scrape jobs that reached a terminal state");
    describe_counter!(ITEMS_PROCESSED, "Detail pages counted towards job progress");

    info!("Metrics exporter listening on {}", addr);
}

pub fn record_listing_scraped() {
    counter!(LISTINGS_SCRAPED).increment(1);
}

pub fn record_agent_created() {
    counter!(AGENTS_CREATED).increment(1);
}

pub fn record_item_skipped() {
    counter!(ITEMS_SKIPPED).increment(1);
}

pub fn record_job_finished(status: &str) {
    counter!(JOBS_FINISHED, "status" => status.to_string()).increment(1);
}

pub fn record_item_processed() {
    counter!(ITEMS_PROCESSED).increment(1);
}
