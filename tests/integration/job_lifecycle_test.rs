// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    detail_page, detail_url, index_page, index_url, AgentInfo, CancellingJobRepository,
    TestHarness,
};
use leadscout::config::settings::IdentitySettings;
use leadscout::domain::models::agent::AgentFilter;
use leadscout::domain::models::scrape_job::JobStatus;
use leadscout::domain::repositories::job_repository::JobRepository;
use leadscout::domain::repositories::result_repository::ResultRepository;
use leadscout::workers::scrape_job_worker::INTERRUPTED_BY_SHUTDOWN;
use leadscout::workers::{JobOutcome, ProgressCallback, WorkerManager};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn adebayo_flat_page() -> String {
    detail_page(
        "3 Bedroom Flat",
        "Flat",
        &AgentInfo {
            name: "Adebayo Homes",
            phone: Some("08011112222"),
            ..Default::default()
        },
    )
}

fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<(u32, u32, u32)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let callback: ProgressCallback = Arc::new(move |progress, total, leads| {
        recorded.lock().unwrap().push((progress, total, leads));
    });
    (callback, calls)
}

async fn agent_count(harness: &TestHarness) -> usize {
    harness
        .results
        .list_agents(&AgentFilter::default())
        .await
        .expect("Failed to list agents")
        .len()
}

#[tokio::test]
async fn test_single_page_run_completes_with_partial_progress() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    let job = harness.create_job(1).await;

    let (callback, calls) = recording_callback();

    let outcome = harness.worker().run(&job, Some(callback)).await;
    assert_eq!(outcome, JobOutcome::Completed);

    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total, 20);
    assert_eq!(job.progress, 3);
    assert_eq!(job.leads_found, 2);
    assert!(job.error.is_none());
    assert!(job.completed_at.is_some());

    assert_eq!(
        *calls.lock().unwrap(),
        vec![(1, 20, 1), (2, 20, 2), (3, 20, 2)]
    );
    assert_eq!(harness.site.launches(), 1);
    assert_eq!(harness.site.closes(), 1);
    assert_eq!(agent_count(&harness).await, 3);

    let leads = harness
        .results
        .list_agents(&AgentFilter {
            leads_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    let mut names: Vec<_> = leads.iter().map(|a| a.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Adebayo Homes", "Chika Realty"]);
}

#[tokio::test]
async fn test_listing_carries_extracted_fields() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    let job = harness.create_job(1).await;

    harness.worker().run(&job, None).await;

    let agents = harness
        .results
        .list_agents(&AgentFilter {
            property_type: Some("flat".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(agents.len(), 1);
    let agent = &agents[0];
    assert_eq!(agent.name, "Adebayo Homes");
    assert_eq!(agent.location.as_deref(), Some("Lekki Phase 1, Lekki, Lagos"));
    assert_eq!(agent.profile_url.as_deref(), Some(links[0].as_str()));

    let listings = harness.results.listings_for_agent(agent.id).await.unwrap();
    assert_eq!(listings.len(), 1);
    let listing = &listings[0];
    assert_eq!(listing.url, links[0]);
    assert_eq!(listing.title, "3 Bedroom Flat");
    assert_eq!(listing.price.as_deref(), Some("₦ 85,000,000"));
    assert_eq!(listing.bedrooms, Some(3));
    assert_eq!(listing.bathrooms, Some(3));
    assert_eq!(
        listing.image_url.as_deref(),
        Some("https://sourcesite.example/images/property/1.jpg")
    );
}

#[tokio::test]
async fn test_empty_index_page_moves_on_to_next_page() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    harness.site.page(&index_url("lagos", 2), &index_page(&[]));
    let bungalow = detail_url("201-bungalow");
    harness
        .site
        .page(&index_url("lagos", 3), &index_page(&[bungalow.clone()]));
    harness.site.page(
        &bungalow,
        &detail_page(
            "2 Bedroom Bungalow",
            "House",
            &AgentInfo {
                name: "Dayo Properties",
                phone: Some("08077778888"),
                ..Default::default()
            },
        ),
    );
    let job = harness.create_job(3).await;

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Completed);
    let navigations = harness.site.navigations();
    assert_eq!(navigations.first().map(String::as_str), Some(index_url("lagos", 1).as_str()));
    assert!(navigations.contains(&index_url("lagos", 2)));
    assert!(navigations.contains(&index_url("lagos", 3)));
    assert_eq!(navigations.last(), Some(&bungalow));
    assert!(!navigations.contains(&index_url("lagos", 4)));

    let job = harness.reload(&job).await;
    assert_eq!(job.total, 60);
    assert_eq!(job.progress, 4);
    assert_eq!(job.leads_found, 3);
    assert_eq!(agent_count(&harness).await, 4);
}

#[tokio::test]
async fn test_nested_location_is_requested_as_path_segments() {
    let harness = TestHarness::new().await;
    let flat = detail_url("101-3-bedroom-flat");
    harness
        .site
        .page(&index_url("lagos/lekki", 1), &index_page(&[flat.clone()]));
    harness.site.page(&flat, &adebayo_flat_page());
    let job = harness.create_job_in("lagos/lekki", 1).await;

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(
        harness.site.navigations(),
        vec![
            "https://sourcesite.example/for-sale/properties/lagos/lekki?page=1".to_string(),
            flat,
        ]
    );
    assert_eq!(harness.reload(&job).await.progress, 1);
    assert_eq!(
        harness.crawler.index_url(" lagos/lekki/ ", 2).unwrap(),
        "https://sourcesite.example/for-sale/properties/lagos/lekki?page=2"
    );
}

#[tokio::test]
async fn test_cancel_before_first_page_fetches_nothing() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    let job = harness.create_job(2).await;
    harness.jobs.request_cancel(job.id).await.unwrap();

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Cancelled);
    assert!(harness.site.navigations().is_empty());
    assert_eq!(harness.site.closes(), harness.site.launches());

    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.cancelled);
    assert!(job.error.is_none());
    assert_eq!(job.progress, 0);
}

#[tokio::test]
async fn test_cancel_mid_run_stops_before_next_item() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    let job = harness.create_job(1).await;

    // page check, first item check, then cancelled before the second item
    let jobs = Arc::new(CancellingJobRepository::new(harness.jobs.clone(), 2));
    let outcome = harness.worker_with_jobs(jobs).run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Cancelled);
    assert_eq!(
        harness.site.navigations(),
        vec![index_url("lagos", 1), links[0].clone()]
    );
    assert_eq!(harness.site.closes(), 1);

    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.progress, 1);
    assert!(job.error.is_none());
}

#[tokio::test]
async fn test_cancel_during_detail_fetch_freezes_counters() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    let gate = harness.site.gated(&links[0], &adebayo_flat_page());
    let job = harness.create_job(1).await;

    let worker = harness.worker();
    let running = job.clone();
    let task = tokio::spawn(async move { worker.run(&running, None).await });

    harness.site.wait_for_navigation(&links[0]).await;
    let cancelled = harness.jobs.request_cancel(job.id).await.unwrap();
    gate.notify_one();

    assert_eq!(task.await.unwrap(), JobOutcome::Cancelled);
    assert_eq!(
        harness.site.navigations(),
        vec![index_url("lagos", 1), links[0].clone()]
    );
    assert_eq!(harness.site.closes(), 1);

    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.progress, 0);
    assert_eq!(job.leads_found, 0);
    assert_eq!(job.updated_at, cancelled.updated_at);
}

#[tokio::test]
async fn test_rerun_reuses_agents_and_listings() {
    let harness = TestHarness::new().await;
    let mut links = harness.publish_three_listings();

    let first = harness.create_job(1).await;
    harness.worker().run(&first, None).await;
    assert_eq!(agent_count(&harness).await, 3);

    // same agent (by phone) publishes one more listing
    let extra = detail_url("104-terrace");
    links.push(extra.clone());
    harness.site.page(&index_url("lagos", 1), &index_page(&links));
    harness.site.page(
        &extra,
        &detail_page(
            "Terrace",
            "House",
            &AgentInfo {
                name: "Adebayo Homes Ltd",
                phone: Some("08011112222"),
                ..Default::default()
            },
        ),
    );

    let second = harness.create_job(1).await;
    let outcome = harness.worker().run(&second, None).await;
    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(agent_count(&harness).await, 3);

    // both Adebayo listings count
    let second = harness.reload(&second).await;
    assert_eq!(second.progress, 4);
    assert_eq!(second.leads_found, 3);

    let adebayo = harness
        .results
        .list_agents(&AgentFilter::default())
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.phone.as_deref() == Some("08011112222"))
        .expect("agent should exist");
    assert_eq!(adebayo.name, "Adebayo Homes");
    assert_eq!(adebayo.property_types, vec!["Flat".to_string()]);

    let listings = harness.results.listings_for_agent(adebayo.id).await.unwrap();
    assert_eq!(listings.len(), 2);
}

#[tokio::test]
async fn test_leads_found_follows_each_page_not_the_stored_agent() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    let first = harness.create_job(1).await;
    harness.worker().run(&first, None).await;
    assert_eq!(harness.reload(&first).await.leads_found, 2);

    // Bola drops the external website; the stored agent stays a non-lead
    harness.site.page(
        &links[2],
        &detail_page(
            "Plot of Land",
            "Land",
            &AgentInfo {
                name: "Bola Estates",
                phone: Some("08055556666"),
                ..Default::default()
            },
        ),
    );
    let second = harness.create_job(1).await;
    harness.worker().run(&second, None).await;

    assert_eq!(harness.reload(&second).await.leads_found, 3);
    let bola = harness
        .results
        .list_agents(&AgentFilter::default())
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.name == "Bola Estates")
        .expect("agent should exist");
    assert!(!bola.is_lead);
}

#[tokio::test]
async fn test_rerun_accumulates_property_types_when_enabled() {
    let harness = TestHarness::with_identity(IdentitySettings {
        accumulate_property_types: true,
        ..Default::default()
    })
    .await;
    let links = harness.publish_three_listings();
    let first = harness.create_job(1).await;
    harness.worker().run(&first, None).await;

    // same phone, different property type
    harness.site.page(
        &links[2],
        &detail_page(
            "Semi-detached Duplex",
            "House",
            &AgentInfo {
                name: "Adebayo Homes",
                phone: Some("08011112222"),
                ..Default::default()
            },
        ),
    );
    let second = harness.create_job(1).await;
    harness.worker().run(&second, None).await;

    let adebayo = harness
        .results
        .list_agents(&AgentFilter {
            property_type: Some("house".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .find(|a| a.name == "Adebayo Homes")
        .expect("tag should be merged");
    assert_eq!(
        adebayo.property_types,
        vec!["Flat".to_string(), "House".to_string()]
    );
}

#[tokio::test]
async fn test_failed_detail_navigation_is_skipped() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    harness.site.failing(&links[1], "net::ERR_CONNECTION_RESET");
    let job = harness.create_job(1).await;

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Completed);
    let job = harness.reload(&job).await;
    assert_eq!(job.progress, 2);
    assert_eq!(job.leads_found, 1);
    assert_eq!(agent_count(&harness).await, 2);
}

#[tokio::test]
async fn test_unextractable_page_advances_progress_without_records() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    harness
        .site
        .page(&links[2], "<html><head></head><body></body></html>");
    let job = harness.create_job(1).await;

    harness.worker().run(&job, None).await;

    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 3);
    assert_eq!(agent_count(&harness).await, 2);
}

#[tokio::test]
async fn test_index_navigation_failure_fails_job_and_closes_session() {
    let harness = TestHarness::new().await;
    harness
        .site
        .failing(&index_url("lagos", 1), "net::ERR_NAME_NOT_RESOLVED");
    let job = harness.create_job(1).await;

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert_eq!(harness.site.closes(), 1);
    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error
        .as_deref()
        .is_some_and(|e| e.contains("ERR_NAME_NOT_RESOLVED")));
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn test_launch_failure_fails_job() {
    let harness = TestHarness::new().await;
    harness.site.fail_launch("chrome exited with code 127");
    let job = harness.create_job(1).await;

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert_eq!(harness.site.closes(), 0);
    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error
        .as_deref()
        .is_some_and(|e| e.contains("chrome exited with code 127")));
}

#[tokio::test]
async fn test_unsupported_environment_fails_before_launch() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    harness.site.unsupported_environment("serverless runtime");
    let job = harness.create_job(1).await;

    let outcome = harness.worker().run(&job, None).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert_eq!(harness.site.launches(), 0);
    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error
        .as_deref()
        .is_some_and(|e| e.contains("not supported")));
}

#[tokio::test]
async fn test_manager_runs_job_in_background() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    let job = harness.create_job(1).await;

    let outcome = harness.manager(1).spawn_job(job.clone()).await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Completed));
    assert_eq!(harness.reload(&job).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_manager_records_panicked_job_as_failed() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    harness.site.panicking(&links[0]);
    let job = harness.create_job(1).await;

    let outcome = harness.manager(1).spawn_job(job.clone()).await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Failed));
    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.error.as_deref(),
        Some("Scrape job terminated unexpectedly")
    );
}

#[tokio::test]
async fn test_manager_runs_queued_jobs_one_at_a_time() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    let manager = harness.manager(1);
    let first = harness.create_job(1).await;
    let second = harness.create_job(1).await;

    let a = manager.spawn_job(first.clone());
    let b = manager.spawn_job(second.clone());

    assert_eq!(a.await.unwrap(), Some(JobOutcome::Completed));
    assert_eq!(b.await.unwrap(), Some(JobOutcome::Completed));
    assert_eq!(harness.site.launches(), 2);
    assert_eq!(harness.site.closes(), 2);
    assert_eq!(agent_count(&harness).await, 3);
}

#[tokio::test]
async fn test_manager_reports_progress_through_callback() {
    let harness = TestHarness::new().await;
    harness.publish_three_listings();
    let (callback, calls) = recording_callback();
    let manager = WorkerManager::new(harness.worker(), harness.jobs.clone(), 1)
        .with_progress_callback(callback);
    let job = harness.create_job(1).await;

    let outcome = manager.spawn_job(job).await.unwrap();

    assert_eq!(outcome, Some(JobOutcome::Completed));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![(1, 20, 1), (2, 20, 2), (3, 20, 2)]
    );
}

#[tokio::test]
async fn test_jobs_spawned_after_shutdown_are_failed() {
    let harness = TestHarness::new().await;
    let manager = harness.manager(1);
    manager.shutdown(Duration::from_millis(100)).await;

    let job = harness.create_job(1).await;
    let outcome = manager.spawn_job(job.clone()).await.unwrap();

    assert_eq!(outcome, None);
    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(INTERRUPTED_BY_SHUTDOWN));
}

#[tokio::test]
async fn test_shutdown_stops_running_job_at_next_checkpoint() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    let gate = harness.site.gated(&links[0], &adebayo_flat_page());
    let manager = harness.manager(1);
    let job = harness.create_job(1).await;

    let handle = manager.spawn_job(job.clone());
    harness.site.wait_for_navigation(&links[0]).await;

    // the item in flight finishes inside the grace period
    tokio::join!(manager.shutdown(Duration::from_secs(5)), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.notify_one();
    });

    assert_eq!(handle.await.unwrap(), Some(JobOutcome::Failed));
    assert_eq!(
        harness.site.navigations(),
        vec![index_url("lagos", 1), links[0].clone()]
    );
    assert_eq!(harness.site.closes(), 1);

    let job = harness.reload(&job).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(INTERRUPTED_BY_SHUTDOWN));
    assert_eq!(job.progress, 1);
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn test_shutdown_aborts_stuck_job_after_grace() {
    let harness = TestHarness::new().await;
    let links = harness.publish_three_listings();
    let _gate = harness.site.gated(&links[0], &adebayo_flat_page());
    let manager = harness.manager(1);
    let stuck = harness.create_job(1).await;
    let queued = harness.create_job(1).await;

    let running = manager.spawn_job(stuck.clone());
    let waiting = manager.spawn_job(queued.clone());
    harness.site.wait_for_navigation(&links[0]).await;

    manager.shutdown(Duration::from_millis(100)).await;

    assert!(running.await.unwrap_err().is_cancelled());
    assert_eq!(waiting.await.unwrap(), None);
    for job in [&stuck, &queued] {
        let job = harness.reload(job).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(INTERRUPTED_BY_SHUTDOWN));
    }
    assert_eq!(harness.site.launches(), 1);
}
