// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.


use fake_browser::{FakeBrowserEngine, FakeSite};
use leadscout::application::use_cases::scrape_job_use_case::ScrapeJobUseCase;
use leadscout::config::settings::{CrawlerSettings, DatabaseSettings, DelayRange, IdentitySettings};
use leadscout::domain::models::scrape_job::ScrapeJob;
use leadscout::domain::repositories::job_repository::{JobRepository, RepositoryError};
use leadscout::domain::services::field_extractor::{ExtractorSelectors, FieldExtractor};
use leadscout::domain::services::identity_resolver::IdentityResolver;
use leadscout::domain::services::lead_classifier::LeadClassifier;
use leadscout::domain::services::page_crawler::PageCrawler;
use leadscout::infrastructure::database::connection;
use leadscout::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use leadscout::infrastructure::repositories::result_repo_impl::ResultRepositoryImpl;
use leadscout::workers::{ScrapeJobWorker, WorkerManager};
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const BASE_URL: &str = "https://sourcesite.example";
pub const SOURCE_LABEL: &str = "Source Site";

/// 迁移后的 SQLite 内存数据库
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: None,
        idle_timeout: None,
    };
    let db = connection::create_pool(&settings)
        .await
        .expect("Failed to open SQLite database");
    connection::run_migrations(&db)
        .await
        .expect("Failed to run migrations");
    Arc::new(db)
}

/// 无延迟、指向假站点的爬虫配置
pub fn crawler_settings() -> CrawlerSettings {
    CrawlerSettings {
        base_url: BASE_URL.to_string(),
        source_label: SOURCE_LABEL.to_string(),
        index_delay_ms: DelayRange::zero(),
        detail_delay_ms: DelayRange::zero(),
        ..CrawlerSettings::default()
    }
}

pub fn index_url(location: &str, page: u32) -> String {
    format!("{}/for-sale/properties/{}?page={}", BASE_URL, location, page)
}

pub fn detail_url(slug: &str) -> String {
    format!("{}/for-sale/flats-apartments/lagos/{}", BASE_URL, slug)
}

/// 列表页 HTML
pub fn index_page(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<div class="wp-block"><a class="content-link" href="{}">View</a></div>"#, link))
        .collect();
    format!(
        r#"<html><body>{}<a href="/for-sale/properties/lagos?page=2">Next</a></body></html>"#,
        anchors
    )
}

/// 详情页中的经纪人信息
#[derive(Debug, Clone, Default)]
pub struct AgentInfo<'a> {
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub website: Option<&'a str>,
}

/// 详情页 HTML
pub fn detail_page(title: &str, property_type: &str, agent: &AgentInfo<'_>) -> String {
    let phone = agent
        .phone
        .map(|p| format!(r#"<a class="agent-phone" href="tel:{0}">{0}</a>"#, p))
        .unwrap_or_default();
    let email = agent
        .email
        .map(|e| format!(r#"<a class="agent-email" href="mailto:{0}">{0}</a>"#, e))
        .unwrap_or_default();
    let website = agent
        .website
        .map(|w| format!(r#"<a class="agent-website" href="{}">Website</a>"#, w))
        .unwrap_or_default();

    format!(
        r#"<html><body>
            <h1>{title}</h1>
            <span class="price">₦ 85,000,000</span>
            <address class="location">Lekki Phase 1, Lekki, Lagos</address>
            <div class="property-type">{property_type}</div>
            <ul><li class="bedrooms">3 Bedrooms</li><li class="bathrooms">3 Bathrooms</li></ul>
            <img src="/images/property/1.jpg">
            <div class="agent-box"><h3 class="agent-name">{name}</h3>{phone}{email}{website}</div>
        </body></html>"#,
        title = title,
        property_type = property_type,
        name = agent.name,
        phone = phone,
        email = email,
        website = website,
    )
}

/// 测试用的完整组件图
#[allow(dead_code)]
pub struct TestHarness {
    pub db: Arc<DatabaseConnection>,
    pub jobs: Arc<JobRepositoryImpl>,
    pub results: Arc<ResultRepositoryImpl>,
    pub site: Arc<FakeSite>,
    pub resolver: Arc<IdentityResolver>,
    pub crawler: Arc<PageCrawler>,
    pub extractor: Arc<FieldExtractor>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_identity(IdentitySettings::default()).await
    }

    pub async fn with_identity(identity: IdentitySettings) -> Self {
        let db = setup_db().await;
        let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
        let results = Arc::new(ResultRepositoryImpl::new(db.clone()));
        let site = Arc::new(FakeSite::default());

        let settings = crawler_settings();
        let crawler = Arc::new(PageCrawler::new(
            Arc::new(FakeBrowserEngine::new(site.clone())),
            settings.clone(),
        ));
        let extractor = Arc::new(
            FieldExtractor::new(&ExtractorSelectors::default()).expect("default selectors compile"),
        );
        let resolver = Arc::new(IdentityResolver::new(
            results.clone(),
            LeadClassifier::new(&settings.base_url),
            identity,
            settings.source_label.clone(),
        ));

        Self {
            db,
            jobs,
            results,
            site,
            resolver,
            crawler,
            extractor,
        }
    }

    pub fn worker(&self) -> Arc<ScrapeJobWorker> {
        self.worker_with_jobs(self.jobs.clone())
    }

    pub fn worker_with_jobs(&self, jobs: Arc<dyn JobRepository>) -> Arc<ScrapeJobWorker> {
        Arc::new(ScrapeJobWorker::new(
            jobs,
            self.results.clone(),
            self.crawler.clone(),
            self.extractor.clone(),
            self.resolver.clone(),
        ))
    }

    pub fn manager(&self, max_concurrent_jobs: usize) -> Arc<WorkerManager> {
        Arc::new(WorkerManager::new(
            self.worker(),
            self.jobs.clone(),
            max_concurrent_jobs,
        ))
    }

    pub fn use_case(&self, manager: Arc<WorkerManager>) -> Arc<ScrapeJobUseCase> {
        Arc::new(ScrapeJobUseCase::new(
            self.jobs.clone(),
            self.results.clone(),
            manager,
            crawler_settings(),
        ))
    }

    /// 轮询直到任务进入终止状态
    pub async fn wait_for_terminal(&self, id: Uuid) -> ScrapeJob {
        for _ in 0..200 {
            let job = self
                .jobs
                .find_by_id(id)
                .await
                .expect("Failed to load job")
                .expect("Job disappeared");
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish in time", id);
    }

    /// 创建并持久化一个 `pending` 任务
    pub async fn create_job(&self, max_pages: u32) -> ScrapeJob {
        self.create_job_in("lagos", max_pages).await
    }

    pub async fn create_job_in(&self, location: &str, max_pages: u32) -> ScrapeJob {
        let job = ScrapeJob::new(SOURCE_LABEL, location, max_pages);
        self.jobs.create(&job).await.expect("Failed to create job")
    }

    pub async fn reload(&self, job: &ScrapeJob) -> ScrapeJob {
        self.jobs
            .find_by_id(job.id)
            .await
            .expect("Failed to load job")
            .expect("Job disappeared")
    }

    /// 发布三个详情页：两个线索经纪人和一个有独立网站的经纪人
    pub fn publish_three_listings(&self) -> Vec<String> {
        let links = vec![
            detail_url("101-3-bedroom-flat"),
            detail_url("102-duplex"),
            detail_url("103-land"),
        ];
        self.site.page(&index_url("lagos", 1), &index_page(&links));
        self.site.page(
            &links[0],
            &detail_page(
                "3 Bedroom Flat",
                "Flat",
                &AgentInfo {
                    name: "Adebayo Homes",
                    phone: Some("08011112222"),
                    ..Default::default()
                },
            ),
        );
        self.site.page(
            &links[1],
            &detail_page(
                "4 Bedroom Duplex",
                "House",
                &AgentInfo {
                    name: "Chika Realty",
                    phone: Some("08033334444"),
                    website: Some("https://sourcesite.example/agents/chika"),
                    ..Default::default()
                },
            ),
        );
        self.site.page(
            &links[2],
            &detail_page(
                "Plot of Land",
                "Land",
                &AgentInfo {
                    name: "Bola Estates",
                    phone: Some("08055556666"),
                    website: Some("https://bolaestates.ng"),
                    ..Default::default()
                },
            ),
        );
        links
    }
}

/// 在第 `after_checks` 次读取取消标记之后发起取消的任务仓库
pub struct CancellingJobRepository {
    inner: Arc<JobRepositoryImpl>,
    after_checks: usize,
    checks: AtomicUsize,
}

impl CancellingJobRepository {
    pub fn new(inner: Arc<JobRepositoryImpl>, after_checks: usize) -> Self {
        Self {
            inner,
            after_checks,
            checks: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl JobRepository for CancellingJobRepository {
    async fn create(&self, job: &ScrapeJob) -> Result<ScrapeJob, RepositoryError> {
        self.inner.create(job).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn update(
        &self,
        id: Uuid,
        update: &leadscout::domain::models::scrape_job::JobUpdate,
    ) -> Result<(), RepositoryError> {
        self.inner.update(id, update).await
    }

    async fn is_cancelled(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let seen = self.checks.fetch_add(1, Ordering::SeqCst);
        if seen == self.after_checks {
            self.inner.request_cancel(id).await?;
        }
        self.inner.is_cancelled(id).await
    }

    async fn request_cancel(&self, id: Uuid) -> Result<ScrapeJob, RepositoryError> {
        self.inner.request_cancel(id).await
    }
}
