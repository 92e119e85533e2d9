//! In-memory fakes for the ports, shared by the unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use siteline::{
    BatchItem, CachedSite, ChatBridge, ContextCacheStore, ConversationEntry,
    ConversationRepository, Defect, DefectPatch, DefectRepository, DefectStatus, DomainError, Job,
    JobQueue, JobStatus, NewDefect, NewSite, ProcessedEventRepository, RateWindowStore,
    ReasoningProvider, ReasoningResponse, ReportGenerator, ReportRequest, Site, SiteContext,
    SitePatch, SiteRepository, ToolDefinition, ToolInvocation, Transcriber, TranscriptionContext,
};

use crate::adapters::MemoryContextCache;
use crate::application::tools::{ToolContext, ToolDeps, ToolRegistry};
use crate::application::{Deduplicator, IntakeGateway, RateLimiter, SiteContextCache, SiteService};
use crate::auth::AdminKey;
use crate::{build_router, AppState};

pub const SENDER: &str = "972500000001";

fn site_id_for(group_id: &str) -> i64 {
    group_id
        .bytes()
        .fold(7i64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as i64))
}

pub fn sample_site(group_id: &str) -> Site {
    Site {
        id: site_id_for(group_id),
        group_id: group_id.to_string(),
        name: Some(format!("Tower {group_id}")),
        logo_url: None,
        training_phase: "Active".to_string(),
        context: SiteContext::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn cached_site(group_id: &str) -> CachedSite {
    CachedSite::from(sample_site(group_id))
}

pub fn tool_context(group_id: &str) -> ToolContext {
    ToolContext {
        site: cached_site(group_id),
        sender_id: SENDER.to_string(),
        image_url: None,
    }
}

// ---- rate window ----

#[derive(Default)]
pub struct MemoryRateWindow {
    hits: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl MemoryRateWindow {
    pub fn entries(&self, tenant_id: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .get(tenant_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RateWindowStore for MemoryRateWindow {
    async fn record_hit(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut hits = self.hits.lock().unwrap();
        let entries = hits.entry(tenant_id.to_string()).or_default();
        entries.retain(|hit| *hit > window_start);
        entries.push(now);
        Ok(entries.len() as u64)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut hits = self.hits.lock().unwrap();
        let mut removed = 0;
        for entries in hits.values_mut() {
            let before = entries.len();
            entries.retain(|hit| *hit >= cutoff);
            removed += (before - entries.len()) as u64;
        }
        Ok(removed)
    }
}

pub struct FailingRateWindow;

#[async_trait]
impl RateWindowStore for FailingRateWindow {
    async fn record_hit(
        &self,
        _tenant_id: &str,
        _now: DateTime<Utc>,
        _window_start: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        Err(DomainError::Repository("connection refused".to_string()))
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        Err(DomainError::Repository("connection refused".to_string()))
    }
}

// ---- processed events ----

#[derive(Default)]
pub struct MemoryProcessedEvents {
    records: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryProcessedEvents {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn backdate(&self, event_id: &str, processed_at: DateTime<Utc>) {
        if let Some(record) = self.records.lock().unwrap().get_mut(event_id) {
            record.1 = processed_at;
        }
    }
}

#[async_trait]
impl ProcessedEventRepository for MemoryProcessedEvents {
    async fn is_processed(&self, event_id: &str) -> Result<bool, DomainError> {
        Ok(self.records.lock().unwrap().contains_key(event_id))
    }

    async fn mark_processed(&self, event_id: &str, tenant_id: &str) -> Result<bool, DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(event_id) {
            return Ok(false);
        }
        records.insert(event_id.to_string(), (tenant_id.to_string(), Utc::now()));
        Ok(true)
    }

    async fn release(&self, event_id: &str) -> Result<(), DomainError> {
        self.records.lock().unwrap().remove(event_id);
        Ok(())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, (_, at)| *at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

// ---- job queue ----

#[derive(Default)]
pub struct MemoryQueue {
    jobs: Mutex<Vec<Job>>,
    fail_next: AtomicBool,
}

impl MemoryQueue {
    pub fn enqueued(&self) -> Vec<(String, serde_json::Value)> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|job| (job.name.clone(), job.payload.clone()))
            .collect()
    }

    pub fn fail_next_enqueue(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn status_of(&self, id: Uuid) -> Option<JobStatus> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| job.id == id)
            .map(|job| job.status)
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.jobs.lock().unwrap().iter().map(|job| job.status).collect()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, name: &str, payload: serde_json::Value) -> Result<Uuid, DomainError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Repository("queue unavailable".to_string()));
        }
        let job = Job {
            id: Uuid::new_v4(),
            name: name.to_string(),
            payload,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: 3,
            last_error: None,
            run_at: Utc::now(),
            created_at: Utc::now(),
        };
        let id = job.id;
        self.jobs.lock().unwrap().push(job);
        Ok(id)
    }

    async fn dequeue(&self, name: &str) -> Result<Option<Job>, DomainError> {
        let mut jobs = self.jobs.lock().unwrap();
        let next = jobs
            .iter_mut()
            .find(|job| job.name == name && job.status == JobStatus::Pending);
        Ok(next.map(|job| {
            job.status = JobStatus::Running;
            job.attempts += 1;
            job.clone()
        }))
    }

    async fn complete(&self, id: Uuid) -> Result<(), DomainError> {
        if let Some(job) = self.jobs.lock().unwrap().iter_mut().find(|j| j.id == id) {
            job.status = JobStatus::Completed;
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<JobStatus, DomainError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| DomainError::not_found("Job", id))?;
        job.last_error = Some(error.to_string());
        job.status = if job.attempts >= job.max_attempts {
            JobStatus::Dead
        } else {
            JobStatus::Pending
        };
        Ok(job.status)
    }

    async fn dead_letter(&self, id: Uuid, error: &str) -> Result<(), DomainError> {
        if let Some(job) = self.jobs.lock().unwrap().iter_mut().find(|j| j.id == id) {
            job.status = JobStatus::Dead;
            job.last_error = Some(error.to_string());
        }
        Ok(())
    }

    async fn requeue_expired(&self) -> Result<u64, DomainError> {
        Ok(0)
    }
}

// ---- sites ----

#[derive(Default)]
pub struct MemorySiteRepository {
    sites: Mutex<Vec<Site>>,
    lookups: AtomicUsize,
}

impl MemorySiteRepository {
    pub fn with_sites(sites: Vec<Site>) -> Self {
        Self {
            sites: Mutex::new(sites),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `find_by_group_id` calls so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteRepository for MemorySiteRepository {
    async fn find_by_group_id(&self, group_id: &str) -> Result<Option<Site>, DomainError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .sites
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.group_id == group_id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Site>, DomainError> {
        let mut sites = self.sites.lock().unwrap().clone();
        sites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sites)
    }

    async fn create(&self, site: NewSite) -> Result<Site, DomainError> {
        let mut sites = self.sites.lock().unwrap();
        if sites.iter().any(|s| s.group_id == site.group_id) {
            return Err(DomainError::Conflict(format!(
                "Site {} already exists",
                site.group_id
            )));
        }
        let mut created = sample_site(&site.group_id);
        created.name = site.name;
        created.logo_url = site.logo_url;
        if let Some(phase) = site.training_phase {
            created.training_phase = phase;
        }
        created.context = site.context;
        sites.push(created.clone());
        Ok(created)
    }

    async fn update(&self, group_id: &str, patch: SitePatch) -> Result<Option<Site>, DomainError> {
        let mut sites = self.sites.lock().unwrap();
        let Some(site) = sites.iter_mut().find(|s| s.group_id == group_id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            site.name = Some(name);
        }
        if let Some(logo_url) = patch.logo_url {
            site.logo_url = Some(logo_url);
        }
        if let Some(phase) = patch.training_phase {
            site.training_phase = phase;
        }
        if let Some(context) = patch.context {
            site.context = context;
        }
        site.updated_at = Utc::now();
        Ok(Some(site.clone()))
    }
}

pub struct FailingCacheStore;

#[async_trait]
impl ContextCacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<CachedSite>, DomainError> {
        Err(DomainError::ExternalService("cache down".to_string()))
    }

    async fn set(&self, _key: &str, _site: &CachedSite, _ttl: Duration) -> Result<(), DomainError> {
        Err(DomainError::ExternalService("cache down".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), DomainError> {
        Err(DomainError::ExternalService("cache down".to_string()))
    }
}

// ---- defects ----

#[derive(Default)]
pub struct MemoryDefectRepository {
    defects: Mutex<Vec<Defect>>,
}

impl MemoryDefectRepository {
    pub fn all(&self) -> Vec<Defect> {
        self.defects.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.defects.lock().unwrap().len()
    }
}

#[async_trait]
impl DefectRepository for MemoryDefectRepository {
    async fn create_next(&self, site_id: i64, defect: NewDefect) -> Result<Defect, DomainError> {
        let mut defects = self.defects.lock().unwrap();
        let next = defects
            .iter()
            .filter(|d| d.site_id == site_id)
            .map(|d| d.defect_id)
            .max()
            .unwrap_or(0)
            + 1;
        let created = Defect {
            id: defects.len() as i64 + 1,
            defect_id: next,
            site_id,
            description: defect.description,
            reporter: defect.reporter,
            supplier: defect.supplier,
            location: defect.location,
            image_url: defect.image_url,
            status: DefectStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        defects.push(created.clone());
        Ok(created)
    }

    async fn find(&self, site_id: i64, defect_id: i32) -> Result<Option<Defect>, DomainError> {
        Ok(self
            .defects
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.site_id == site_id && d.defect_id == defect_id)
            .cloned())
    }

    async fn list_by_site(&self, site_id: i64) -> Result<Vec<Defect>, DomainError> {
        let mut defects: Vec<Defect> = self
            .defects
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.site_id == site_id)
            .cloned()
            .collect();
        defects.sort_by_key(|d| d.defect_id);
        Ok(defects)
    }

    async fn update(
        &self,
        site_id: i64,
        defect_id: i32,
        patch: DefectPatch,
    ) -> Result<Option<Defect>, DomainError> {
        let mut defects = self.defects.lock().unwrap();
        let Some(defect) = defects
            .iter_mut()
            .find(|d| d.site_id == site_id && d.defect_id == defect_id)
        else {
            return Ok(None);
        };
        if let Some(description) = patch.description {
            defect.description = description;
        }
        if let Some(supplier) = patch.supplier {
            defect.supplier = Some(supplier);
        }
        if let Some(location) = patch.location {
            defect.location = Some(location);
        }
        if let Some(image_url) = patch.image_url {
            defect.image_url = Some(image_url);
        }
        if let Some(status) = patch.status {
            defect.status = status;
        }
        defect.updated_at = Utc::now();
        Ok(Some(defect.clone()))
    }
}

// ---- conversations ----

#[derive(Default)]
pub struct MemoryConversations {
    sessions: Mutex<HashMap<String, Vec<ConversationEntry>>>,
}

impl MemoryConversations {
    pub fn get(&self, session_key: &str) -> Option<Vec<ConversationEntry>> {
        self.sessions.lock().unwrap().get(session_key).cloned()
    }
}

#[async_trait]
impl ConversationRepository for MemoryConversations {
    async fn load(&self, session_key: &str) -> Result<Vec<ConversationEntry>, DomainError> {
        Ok(self.get(session_key).unwrap_or_default())
    }

    async fn save(
        &self,
        session_key: &str,
        history: &[ConversationEntry],
    ) -> Result<(), DomainError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_key.to_string(), history.to_vec());
        Ok(())
    }

    async fn clear(&self, session_key: &str) -> Result<(), DomainError> {
        self.sessions.lock().unwrap().remove(session_key);
        Ok(())
    }
}

// ---- chat bridge ----

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    Text {
        group_id: String,
        message: String,
    },
    Batch {
        group_id: String,
        items: Vec<BatchItem>,
    },
    Document {
        group_id: String,
        url: String,
        filename: String,
        caption: String,
    },
    Reminder {
        group_id: String,
        name: String,
        start: NaiveDateTime,
    },
}

#[derive(Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<BridgeCall>>,
    acks: Mutex<Vec<String>>,
    fail_text: AtomicBool,
    fail_ack: AtomicBool,
}

impl RecordingBridge {
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BridgeCall::Text { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Acknowledgment attempts, failed ones included
    pub fn acknowledged(&self) -> Vec<String> {
        self.acks.lock().unwrap().clone()
    }

    /// Every later `send_text` fails with a transient error
    pub fn fail_text_sends(&self) {
        self.fail_text.store(true, Ordering::SeqCst);
    }

    /// Every later `acknowledge` fails after being recorded
    pub fn fail_acks(&self) {
        self.fail_ack.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: BridgeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatBridge for RecordingBridge {
    async fn send_text(&self, group_id: &str, message: &str) -> Result<(), DomainError> {
        if self.fail_text.load(Ordering::SeqCst) {
            return Err(DomainError::ExternalService("bridge returned 502".to_string()));
        }
        self.record(BridgeCall::Text {
            group_id: group_id.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn send_batch(&self, group_id: &str, items: &[BatchItem]) -> Result<(), DomainError> {
        self.record(BridgeCall::Batch {
            group_id: group_id.to_string(),
            items: items.to_vec(),
        });
        Ok(())
    }

    async fn send_document(
        &self,
        group_id: &str,
        document_url: &str,
        filename: &str,
        caption: &str,
    ) -> Result<(), DomainError> {
        self.record(BridgeCall::Document {
            group_id: group_id.to_string(),
            url: document_url.to_string(),
            filename: filename.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn schedule_reminder(
        &self,
        group_id: &str,
        name: &str,
        start: NaiveDateTime,
    ) -> Result<(), DomainError> {
        self.record(BridgeCall::Reminder {
            group_id: group_id.to_string(),
            name: name.to_string(),
            start,
        });
        Ok(())
    }

    async fn acknowledge(&self, event_id: &str) -> Result<(), DomainError> {
        self.acks.lock().unwrap().push(event_id.to_string());
        if self.fail_ack.load(Ordering::SeqCst) {
            return Err(DomainError::ExternalService("bridge unreachable".to_string()));
        }
        Ok(())
    }
}

// ---- reasoning ----

enum Script {
    /// `None` fails that call
    Responses(Mutex<VecDeque<Option<ReasoningResponse>>>),
    AlwaysTools(String),
    Failing,
}

pub struct ScriptedReasoner {
    script: Script,
    history_lengths: Mutex<Vec<usize>>,
}

impl ScriptedReasoner {
    /// Replays `responses` in order, then answers with empty text
    pub fn new(responses: Vec<ReasoningResponse>) -> Self {
        Self::steps(responses.into_iter().map(Some).collect())
    }

    /// Like `new`, but a `None` step makes that call fail
    pub fn steps(steps: Vec<Option<ReasoningResponse>>) -> Self {
        Self::with_script(Script::Responses(Mutex::new(steps.into())))
    }

    /// Requests `tool` on every call
    pub fn always_tools(tool: &str) -> Self {
        Self::with_script(Script::AlwaysTools(tool.to_string()))
    }

    pub fn failing() -> Self {
        Self::with_script(Script::Failing)
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            history_lengths: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.history_lengths.lock().unwrap().len()
    }

    /// History length seen by each call
    pub fn history_lengths(&self) -> Vec<usize> {
        self.history_lengths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedReasoner {
    async fn reason(
        &self,
        _instruction: &str,
        history: &[ConversationEntry],
        _tools: &[ToolDefinition],
    ) -> Result<ReasoningResponse, DomainError> {
        let call = {
            let mut seen = self.history_lengths.lock().unwrap();
            seen.push(history.len());
            seen.len()
        };

        match &self.script {
            Script::Responses(responses) => match responses.lock().unwrap().pop_front() {
                Some(Some(response)) => Ok(response),
                Some(None) => Err(DomainError::ExternalService(
                    "reasoning provider returned 500".to_string(),
                )),
                None => Ok(ReasoningResponse::text("")),
            },
            Script::AlwaysTools(tool) => Ok(ReasoningResponse {
                content: None,
                tool_calls: vec![ToolInvocation {
                    id: format!("call_{call}"),
                    name: tool.clone(),
                    arguments: json!({}),
                }],
            }),
            Script::Failing => Err(DomainError::ExternalService(
                "reasoning provider returned 500".to_string(),
            )),
        }
    }
}

// ---- transcription and reports ----

pub struct FakeTranscriber {
    transcript: Option<String>,
}

impl FakeTranscriber {
    pub fn returning(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { transcript: None }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        _file_id: &str,
        _context: &TranscriptionContext,
    ) -> Result<String, DomainError> {
        self.transcript
            .clone()
            .ok_or_else(|| DomainError::ExternalService("transcription error".to_string()))
    }
}

#[derive(Default)]
pub struct FakeReportGenerator {
    fail: bool,
    requests: Mutex<Vec<ReportRequest>>,
}

impl FakeReportGenerator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportGenerator for FakeReportGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<String, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(DomainError::ExternalService("render failed".to_string()));
        }
        Ok("https://files.example/report.pdf".to_string())
    }
}

// ---- wiring ----

/// Tool collaborators around a registry with site "T1" registered
pub struct ToolFixture {
    pub defects: Arc<MemoryDefectRepository>,
    pub bridge: Arc<RecordingBridge>,
    pub site_repo: Arc<MemorySiteRepository>,
    pub cache: Arc<SiteContextCache>,
    pub sites: Arc<SiteService>,
    pub reports: Arc<FakeReportGenerator>,
}

impl ToolFixture {
    pub fn new() -> Self {
        let site_repo = Arc::new(MemorySiteRepository::with_sites(vec![sample_site("T1")]));
        let cache = Arc::new(SiteContextCache::new(
            site_repo.clone(),
            Arc::new(MemoryContextCache::new()),
            Duration::from_secs(300),
        ));
        let sites = Arc::new(SiteService::new(site_repo.clone(), cache.clone()));
        Self {
            defects: Arc::new(MemoryDefectRepository::default()),
            bridge: Arc::new(RecordingBridge::default()),
            site_repo,
            cache,
            sites,
            reports: Arc::new(FakeReportGenerator::default()),
        }
    }

    pub fn deps(&self) -> ToolDeps {
        ToolDeps {
            defects: self.defects.clone(),
            bridge: self.bridge.clone(),
            sites: self.sites.clone(),
            reports: Some(self.reports.clone() as Arc<dyn ReportGenerator>),
            max_description_length: 500,
        }
    }

    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::standard(self.deps())
    }
}

/// HTTP surface over in-memory intake and site fakes, with site "T1" registered
pub struct TestApp {
    pub queue: Arc<MemoryQueue>,
    pub site_repo: Arc<MemorySiteRepository>,
    state: AppState,
    body_limit: usize,
}

impl TestApp {
    pub const WEBHOOK_SECRET: &'static str = "s3cret";
    pub const ADMIN_KEY: &'static str = "admin-key";

    pub fn new() -> Self {
        Self::build(20, 1_048_576)
    }

    pub fn with_rate_limit(max_messages: u64) -> Self {
        Self::build(max_messages, 1_048_576)
    }

    pub fn with_body_limit(body_limit: usize) -> Self {
        Self::build(20, body_limit)
    }

    fn build(max_messages: u64, body_limit: usize) -> Self {
        let queue = Arc::new(MemoryQueue::default());
        let site_repo = Arc::new(MemorySiteRepository::with_sites(vec![sample_site("T1")]));
        let cache = Arc::new(SiteContextCache::new(
            site_repo.clone(),
            Arc::new(MemoryContextCache::new()),
            Duration::from_secs(300),
        ));
        let intake = Arc::new(IntakeGateway::new(
            Self::WEBHOOK_SECRET,
            Arc::new(RateLimiter::new(
                Arc::new(MemoryRateWindow::default()),
                max_messages,
                Duration::from_secs(60),
            )),
            Arc::new(Deduplicator::new(Arc::new(MemoryProcessedEvents::default()))),
            queue.clone(),
        ));
        let state = AppState {
            intake,
            sites: Arc::new(SiteService::new(site_repo.clone(), cache)),
            admin_key: AdminKey(Some(Arc::from(Self::ADMIN_KEY))),
        };
        Self {
            queue,
            site_repo,
            state,
            body_limit,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.body_limit)
    }
}
