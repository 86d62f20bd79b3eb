/// Worker inventory across open tabs, and worker termination
use std::collections::HashSet;

use futures::future::join_all;
use log::{debug, info, warn};
use url::Url;

use crate::deletion::remove_service_workers;
use crate::domain::is_web_url;
use crate::host::{BrowsingDataApi, TabsApi};
use crate::messages::ContentRequest;
use crate::site_data::{SiteDataReport, TabInfo, WorkerKind, WorkerRecord};

/// Flatten one tab's report into worker records tagged with the tab
pub fn workers_from_report(tab: &TabInfo, report: &SiteDataReport) -> Vec<WorkerRecord> {
    let service_workers = report.service_workers.iter().map(|sw| WorkerRecord {
        id: sw.scope.clone(),
        kind: WorkerKind::ServiceWorker,
        domain: report.domain.clone(),
        scope: Some(sw.scope.clone()),
        script_url: sw.script_url.clone(),
        state: sw.state.clone().unwrap_or_else(|| "unknown".to_string()),
        tab_id: tab.id,
        tab_title: tab.title.clone(),
        tab_url: tab.url.clone(),
        timestamp: report.timestamp.clone(),
    });

    let web_workers = report.web_workers.iter().map(|script| WorkerRecord {
        id: script.src.clone(),
        kind: WorkerKind::WebWorker,
        domain: report.domain.clone(),
        scope: None,
        script_url: Some(script.src.clone()),
        state: "running".to_string(),
        tab_id: tab.id,
        tab_title: tab.title.clone(),
        tab_url: tab.url.clone(),
        timestamp: report.timestamp.clone(),
    });

    service_workers.chain(web_workers).collect()
}

/// Drop repeated `(id, kind)` pairs, keeping the first
pub fn dedup_workers(workers: Vec<WorkerRecord>) -> Vec<WorkerRecord> {
    let mut seen: HashSet<(String, WorkerKind)> = HashSet::new();
    workers
        .into_iter()
        .filter(|worker| seen.insert((worker.id.clone(), worker.kind)))
        .collect()
}

/// Ask one tab for its workers; a tab that cannot answer has none
async fn collect_from_tab<H: TabsApi>(host: &H, tab: &TabInfo) -> Vec<WorkerRecord> {
    match host.send_tab_message(tab.id, &ContentRequest::GetAllSiteData).await {
        Ok(response) if response.success => match &response.data {
            Some(report) => workers_from_report(tab, report),
            None => Vec::new(),
        },
        Ok(response) => {
            debug!("Tab {} could not report: {:?}", tab.id, response.error);
            Vec::new()
        }
        Err(e) => {
            warn!("Collecting workers from tab {} failed: {}", tab.id, e);
            Vec::new()
        }
    }
}

/// Collect service and web workers from every open http(s) tab
pub async fn collect_workers<H: TabsApi>(host: &H) -> Vec<WorkerRecord> {
    let tabs = match host.query_tabs(None).await {
        Ok(tabs) => tabs,
        Err(e) => {
            warn!("Listing tabs failed: {}", e);
            return Vec::new();
        }
    };

    let web_tabs: Vec<&TabInfo> = tabs.iter().filter(|tab| is_web_url(&tab.url)).collect();
    let per_tab = join_all(web_tabs.iter().map(|tab| collect_from_tab(host, tab))).await;

    let workers = dedup_workers(per_tab.into_iter().flatten().collect());
    info!("Found {} workers in {} tabs", workers.len(), web_tabs.len());
    workers
}

/// What a termination attempt achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Service worker registrations for the host were removed
    Removed,
    /// The owning page was asked to stop the worker; it may ignore the request
    RequestSent,
    Failed(String),
}

/// Stop one worker
///
/// Service workers are removed through origin-scoped deletion of the host
/// named by their scope URL. Web workers belong to their page, which can only
/// be asked to stop them.
pub async fn terminate_worker<H>(host: &H, worker: &WorkerRecord) -> Termination
where
    H: TabsApi + BrowsingDataApi,
{
    if worker.id.is_empty() {
        return Termination::Failed("Worker ID is required".to_string());
    }

    match worker.kind {
        WorkerKind::ServiceWorker => {
            let Some(domain) = Url::parse(&worker.id)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
            else {
                return Termination::Failed(format!("Not a service worker scope: {}", worker.id));
            };

            match remove_service_workers(host, &domain).await {
                Ok(()) => Termination::Removed,
                Err(e) => Termination::Failed(e.to_string()),
            }
        }
        WorkerKind::WebWorker => {
            let request = ContentRequest::TerminateWorker {
                worker_id: worker.id.clone(),
            };
            match host.send_tab_message(worker.tab_id, &request).await {
                Ok(response) if response.success => Termination::RequestSent,
                Ok(response) => Termination::Failed(
                    response
                        .error
                        .or(response.message)
                        .unwrap_or_else(|| "The page rejected the request".to_string()),
                ),
                Err(e) => {
                    warn!("Terminate request to tab {} failed: {}", worker.tab_id, e);
                    Termination::Failed("The tab cannot be reached".to_string())
                }
            }
        }
    }
}

/// Worker state shown once its page has been asked to stop it
pub const TERMINATION_REQUESTED: &str = "termination requested";

/// The worker list after one termination attempt
///
/// Removed workers leave the list. Workers whose page was only asked to stop
/// stay listed and are marked, since the page may ignore the request.
pub fn apply_termination(workers: &[WorkerRecord], target: &WorkerRecord, outcome: &Termination) -> Vec<WorkerRecord> {
    let is_target = |worker: &WorkerRecord| worker.id == target.id && worker.kind == target.kind;

    match outcome {
        Termination::Removed => workers.iter().filter(|worker| !is_target(worker)).cloned().collect(),
        Termination::RequestSent => workers
            .iter()
            .map(|worker| {
                let mut worker = worker.clone();
                if is_target(&worker) {
                    worker.state = TERMINATION_REQUESTED.to_string();
                }
                worker
            })
            .collect(),
        Termination::Failed(_) => workers.to_vec(),
    }
}

/// Counts from terminating a list of workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminationSummary {
    /// Service workers whose registrations were removed
    pub removed: usize,
    /// Web workers whose page was asked to stop them
    pub requested: usize,
    pub total: usize,
}

impl TerminationSummary {
    pub fn from_outcomes(outcomes: &[Termination]) -> Self {
        outcomes.iter().fold(
            TerminationSummary {
                total: outcomes.len(),
                ..Default::default()
            },
            |mut summary, outcome| {
                match outcome {
                    Termination::Removed => summary.removed += 1,
                    Termination::RequestSent => summary.requested += 1,
                    Termination::Failed(_) => {}
                }
                summary
            },
        )
    }

    pub fn failed(&self) -> usize {
        self.total - self.removed - self.requested
    }
}

pub async fn terminate_all<H>(host: &H, workers: &[WorkerRecord]) -> TerminationSummary
where
    H: TabsApi + BrowsingDataApi,
{
    let results = join_all(workers.iter().map(|worker| terminate_worker(host, worker))).await;
    let summary = TerminationSummary::from_outcomes(&results);

    info!(
        "Terminated workers: {} removed, {} requested, {} failed",
        summary.removed,
        summary.requested,
        summary.failed()
    );
    summary
}
