/// Batched site aggregation: history → domains → paced per-site lookups
use std::cell::Cell;
use std::rc::Rc;

use futures::future::join_all;
use log::{debug, info};

use crate::domain::{HISTORY_LOOKBACK_MS, group_domains};
use crate::error::LoadError;
use crate::fetcher::fetch_site;
use crate::host::{BrowserHost, HistoryQuery};
use crate::session::SessionState;
use crate::settings::ExtensionSettings;
use crate::site_data::DomainRecord;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Pause between batches so hundreds of cookie and history queries are not
/// issued at once
pub const BATCH_DELAY_MS: u32 = 50;

pub const HISTORY_MAX_RESULTS: u32 = 500;

/// Cooperative cancellation flag, checked between batches
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u32,
}

impl PipelineConfig {
    pub fn from_settings(settings: &ExtensionSettings) -> Self {
        PipelineConfig {
            batch_size: settings.effective_batch_size(),
            ..Default::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: BATCH_DELAY_MS,
        }
    }
}

/// Run domains through the per-site fetcher one batch at a time
///
/// Every fetch in a batch runs concurrently and the batch waits for all of
/// them. After each batch the session is re-sorted and handed to `publish`.
/// Cancellation is only observed between batches; whatever was gathered so far
/// stays in the returned session.
pub async fn aggregate_sites<H, F>(
    host: &H,
    domains: &[DomainRecord],
    mut session: SessionState,
    config: PipelineConfig,
    cancel: &CancelToken,
    mut publish: F,
) -> SessionState
where
    H: BrowserHost,
    F: FnMut(&SessionState),
{
    let batch_size = config.batch_size.max(1);
    let batch_count = domains.len().div_ceil(batch_size);

    for (index, batch) in domains.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            info!("Site listing cancelled after {} of {} batches", index, batch_count);
            break;
        }

        let results = join_all(batch.iter().map(|record| fetch_site(host, record))).await;
        let found: Vec<_> = results.into_iter().flatten().collect();
        debug!("Batch {}/{}: {} of {} domains listed", index + 1, batch_count, found.len(), batch.len());

        session.append_batch(found);

        if !cancel.is_cancelled() {
            publish(&session);
        }

        if index + 1 < batch_count && !cancel.is_cancelled() {
            host.sleep(config.batch_delay_ms).await;
        }
    }

    session
}

/// Clears the busy flag when a run ends, however it ends
struct BusyGuard(Rc<Cell<bool>>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Entry point for listing sites; allows one run at a time
#[derive(Debug, Clone, Default)]
pub struct SiteLoader {
    busy: Rc<Cell<bool>>,
}

impl SiteLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Rebuild the site list from the last 30 days of history
    ///
    /// Rejected with [`LoadError::AlreadyRunning`] while another run is active.
    pub async fn load_sites<H, F>(
        &self,
        host: &H,
        mut session: SessionState,
        config: PipelineConfig,
        cancel: &CancelToken,
        mut publish: F,
    ) -> Result<SessionState, LoadError>
    where
        H: BrowserHost,
        F: FnMut(&SessionState),
    {
        if self.busy.replace(true) {
            return Err(LoadError::AlreadyRunning);
        }
        let _guard = BusyGuard(self.busy.clone());

        session.reset();
        publish(&session);

        let query = HistoryQuery {
            text: String::new(),
            max_results: HISTORY_MAX_RESULTS,
            start_time: host.now() - HISTORY_LOOKBACK_MS,
        };
        let history = host.search_history(&query).await.map_err(LoadError::History)?;

        let domains = group_domains(&history);
        info!("Checking {} domains from {} history entries", domains.len(), history.len());

        Ok(aggregate_sites(host, &domains, session, config, cancel, publish).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::session::SessionAction;
    use crate::site_data::DataType;
    use crate::testing::{FakeHost, HostCall, create_test_cookie};
    use futures::FutureExt;
    use futures::executor::block_on;

    fn create_test_record(domain: &str, last_visit_time: f64) -> DomainRecord {
        DomainRecord {
            domain: domain.to_string(),
            last_visit_time,
            title: domain.to_string(),
            url: format!("https://{}/", domain),
        }
    }

    /// `count` domains that each have one cookie, oldest first
    fn create_cookie_host(count: usize) -> (FakeHost, Vec<DomainRecord>) {
        let mut host = FakeHost::new();
        let mut records = Vec::new();
        for i in 0..count {
            let domain = format!("site{}.example.com", i);
            host = host.with_cookies(&domain, vec![create_test_cookie("sid", &domain)]);
            records.push(create_test_record(&domain, host.now - (count - i) as f64 * 1_000.0));
        }
        (host, records)
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = ExtensionSettings::default();
        settings.batch_size = 25;
        assert_eq!(PipelineConfig::from_settings(&settings).batch_size, 25);

        settings.batch_size = 0;
        assert_eq!(PipelineConfig::from_settings(&settings).batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_aggregate_publishes_after_every_batch() {
        let (host, records) = create_cookie_host(25);
        let mut published = Vec::new();

        let session = block_on(aggregate_sites(
            &host,
            &records,
            SessionState::new(),
            PipelineConfig::default(),
            &CancelToken::new(),
            |s: &SessionState| published.push(s.sites().len()),
        ));

        assert_eq!(published, vec![10, 20, 25]);
        assert_eq!(session.sites().len(), 25);
        // Newest visit first
        assert_eq!(session.sites()[0].domain, "site24.example.com");

        let sleeps: Vec<HostCall> = host
            .calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::Sleep(_)))
            .collect();
        assert_eq!(sleeps, vec![HostCall::Sleep(50), HostCall::Sleep(50)]);
    }

    #[test]
    fn test_search_typed_during_load_survives_publishes() {
        let (host, records) = create_cookie_host(25);
        let mut shown = SessionState::new();
        let mut publishes = 0;

        block_on(aggregate_sites(
            &host,
            &records,
            SessionState::new(),
            PipelineConfig::default(),
            &CancelToken::new(),
            |partial: &SessionState| {
                shown.apply(SessionAction::SitesPublished(partial.sites().to_vec()));
                publishes += 1;
                if publishes == 1 {
                    shown.apply(SessionAction::SetSearch("site1".to_string()));
                    shown.apply(SessionAction::ToggleSelected("site1.example.com".to_string()));
                }
            },
        ));

        assert_eq!(publishes, 3);
        assert_eq!(shown.sites().len(), 25);
        assert_eq!(shown.search_term(), "site1");
        assert!(shown.is_selected("site1.example.com"));
        // site1 and site10..site19
        assert_eq!(shown.visible().len(), 11);
    }

    #[test]
    fn test_cancel_after_second_batch_stops_lookups() {
        let (host, records) = create_cookie_host(50);
        let cancel = CancelToken::new();
        let publish_cancel = cancel.clone();
        let mut batches_seen = 0;

        let session = block_on(aggregate_sites(
            &host,
            &records,
            SessionState::new(),
            PipelineConfig::default(),
            &cancel,
            |_: &SessionState| {
                batches_seen += 1;
                if batches_seen == 2 {
                    publish_cancel.cancel();
                }
            },
        ));

        assert_eq!(batches_seen, 2);
        assert_eq!(session.sites().len(), 20);

        let queried = host.cookie_queries();
        assert_eq!(queried.len(), 40);
        for i in 20..50 {
            let domain = format!("site{}.example.com", i);
            assert!(!queried.contains(&domain));
        }
    }

    #[test]
    fn test_cancelled_before_start_does_nothing() {
        let (host, records) = create_cookie_host(5);
        let cancel = CancelToken::new();
        cancel.cancel();

        let session = block_on(aggregate_sites(
            &host,
            &records,
            SessionState::new(),
            PipelineConfig::default(),
            &cancel,
            |_: &SessionState| {
                panic!("nothing should be published");
            },
        ));

        assert!(session.sites().is_empty());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_load_sites_end_to_end() {
        let host = FakeHost::new()
            .with_visit("https://shop.example.com/", 30.0)
            .with_visit("https://shop.example.com/cart", 20.0)
            .with_visit("https://shop.example.com/checkout", 10.0)
            .with_visit("https://rare.example.com/", 60.0)
            .with_cookies(
                "shop.example.com",
                vec![create_test_cookie("cart", "shop.example.com"), create_test_cookie("sid", "shop.example.com")],
            );
        let loader = SiteLoader::new();

        let session = block_on(loader.load_sites(
            &host,
            SessionState::new(),
            PipelineConfig::default(),
            &CancelToken::new(),
            |_: &SessionState| {},
        ))
        .unwrap();

        assert_eq!(session.sites().len(), 1);
        let shop = session.find("shop.example.com").unwrap();
        assert_eq!(shop.cookie_count, 2);
        assert_eq!(shop.visit_frequency, 3);
        assert!(shop.data_types.contains(&DataType::Cookies));
        assert!(session.find("rare.example.com").is_none());
        assert!(!loader.is_busy());

        match &host.calls()[0] {
            HostCall::SearchHistory(query) => {
                assert_eq!(query.text, "");
                assert_eq!(query.max_results, 500);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_load_sites_rejects_concurrent_run() {
        let host = FakeHost::new().with_visit("https://example.com/", 1.0);
        let loader = SiteLoader::new();
        let inner_loader = loader.clone();
        let mut inner_result = None;

        // A load started from inside the first run's publish callback
        let outer = block_on(loader.load_sites(
            &host,
            SessionState::new(),
            PipelineConfig::default(),
            &CancelToken::new(),
            |_: &SessionState| {
                if inner_result.is_none() {
                    inner_result = inner_loader
                        .load_sites(
                            &host,
                            SessionState::new(),
                            PipelineConfig::default(),
                            &CancelToken::new(),
                            |_: &SessionState| {},
                        )
                        .now_or_never();
                }
            },
        ));

        assert!(outer.is_ok());
        assert_eq!(inner_result, Some(Err(LoadError::AlreadyRunning)));
        assert!(!loader.is_busy());
    }

    #[test]
    fn test_load_sites_history_failure() {
        let mut host = FakeHost::new();
        host.history_error = Some("history disabled".to_string());
        let loader = SiteLoader::new();

        let result = block_on(loader.load_sites(
            &host,
            SessionState::new(),
            PipelineConfig::default(),
            &CancelToken::new(),
            |_: &SessionState| {},
        ));

        assert_eq!(
            result,
            Err(LoadError::History(HostError::Lookup("history disabled".to_string())))
        );
        assert!(!loader.is_busy());
    }
}
