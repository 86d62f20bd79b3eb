/// Deleting site data: per-cookie removal, origin-scoped bulk removal, history
use futures::future::join_all;
use log::{info, warn};

use crate::domain::{HISTORY_LOOKBACK_MS, origins_for};
use crate::error::{HostError, HostResult};
use crate::fetcher::cookies_for_domain;
use crate::host::{BrowsingDataApi, Clock, CookieApi, DataTypeSet, RemovalOptions};
use crate::site_data::Cookie;

/// Domains removed concurrently when deleting a selection
pub const SELECTION_BATCH_SIZE: usize = 5;

/// Categories of site data a deletion covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataCategories {
    pub cookies: bool,
    pub local_storage: bool,
    /// Cache Storage
    pub cache: bool,
    pub indexed_db: bool,
    pub service_workers: bool,
    pub web_sql: bool,
}

impl DataCategories {
    pub fn all() -> Self {
        DataCategories {
            cookies: true,
            local_storage: true,
            cache: true,
            indexed_db: true,
            service_workers: true,
            web_sql: true,
        }
    }

    /// Everything but cookies, which are removed one by one instead
    pub fn without_cookies() -> Self {
        DataCategories {
            cookies: false,
            ..Self::all()
        }
    }

    pub fn service_workers_only() -> Self {
        DataCategories {
            service_workers: true,
            ..Default::default()
        }
    }

    pub fn to_data_types(&self) -> DataTypeSet {
        DataTypeSet {
            cookies: self.cookies,
            local_storage: self.local_storage,
            indexed_db: self.indexed_db,
            cache_storage: self.cache,
            service_workers: self.service_workers,
            web_sql: self.web_sql,
            ..Default::default()
        }
    }
}

/// Bulk-remove the selected categories for the four origins of `domain`
pub async fn clear_site_data<H: BrowsingDataApi>(host: &H, domain: &str, categories: DataCategories) -> HostResult<()> {
    let options = RemovalOptions::for_origins(origins_for(domain));
    host.remove_browsing_data(&options, &categories.to_data_types()).await
}

/// Remove each cookie by its exact URL and name, stopping at the first failure
pub async fn remove_cookies<H: CookieApi>(host: &H, cookies: &[Cookie]) -> HostResult<()> {
    for cookie in cookies {
        host.remove_cookie(&cookie.removal_url(), &cookie.name).await?;
    }
    Ok(())
}

/// Delete one site's data, given the cookies known for it
///
/// Cookies go one at a time so that sibling subdomains sharing the registrable
/// domain keep theirs; everything else is removed by origin.
pub async fn delete_site_with_cookies<H>(host: &H, domain: &str, cookies: &[Cookie]) -> HostResult<()>
where
    H: CookieApi + BrowsingDataApi,
{
    remove_cookies(host, cookies).await?;
    clear_site_data(host, domain, DataCategories::without_cookies()).await?;
    info!("Deleted data for {} ({} cookies)", domain, cookies.len());
    Ok(())
}

/// Delete one site's data, reading its current cookies first
pub async fn delete_site<H>(host: &H, domain: &str) -> HostResult<()>
where
    H: CookieApi + BrowsingDataApi,
{
    let cookies = cookies_for_domain(host, domain).await;
    delete_site_with_cookies(host, domain, &cookies).await
}

/// Outcome of deleting several sites at once
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeletionReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, HostError)>,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every category, cookies included, for a selection of domains
///
/// Domains are removed in small concurrent batches; one failing domain does not
/// stop the others.
pub async fn delete_sites<H: BrowsingDataApi>(host: &H, domains: &[String]) -> DeletionReport {
    let mut report = DeletionReport::default();

    for batch in domains.chunks(SELECTION_BATCH_SIZE) {
        let results = join_all(
            batch
                .iter()
                .map(|domain| clear_site_data(host, domain, DataCategories::all())),
        )
        .await;

        for (domain, result) in batch.iter().zip(results) {
            match result {
                Ok(()) => report.deleted.push(domain.clone()),
                Err(e) => {
                    warn!("Deleting {} failed: {}", domain, e);
                    report.failed.push((domain.clone(), e));
                }
            }
        }
    }

    info!("Deleted {}/{} selected sites", report.deleted.len(), domains.len());
    report
}

/// Remove only the service workers of a domain; history and other data stay
pub async fn remove_service_workers<H: BrowsingDataApi>(host: &H, domain: &str) -> HostResult<()> {
    clear_site_data(host, domain, DataCategories::service_workers_only()).await
}

/// Delete browsing history for the whole lookback window
///
/// History cannot be scoped by origin, so this removes every site's history
/// since `now - 30 days`, not just the listed domains.
pub async fn clear_browsing_history<H: BrowsingDataApi + Clock>(host: &H) -> HostResult<()> {
    let options = RemovalOptions::since(host.now() - HISTORY_LOOKBACK_MS);
    let types = DataTypeSet {
        history: true,
        ..Default::default()
    };
    host.remove_browsing_data(&options, &types).await?;
    info!("Cleared browsing history for the last 30 days");
    Ok(())
}
