/// Hostname extraction, validation and grouping of history entries
use std::collections::HashMap;

use url::Url;

use crate::site_data::{DomainRecord, HistoryItem};

pub const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// How far back history is searched
pub const HISTORY_LOOKBACK_MS: f64 = 30.0 * DAY_MS;

/// Browser-internal hosts that never carry removable site data
const INTERNAL_PREFIXES: [&str; 2] = ["chrome", "moz-extension"];

/// Extract the hostname from a URL
///
/// Returns `None` when the URL does not parse or has no host
/// (e.g. `file:///tmp/a.html`, `about:blank`).
pub fn extract_hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_lowercase())
}

/// Check whether a hostname is worth listing
///
/// Rejects empty names, browser-internal hosts, anything mentioning
/// `localhost`, single-label names and names of three characters or fewer.
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && !INTERNAL_PREFIXES.iter().any(|prefix| domain.starts_with(prefix))
        && !domain.contains("localhost")
        && domain.contains('.')
        && domain.len() > 3
}

/// Whether a URL is served over http or https
pub fn is_web_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Whether a URL's hostname is exactly `domain` (subdomains do not count)
pub fn url_matches_domain(url: &str, domain: &str) -> bool {
    extract_hostname(url).is_some_and(|host| host == domain)
}

/// The four origins a domain's data may live under
pub fn origins_for(domain: &str) -> Vec<String> {
    vec![
        format!("https://{}", domain),
        format!("http://{}", domain),
        format!("https://www.{}", domain),
        format!("http://www.{}", domain),
    ]
}

/// Tab match pattern for every page on exactly this host
pub fn tab_pattern(domain: &str) -> String {
    format!("*://{}/*", domain)
}

/// Reduce history entries to one record per hostname, most recent visit wins
///
/// Records come back in the order their hostname was first seen. Entries whose
/// URL does not parse are skipped. On an exact timestamp tie the earlier record
/// is kept.
pub fn group_domains(items: &[HistoryItem]) -> Vec<DomainRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<DomainRecord> = Vec::new();

    for item in items {
        let Some(domain) = extract_hostname(&item.url) else {
            continue;
        };
        if !is_valid_domain(&domain) {
            continue;
        }

        let record = DomainRecord {
            domain: domain.clone(),
            last_visit_time: item.last_visit_time,
            title: item
                .title
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| domain.clone()),
            url: item.url.clone(),
        };

        match index.get(&domain) {
            Some(&pos) => {
                if item.last_visit_time > records[pos].last_visit_time {
                    records[pos] = record;
                }
            }
            None => {
                index.insert(domain, records.len());
                records.push(record);
            }
        }
    }

    records
}
