/// JSON export of the listed sites
use log::info;
use serde::Serialize;

use crate::chrome::ChromeHost;
use crate::dates::{calendar_date, iso_timestamp};
use crate::error::{HostError, HostResult};
use crate::settings::SETTINGS_VERSION;
use crate::site_data::{DataType, SiteEntry};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSite {
    pub domain: String,
    pub cookie_count: usize,
    pub visit_frequency: usize,
    pub last_visit_time: f64,
    pub data_types: Vec<DataType>,
}

impl From<&SiteEntry> for ExportedSite {
    fn from(site: &SiteEntry) -> Self {
        ExportedSite {
            domain: site.domain.clone(),
            cookie_count: site.cookie_count,
            visit_frequency: site.visit_frequency,
            last_visit_time: site.last_visit_time,
            data_types: site.data_types.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportData {
    pub timestamp: String,
    pub version: String,
    pub sites: Vec<ExportedSite>,
}

impl ExportData {
    pub fn new<'a>(sites: impl IntoIterator<Item = &'a SiteEntry>, now: f64) -> Self {
        ExportData {
            timestamp: iso_timestamp(now),
            version: SETTINGS_VERSION.to_string(),
            sites: sites.into_iter().map(ExportedSite::from).collect(),
        }
    }

    pub fn to_json(&self) -> HostResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| HostError::Decode(format!("Failed to serialize export: {}", e)))
    }
}

/// `remove-cookie-export-2024-10-28.json`
pub fn export_filename(now: f64) -> String {
    format!("remove-cookie-export-{}.json", calendar_date(now))
}

/// Save the export through the browser's download dialog
pub async fn download_export(host: &ChromeHost, data: &ExportData, now: f64) -> HostResult<()> {
    let json = data.to_json()?;
    let url = format!(
        "data:application/json;charset=utf-8,{}",
        String::from(js_sys::encode_uri_component(&json))
    );

    host.download(&url, &export_filename(now)).await?;
    info!("Exported {} sites", data.sites.len());
    Ok(())
}
