/// Requests and replies exchanged between extension pages and content scripts
use serde::{Deserialize, Serialize};

use crate::site_data::{ServiceWorkerInfo, SiteDataReport};

/// A request sent to a tab's content script
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentRequest {
    /// Service workers, caches, storage counts and worker scripts of the page
    GetAllSiteData,
    GetServiceWorkers,
    /// Unregister a matching service worker, otherwise ask the page to stop
    /// the named worker
    TerminateWorker {
        #[serde(rename = "workerId")]
        worker_id: String,
    },
}

/// The single reply shape used for every [`ContentRequest`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SiteDataReport>,
    #[serde(default)]
    pub service_workers: Vec<ServiceWorkerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentResponse {
    pub fn site_data(data: SiteDataReport) -> Self {
        ContentResponse {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn service_workers(service_workers: Vec<ServiceWorkerInfo>) -> Self {
        ContentResponse {
            success: true,
            service_workers,
            ..Default::default()
        }
    }

    pub fn done(message: &str) -> Self {
        ContentResponse {
            success: true,
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failed(error: &str) -> Self {
        ContentResponse {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}
