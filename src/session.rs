/// Popup session state: the site list, search term and selection
use std::collections::BTreeSet;

use crate::site_data::SiteEntry;

/// Totals shown above the site list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SiteStats {
    pub sites: usize,
    pub cookies: usize,
}

/// A change to the popup session
///
/// Listing runs only ever send `SitesPublished`, so the search term and
/// selection typed while a run is in flight survive its publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SitesPublished(Vec<SiteEntry>),
    SetSearch(String),
    ToggleSelected(String),
    ToggleSelectAll,
    RemoveDomains(Vec<String>),
    ClearSelection,
}

/// Everything the popup knows about the current listing
///
/// Passed through the aggregation pipeline and handed back to the UI; each
/// domain appears at most once in `sites`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    sites: Vec<SiteEntry>,
    search_term: String,
    selected: BTreeSet<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the listing and selection, keep the search term
    pub fn reset(&mut self) {
        self.sites.clear();
        self.selected.clear();
    }

    pub fn sites(&self) -> &[SiteEntry] {
        &self.sites
    }

    pub fn find(&self, domain: &str) -> Option<&SiteEntry> {
        self.sites.iter().find(|site| site.domain == domain)
    }

    /// Add one batch of results and re-sort everything by most recent visit
    ///
    /// Entries for domains already listed are ignored.
    pub fn append_batch(&mut self, batch: Vec<SiteEntry>) {
        for entry in batch {
            if self.find(&entry.domain).is_none() {
                self.sites.push(entry);
            }
        }
        self.sites
            .sort_by(|a, b| b.last_visit_time.total_cmp(&a.last_visit_time));
    }

    /// Take a published site list, keeping the search term and any selection
    /// that still names a listed site
    pub fn adopt_sites(&mut self, sites: Vec<SiteEntry>) {
        self.sites = sites;
        let sites = &self.sites;
        self.selected
            .retain(|domain| sites.iter().any(|site| &site.domain == domain));
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SitesPublished(sites) => self.adopt_sites(sites),
            SessionAction::SetSearch(term) => self.set_search_term(&term),
            SessionAction::ToggleSelected(domain) => self.toggle_selected(&domain),
            SessionAction::ToggleSelectAll => {
                self.toggle_select_all();
            }
            SessionAction::RemoveDomains(domains) => self.remove_domains(&domains),
            SessionAction::ClearSelection => self.clear_selection(),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    /// Sites matching the search term by domain or title, case-insensitively
    pub fn visible(&self) -> Vec<&SiteEntry> {
        let term = self.search_term.trim().to_lowercase();
        if term.is_empty() {
            return self.sites.iter().collect();
        }

        self.sites
            .iter()
            .filter(|site| {
                site.domain.to_lowercase().contains(&term) || site.title.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn stats(&self) -> SiteStats {
        let visible = self.visible();
        SiteStats {
            sites: visible.len(),
            cookies: visible.iter().map(|site| site.cookie_count).sum(),
        }
    }

    pub fn remove_domain(&mut self, domain: &str) {
        self.sites.retain(|site| site.domain != domain);
        self.selected.remove(domain);
    }

    pub fn remove_domains(&mut self, domains: &[String]) {
        for domain in domains {
            self.remove_domain(domain);
        }
    }

    pub fn is_selected(&self, domain: &str) -> bool {
        self.selected.contains(domain)
    }

    pub fn toggle_selected(&mut self, domain: &str) {
        if !self.selected.remove(domain) {
            self.selected.insert(domain.to_string());
        }
    }

    pub fn selected(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Select every visible site, or deselect them all if they already are
    ///
    /// Returns true when the visible sites end up selected.
    pub fn toggle_select_all(&mut self) -> bool {
        let visible: Vec<String> = self.visible().iter().map(|site| site.domain.clone()).collect();
        let all_selected = !visible.is_empty() && visible.iter().all(|domain| self.selected.contains(domain));

        if all_selected {
            for domain in &visible {
                self.selected.remove(domain);
            }
            false
        } else {
            self.selected.extend(visible);
            true
        }
    }
}
