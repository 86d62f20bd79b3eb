/// Korean and English UI strings
use js_sys::Reflect;
use wasm_bindgen::JsValue;

use crate::dates::VisitAge;
use crate::workers::TerminationSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    Ko,
    #[default]
    En,
}

impl Lang {
    /// Korean for any `ko*` language tag, English otherwise
    pub fn from_tag(tag: &str) -> Lang {
        if tag.to_lowercase().starts_with("ko") {
            Lang::Ko
        } else {
            Lang::En
        }
    }

    /// English when no tag is available
    pub fn from_optional_tag(tag: Option<String>) -> Lang {
        tag.map(|tag| Lang::from_tag(&tag)).unwrap_or_default()
    }

    /// Language of the running browser
    ///
    /// Reads `navigator.language` from the global scope, so it works in the
    /// background service worker as well as in extension pages.
    pub fn detect() -> Lang {
        let tag = Reflect::get(&js_sys::global(), &JsValue::from_str("navigator"))
            .ok()
            .filter(|navigator| navigator.is_object())
            .and_then(|navigator| Reflect::get(&navigator, &JsValue::from_str("language")).ok())
            .and_then(|language| language.as_string());
        Lang::from_optional_tag(tag)
    }
}

/// Fixed UI strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    ExtensionName,
    SearchPlaceholder,
    DeleteButton,
    SelectAll,
    DeselectAll,
    DeleteSelected,
    Cookies,
    ServiceWorkers,
    Loading,
    NoSites,
    RefreshList,
    ClearHistory,
    Export,
    Details,
    Close,
    Sites,
    Workers,
    TerminateWorker,
    TerminateAll,
    NoWorkers,
    Visits,
    ConfirmDeleteSite,
    ConfirmDeleteSelected,
    ConfirmClearHistory,
    ConfirmRemoveServiceWorker,
    ConfirmTerminateWorker,
    ConfirmTerminateAll,
    DeleteError,
    HistoryCleared,
    ServiceWorkerRemoved,
    TerminationRequested,
}

pub fn text(lang: Lang, msg: Msg) -> &'static str {
    match lang {
        Lang::Ko => korean(msg),
        Lang::En => english(msg),
    }
}

fn korean(msg: Msg) -> &'static str {
    match msg {
        Msg::ExtensionName => "사이트 데이터 정리",
        Msg::SearchPlaceholder => "사이트 검색...",
        Msg::DeleteButton => "삭제",
        Msg::SelectAll => "전체 선택",
        Msg::DeselectAll => "전체 해제",
        Msg::DeleteSelected => "선택 삭제",
        Msg::Cookies => "쿠키",
        Msg::ServiceWorkers => "서비스 워커",
        Msg::Loading => "로딩 중...",
        Msg::NoSites => "저장된 데이터가 있는 사이트가 없습니다",
        Msg::RefreshList => "목록 새로고침",
        Msg::ClearHistory => "방문 기록 삭제",
        Msg::Export => "내보내기",
        Msg::Details => "세부 정보",
        Msg::Close => "닫기",
        Msg::Sites => "사이트",
        Msg::Workers => "Worker",
        Msg::TerminateWorker => "종료",
        Msg::TerminateAll => "모두 종료",
        Msg::NoWorkers => "실행 중인 Worker가 없습니다",
        Msg::Visits => "방문 기록",
        Msg::ConfirmDeleteSite => "사이트의 모든 데이터를 삭제하시겠습니까?\n\n※ 방문 기록은 삭제되지 않습니다.",
        Msg::ConfirmDeleteSelected => "선택한 사이트의 데이터를 삭제하시겠습니까?\n\n※ 방문 기록은 삭제되지 않습니다.",
        Msg::ConfirmClearHistory => {
            "⚠️ 경고: 최근 30일의 모든 방문 기록이 삭제됩니다!\n(모든 사이트의 방문 기록이 삭제됩니다)\n\n이 작업은 되돌릴 수 없습니다."
        }
        Msg::ConfirmRemoveServiceWorker => "Service Worker를 삭제하시겠습니까?\n\n이 작업은 되돌릴 수 없습니다.",
        Msg::ConfirmTerminateWorker => "Worker를 종료하시겠습니까?\n\n이 작업은 되돌릴 수 없습니다.",
        Msg::ConfirmTerminateAll => "모든 Worker를 종료하시겠습니까?\n\n이 작업은 되돌릴 수 없습니다.",
        Msg::DeleteError => "삭제 중 오류가 발생했습니다",
        Msg::HistoryCleared => "방문 기록 삭제 완료!",
        Msg::ServiceWorkerRemoved => "Service Worker가 삭제되었습니다.",
        Msg::TerminationRequested => "Worker 종료 요청을 보냈습니다.",
    }
}

fn english(msg: Msg) -> &'static str {
    match msg {
        Msg::ExtensionName => "Site Data Cleaner",
        Msg::SearchPlaceholder => "Search sites...",
        Msg::DeleteButton => "Delete",
        Msg::SelectAll => "Select All",
        Msg::DeselectAll => "Deselect All",
        Msg::DeleteSelected => "Delete Selected",
        Msg::Cookies => "Cookies",
        Msg::ServiceWorkers => "Service Workers",
        Msg::Loading => "Loading...",
        Msg::NoSites => "No sites with stored data found",
        Msg::RefreshList => "Refresh List",
        Msg::ClearHistory => "Clear History",
        Msg::Export => "Export",
        Msg::Details => "Details",
        Msg::Close => "Close",
        Msg::Sites => "Sites",
        Msg::Workers => "Workers",
        Msg::TerminateWorker => "Terminate",
        Msg::TerminateAll => "Terminate All",
        Msg::NoWorkers => "No running workers found",
        Msg::Visits => "Visits",
        Msg::ConfirmDeleteSite => "Delete all data for this site?\n\nBrowsing history is kept.",
        Msg::ConfirmDeleteSelected => "Delete data for the selected sites?\n\nBrowsing history is kept.",
        Msg::ConfirmClearHistory => {
            "⚠️ Warning: this deletes ALL browsing history from the last 30 days, for every site.\n\nThis cannot be undone."
        }
        Msg::ConfirmRemoveServiceWorker => "Remove this Service Worker?\n\nThis cannot be undone.",
        Msg::ConfirmTerminateWorker => "Terminate this worker?\n\nThis cannot be undone.",
        Msg::ConfirmTerminateAll => "Terminate all workers?\n\nThis cannot be undone.",
        Msg::DeleteError => "An error occurred during deletion",
        Msg::HistoryCleared => "Browsing history cleared",
        Msg::ServiceWorkerRemoved => "Service Worker removed",
        Msg::TerminationRequested => "Asked the page to stop the worker",
    }
}

pub fn visit_age_label(lang: Lang, age: &VisitAge) -> String {
    match (lang, age) {
        (Lang::Ko, VisitAge::Today) => "오늘".to_string(),
        (Lang::Ko, VisitAge::Yesterday) => "어제".to_string(),
        (Lang::Ko, VisitAge::DaysAgo(days)) => format!("{}일 전", days),
        (Lang::En, VisitAge::Today) => "Today".to_string(),
        (Lang::En, VisitAge::Yesterday) => "Yesterday".to_string(),
        (Lang::En, VisitAge::DaysAgo(days)) => format!("{} days ago", days),
        (_, VisitAge::On(date)) => date.clone(),
    }
}

pub fn sites_found(lang: Lang, count: usize) -> String {
    match lang {
        Lang::Ko => format!("{}개 사이트 발견", count),
        Lang::En => format!("{} sites found", count),
    }
}

pub fn sites_loaded(lang: Lang, count: usize) -> String {
    match lang {
        Lang::Ko => format!("완료! {}개 사이트 로드됨", count),
        Lang::En => format!("Done! {} sites loaded", count),
    }
}

pub fn site_deleted(lang: Lang, domain: &str) -> String {
    match lang {
        Lang::Ko => format!("{}의 데이터가 삭제되었습니다.", domain),
        Lang::En => format!("Data for {} was deleted.", domain),
    }
}

pub fn sites_deleted(lang: Lang, deleted: usize, total: usize) -> String {
    match lang {
        Lang::Ko => format!("{}/{}개 사이트 삭제 완료", deleted, total),
        Lang::En => format!("Deleted {}/{} sites", deleted, total),
    }
}

/// Bulk termination result; page requests are counted apart from removals
pub fn workers_terminated(lang: Lang, summary: &TerminationSummary) -> String {
    match lang {
        Lang::Ko => format!(
            "{}/{}개 Worker 삭제, {}개 종료 요청 전송",
            summary.removed, summary.total, summary.requested
        ),
        Lang::En => format!(
            "Removed {}/{} workers, asked pages to stop {}",
            summary.removed, summary.total, summary.requested
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_from_tag() {
        assert_eq!(Lang::from_tag("ko"), Lang::Ko);
        assert_eq!(Lang::from_tag("ko-KR"), Lang::Ko);
        assert_eq!(Lang::from_tag("KO-kr"), Lang::Ko);
        assert_eq!(Lang::from_tag("en-US"), Lang::En);
        assert_eq!(Lang::from_tag("ja"), Lang::En);
        assert_eq!(Lang::from_tag(""), Lang::En);
    }

    #[test]
    fn test_text_lookup() {
        assert_eq!(text(Lang::En, Msg::ExtensionName), "Site Data Cleaner");
        assert_eq!(text(Lang::Ko, Msg::ExtensionName), "사이트 데이터 정리");
        assert_eq!(text(Lang::Ko, Msg::SelectAll), "전체 선택");
    }

    #[test]
    fn test_visit_age_labels() {
        assert_eq!(visit_age_label(Lang::Ko, &VisitAge::Today), "오늘");
        assert_eq!(visit_age_label(Lang::Ko, &VisitAge::DaysAgo(3)), "3일 전");
        assert_eq!(visit_age_label(Lang::En, &VisitAge::Yesterday), "Yesterday");
        assert_eq!(
            visit_age_label(Lang::En, &VisitAge::On("2024-10-01".to_string())),
            "2024-10-01"
        );
    }

    #[test]
    fn test_formatted_messages() {
        assert_eq!(sites_found(Lang::En, 12), "12 sites found");
        assert_eq!(site_deleted(Lang::Ko, "example.com"), "example.com의 데이터가 삭제되었습니다.");
        let summary = TerminationSummary {
            removed: 1,
            requested: 2,
            total: 4,
        };
        assert_eq!(workers_terminated(Lang::En, &summary), "Removed 1/4 workers, asked pages to stop 2");
        assert_eq!(workers_terminated(Lang::Ko, &summary), "1/4개 Worker 삭제, 2개 종료 요청 전송");
    }

    #[test]
    fn test_lang_without_tag_is_english() {
        assert_eq!(Lang::from_optional_tag(None), Lang::En);
        assert_eq!(Lang::from_optional_tag(Some("ko-KR".to_string())), Lang::Ko);
    }

    #[test]
    fn test_termination_messages_differ() {
        for lang in [Lang::Ko, Lang::En] {
            assert_ne!(text(lang, Msg::TerminationRequested), text(lang, Msg::ServiceWorkerRemoved));
        }
    }
}
