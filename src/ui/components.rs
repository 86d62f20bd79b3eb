/// Rows and panels for the popup lists

use yew::prelude::*;
use patternfly_yew::prelude::*;
use crate::dates::visit_age;
use crate::fetcher::SiteDetail;
use crate::i18n::{Lang, Msg, text, visit_age_label};
use crate::session::SiteStats;
use crate::site_data::{SiteEntry, WorkerRecord};

fn age_label(lang: Lang, timestamp: f64, now: f64) -> String {
    visit_age_label(lang, &visit_age(timestamp, now))
}

#[derive(Properties, PartialEq)]
pub struct StatsBarProps {
    pub lang: Lang,
    pub stats: SiteStats,
}

#[function_component(StatsBar)]
pub fn stats_bar(props: &StatsBarProps) -> Html {
    html! {
        <div class="stats-bar">
            <span class="stat-item">{crate::i18n::sites_found(props.lang, props.stats.sites)}</span>
            <span class="stat-item">
                {format!("{}: {}", text(props.lang, Msg::Cookies), props.stats.cookies)}
            </span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SiteRowProps {
    pub lang: Lang,
    pub site: SiteEntry,
    pub now: f64,
    pub selected: bool,
    pub disabled: bool,
    pub on_toggle: Callback<String>,
    pub on_delete: Callback<String>,
    pub on_details: Callback<String>,
}

#[function_component(SiteRow)]
pub fn site_row(props: &SiteRowProps) -> Html {
    let site = &props.site;
    let domain = site.domain.clone();

    html! {
        <div class={if props.selected { "site-item selected" } else { "site-item" }}>
            <input
                type="checkbox"
                class="site-checkbox"
                checked={props.selected}
                onchange={props.on_toggle.reform({
                    let domain = domain.clone();
                    move |_: Event| domain.clone()
                })}
            />
            <div class="site-info">
                <div class="site-domain">{&site.domain}</div>
                <div class="site-title">{&site.title}</div>
                <div class="site-meta">
                    {format!("🍪 {}", site.cookie_count)}
                    if site.service_worker_count > 0 {
                        {format!(" • ⚙️ {}", site.service_worker_count)}
                    }
                    {format!(" • {}", age_label(props.lang, site.last_visit_time, props.now))}
                </div>
                <div class="site-tags">
                    {for site.data_types.iter().map(|data_type| html! {
                        <span class="data-type-tag">{data_type.tag()}</span>
                    })}
                </div>
            </div>
            <div class="site-actions">
                <Button
                    onclick={props.on_details.reform({
                        let domain = domain.clone();
                        move |_: MouseEvent| domain.clone()
                    })}
                    variant={ButtonVariant::Secondary}
                >
                    {text(props.lang, Msg::Details)}
                </Button>
                <Button
                    onclick={props.on_delete.reform(move |_: MouseEvent| domain.clone())}
                    disabled={props.disabled}
                    variant={ButtonVariant::Danger}
                >
                    {text(props.lang, Msg::DeleteButton)}
                </Button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SiteDetailPanelProps {
    pub lang: Lang,
    pub domain: String,
    pub detail: SiteDetail,
    pub now: f64,
    pub on_remove_service_worker: Callback<String>,
    pub on_close: Callback<()>,
}

#[function_component(SiteDetailPanel)]
pub fn site_detail_panel(props: &SiteDetailPanelProps) -> Html {
    let lang = props.lang;
    let detail = &props.detail;

    html! {
        <div class="detail-panel">
            <div class="detail-header">
                <h2 class="detail-title">{format!("{} - {}", props.domain, text(lang, Msg::Details))}</h2>
                <Button onclick={props.on_close.reform(|_: MouseEvent| ())} variant={ButtonVariant::Secondary}>
                    {"✕"}
                </Button>
            </div>

            <h3 class="detail-section">{format!("{} ({})", text(lang, Msg::Cookies), detail.cookies.len())}</h3>
            <ul class="detail-list">
                {for detail.cookies.iter().map(|cookie| html! {
                    <li class="detail-item">
                        <strong>{&cookie.name}</strong>
                        <small>{format!(" {}{}", cookie.domain, cookie.path)}</small>
                        if cookie.secure {
                            <span class="data-type-tag">{"Secure"}</span>
                        }
                        if cookie.http_only {
                            <span class="data-type-tag">{"HttpOnly"}</span>
                        }
                    </li>
                })}
            </ul>

            <h3 class="detail-section">
                {format!("{} ({})", text(lang, Msg::ServiceWorkers), detail.service_workers.len())}
            </h3>
            <ul class="detail-list">
                {for detail.service_workers.iter().map(|worker| {
                    let scope = worker.scope.clone();
                    html! {
                        <li class="detail-item">
                            <div>{&worker.scope}</div>
                            <small>
                                {worker.state.clone().unwrap_or_else(|| "unknown".to_string())}
                            </small>
                            <Button
                                onclick={props.on_remove_service_worker.reform(move |_: MouseEvent| scope.clone())}
                                variant={ButtonVariant::Danger}
                            >
                                {text(lang, Msg::DeleteButton)}
                            </Button>
                        </li>
                    }
                })}
            </ul>

            <h3 class="detail-section">{format!("{} ({})", text(lang, Msg::Visits), detail.visits.len())}</h3>
            <ul class="detail-list">
                {for detail.visits.iter().map(|visit| html! {
                    <li class="detail-item">
                        <div class="visit-title">{visit.title.clone().unwrap_or_else(|| visit.url.clone())}</div>
                        <small>
                            {format!("{} • {}", age_label(lang, visit.last_visit_time, props.now), visit.visit_count.max(1))}
                        </small>
                    </li>
                })}
            </ul>

            <Button onclick={props.on_close.reform(|_: MouseEvent| ())} variant={ButtonVariant::Secondary} block={true}>
                {text(lang, Msg::Close)}
            </Button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct WorkerRowProps {
    pub lang: Lang,
    pub worker: WorkerRecord,
    pub disabled: bool,
    pub on_terminate: Callback<WorkerRecord>,
}

#[function_component(WorkerRow)]
pub fn worker_row(props: &WorkerRowProps) -> Html {
    let worker = props.worker.clone();

    html! {
        <div class="worker-item">
            <div class="worker-info">
                <div class="worker-type">{props.worker.kind.label()}</div>
                <div class="worker-id">{&props.worker.id}</div>
                <small class="worker-meta">
                    {format!("{} • {} • {}", props.worker.domain, props.worker.state, props.worker.tab_title)}
                </small>
            </div>
            <Button
                onclick={props.on_terminate.reform(move |_: MouseEvent| worker.clone())}
                disabled={props.disabled}
                variant={ButtonVariant::Danger}
            >
                {text(props.lang, Msg::TerminateWorker)}
            </Button>
        </div>
    }
}
