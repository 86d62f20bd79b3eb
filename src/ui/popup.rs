/// Popup UI for Site Data Cleaner

use std::rc::Rc;

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use patternfly_yew::prelude::*;
use crate::chrome::ChromeHost;
use crate::deletion::{clear_browsing_history, delete_site, delete_sites, remove_service_workers};
use crate::error::LoadError;
use crate::export::{ExportData, download_export};
use crate::fetcher::{SiteDetail, fetch_site_detail};
use crate::host::Clock;
use crate::i18n::{Lang, Msg, site_deleted, sites_deleted, sites_loaded, text, workers_terminated};
use crate::pipeline::{CancelToken, PipelineConfig, SiteLoader};
use crate::session::{SessionAction, SessionState};
use crate::settings::ExtensionSettings;
use crate::site_data::WorkerRecord;
use crate::workers::{Termination, apply_termination, collect_workers, terminate_all, terminate_worker};
use super::components::{SiteDetailPanel, SiteRow, StatsBar, WorkerRow};

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Success(String),
    Error(String),
}

#[derive(Clone, Copy, PartialEq)]
enum ActiveTab {
    Sites,
    Workers,
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: SessionAction) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        next.into()
    }
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Rebuild the site list, publishing each batch's sites into `session`
fn spawn_load(
    loader: SiteLoader,
    cancel: CancelToken,
    settings: ExtensionSettings,
    current: SessionState,
    session: UseReducerDispatcher<SessionState>,
    state: UseStateHandle<AppState>,
    lang: Lang,
) {
    state.set(AppState::Loading(text(lang, Msg::Loading).to_string()));

    spawn_local(async move {
        let publish = {
            let session = session.clone();
            move |partial: &SessionState| {
                session.dispatch(SessionAction::SitesPublished(partial.sites().to_vec()));
            }
        };
        let config = PipelineConfig::from_settings(&settings);

        match loader.load_sites(&ChromeHost, current, config, &cancel, publish).await {
            Ok(_) if cancel.is_cancelled() => {}
            Ok(loaded) => {
                let count = loaded.sites().len();
                session.dispatch(SessionAction::SitesPublished(loaded.sites().to_vec()));
                state.set(AppState::Success(sites_loaded(lang, count)));
            }
            Err(LoadError::AlreadyRunning) => {
                log::debug!("Site listing already running");
            }
            Err(e) => {
                state.set(AppState::Error(e.to_string()));
            }
        }
    });
}

#[function_component(App)]
pub fn app() -> Html {
    let lang = *use_state(Lang::detect);
    let state = use_state(|| AppState::Idle);
    let session = use_reducer(SessionState::new);
    let settings = use_state(ExtensionSettings::new);
    let loader = use_state(SiteLoader::new);
    let cancel = use_state(CancelToken::new);
    let detail = use_state(|| None::<(String, SiteDetail)>);
    let workers = use_state(Vec::<WorkerRecord>::new);
    let active_tab = use_state(|| ActiveTab::Sites);

    // Read settings on mount, list sites when auto refresh is on; stop the
    // pipeline when the popup closes
    {
        let state = state.clone();
        let session = session.dispatcher();
        let settings = settings.clone();
        let loader = (*loader).clone();
        let cancel = (*cancel).clone();

        use_effect_with((), move |_| {
            let run_cancel = cancel.clone();
            spawn_local(async move {
                let loaded = ChromeHost.load_settings().await;
                settings.set(loaded.clone());
                if loaded.auto_refresh {
                    spawn_load(loader, run_cancel, loaded, SessionState::new(), session, state, lang);
                }
            });
            move || cancel.cancel()
        });
    }

    let on_refresh = {
        let state = state.clone();
        let session = session.clone();
        let settings = settings.clone();
        let loader = loader.clone();
        let cancel = cancel.clone();

        Callback::from(move |_: MouseEvent| {
            spawn_load(
                (*loader).clone(),
                (*cancel).clone(),
                (*settings).clone(),
                (*session).clone(),
                session.dispatcher(),
                state.clone(),
                lang,
            );
        })
    };

    let on_search_input = {
        let session = session.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                session.dispatch(SessionAction::SetSearch(input.value()));
            }
        })
    };

    let on_toggle_site = {
        let session = session.clone();
        Callback::from(move |domain: String| session.dispatch(SessionAction::ToggleSelected(domain)))
    };

    let on_select_all = {
        let session = session.clone();
        Callback::from(move |_: MouseEvent| session.dispatch(SessionAction::ToggleSelectAll))
    };

    // Delete one site: its current cookies one by one, everything else by origin
    let on_delete_site = {
        let state = state.clone();
        let session = session.dispatcher();

        Callback::from(move |domain: String| {
            if !confirm(&format!("{}\n\n{}", domain, text(lang, Msg::ConfirmDeleteSite))) {
                return;
            }

            let state = state.clone();
            let session = session.clone();

            state.set(AppState::Loading(format!("{} {}", domain, text(lang, Msg::Loading))));

            spawn_local(async move {
                match delete_site(&ChromeHost, &domain).await {
                    Ok(()) => {
                        session.dispatch(SessionAction::RemoveDomains(vec![domain.clone()]));
                        state.set(AppState::Success(site_deleted(lang, &domain)));
                    }
                    Err(e) => {
                        state.set(AppState::Error(format!("{}: {}", text(lang, Msg::DeleteError), e)));
                    }
                }
            });
        })
    };

    let on_delete_selected = {
        let state = state.clone();
        let session = session.clone();

        Callback::from(move |_: MouseEvent| {
            let selected = session.selected();
            if selected.is_empty() {
                return;
            }
            if !confirm(&format!("{} ({})", text(lang, Msg::ConfirmDeleteSelected), selected.len())) {
                return;
            }

            let state = state.clone();
            let session = session.dispatcher();
            state.set(AppState::Loading(text(lang, Msg::Loading).to_string()));

            spawn_local(async move {
                let report = delete_sites(&ChromeHost, &selected).await;

                session.dispatch(SessionAction::RemoveDomains(report.deleted.clone()));
                session.dispatch(SessionAction::ClearSelection);

                let summary = sites_deleted(lang, report.deleted.len(), selected.len());
                if report.is_complete() {
                    state.set(AppState::Success(summary));
                } else {
                    let failed: Vec<&str> = report.failed.iter().map(|(domain, _)| domain.as_str()).collect();
                    state.set(AppState::Error(format!("{} ({})", summary, failed.join(", "))));
                }
            });
        })
    };

    let on_clear_history = {
        let state = state.clone();

        Callback::from(move |_: MouseEvent| {
            if !confirm(text(lang, Msg::ConfirmClearHistory)) {
                return;
            }

            let state = state.clone();
            state.set(AppState::Loading(text(lang, Msg::Loading).to_string()));

            spawn_local(async move {
                match clear_browsing_history(&ChromeHost).await {
                    Ok(()) => state.set(AppState::Success(text(lang, Msg::HistoryCleared).to_string())),
                    Err(e) => state.set(AppState::Error(e.to_string())),
                }
            });
        })
    };

    let on_export = {
        let state = state.clone();
        let session = session.clone();

        Callback::from(move |_: MouseEvent| {
            let state = state.clone();
            let now = ChromeHost.now();
            let data = ExportData::new(session.sites(), now);

            spawn_local(async move {
                if let Err(e) = download_export(&ChromeHost, &data, now).await {
                    state.set(AppState::Error(e.to_string()));
                }
            });
        })
    };

    let on_details = {
        let state = state.clone();
        let detail = detail.clone();

        Callback::from(move |domain: String| {
            let state = state.clone();
            let detail = detail.clone();
            state.set(AppState::Loading(text(lang, Msg::Loading).to_string()));

            spawn_local(async move {
                let loaded = fetch_site_detail(&ChromeHost, &domain).await;
                detail.set(Some((domain, loaded)));
                state.set(AppState::Idle);
            });
        })
    };

    let on_close_details = {
        let detail = detail.clone();
        Callback::from(move |_: ()| detail.set(None))
    };

    // Service workers are removed per host; the panel is refreshed afterwards
    let on_remove_service_worker = {
        let state = state.clone();
        let detail = detail.clone();

        Callback::from(move |scope: String| {
            let Some((domain, _)) = (*detail).clone() else {
                return;
            };
            if !confirm(&format!("{}\n\n{}", scope, text(lang, Msg::ConfirmRemoveServiceWorker))) {
                return;
            }

            let state = state.clone();
            let detail = detail.clone();

            spawn_local(async move {
                match remove_service_workers(&ChromeHost, &domain).await {
                    Ok(()) => {
                        let refreshed = fetch_site_detail(&ChromeHost, &domain).await;
                        detail.set(Some((domain, refreshed)));
                        state.set(AppState::Success(text(lang, Msg::ServiceWorkerRemoved).to_string()));
                    }
                    Err(e) => state.set(AppState::Error(e.to_string())),
                }
            });
        })
    };

    let on_load_workers = {
        let state = state.clone();
        let workers = workers.clone();

        Callback::from(move |_: ()| {
            let state = state.clone();
            let workers = workers.clone();
            state.set(AppState::Loading(text(lang, Msg::Loading).to_string()));

            spawn_local(async move {
                workers.set(collect_workers(&ChromeHost).await);
                state.set(AppState::Idle);
            });
        })
    };

    let on_terminate_worker = {
        let state = state.clone();
        let workers = workers.clone();

        Callback::from(move |worker: WorkerRecord| {
            if !confirm(&format!("{}\n\nID: {}", text(lang, Msg::ConfirmTerminateWorker), worker.id)) {
                return;
            }

            let state = state.clone();
            let workers = workers.clone();

            spawn_local(async move {
                let outcome = terminate_worker(&ChromeHost, &worker).await;
                workers.set(apply_termination(&workers, &worker, &outcome));

                match outcome {
                    Termination::Removed => {
                        state.set(AppState::Success(text(lang, Msg::ServiceWorkerRemoved).to_string()))
                    }
                    Termination::RequestSent => {
                        state.set(AppState::Success(text(lang, Msg::TerminationRequested).to_string()))
                    }
                    Termination::Failed(reason) => state.set(AppState::Error(reason)),
                }
            });
        })
    };

    let on_terminate_all = {
        let state = state.clone();
        let workers = workers.clone();

        Callback::from(move |_: MouseEvent| {
            if workers.is_empty() {
                return;
            }
            if !confirm(&format!("{} ({})", text(lang, Msg::ConfirmTerminateAll), workers.len())) {
                return;
            }

            let state = state.clone();
            let workers = workers.clone();
            let targets = (*workers).clone();
            state.set(AppState::Loading(text(lang, Msg::Loading).to_string()));

            spawn_local(async move {
                let summary = terminate_all(&ChromeHost, &targets).await;
                workers.set(collect_workers(&ChromeHost).await);
                state.set(AppState::Success(workers_terminated(lang, &summary)));
            });
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));

    // Tab click handlers; opening the workers tab collects them
    let on_tab_click = {
        let active_tab = active_tab.clone();
        let on_load_workers = on_load_workers.clone();
        move |tab: ActiveTab| {
            let active_tab = active_tab.clone();
            let on_load_workers = on_load_workers.clone();
            Callback::from(move |_: MouseEvent| {
                active_tab.set(tab);
                if tab == ActiveTab::Workers {
                    on_load_workers.emit(());
                }
            })
        }
    };

    let now = ChromeHost.now();
    let visible = session.visible();
    let stats = session.stats();
    let selected_count = session.selected().len();
    let all_visible_selected = !visible.is_empty() && visible.iter().all(|site| session.is_selected(&site.domain));

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{text(lang, Msg::ExtensionName)}</h1>

            // Tab navigation
            <div class="pf-v5-c-tabs tabs-nav">
                <ul class="pf-v5-c-tabs__list">
                    <li class={if *active_tab == ActiveTab::Sites { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                        <button class="pf-v5-c-tabs__link" onclick={on_tab_click(ActiveTab::Sites)}>
                            <span class="pf-v5-c-tabs__item-text">{text(lang, Msg::Sites)}</span>
                        </button>
                    </li>
                    <li class={if *active_tab == ActiveTab::Workers { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                        <button class="pf-v5-c-tabs__link" onclick={on_tab_click(ActiveTab::Workers)}>
                            <span class="pf-v5-c-tabs__item-text">{text(lang, Msg::Workers)}</span>
                        </button>
                    </li>
                </ul>
            </div>

            // Status display
            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Success(msg) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Success} title={msg.clone()} inline={true}>
                        </Alert>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            // Tab content
            <div class="tab-pane-content">
                {match *active_tab {
                    ActiveTab::Sites => html! {
                        <div class="flex-column-gap">
                            if let Some((domain, site_detail)) = (*detail).clone() {
                                <SiteDetailPanel
                                    lang={lang}
                                    domain={domain}
                                    detail={site_detail}
                                    now={now}
                                    on_remove_service_worker={on_remove_service_worker.clone()}
                                    on_close={on_close_details.clone()}
                                />
                            }

                            <div class="search-container">
                                <input
                                    type="text"
                                    placeholder={text(lang, Msg::SearchPlaceholder)}
                                    value={session.search_term().to_string()}
                                    oninput={on_search_input}
                                    class="search-input"
                                />
                            </div>

                            <StatsBar lang={lang} stats={stats} />

                            <div class="toolbar">
                                <Button onclick={on_refresh} disabled={is_busy} variant={ButtonVariant::Secondary}>
                                    {format!("🔄 {}", text(lang, Msg::RefreshList))}
                                </Button>
                                <Button onclick={on_select_all} variant={ButtonVariant::Secondary}>
                                    {text(lang, if all_visible_selected { Msg::DeselectAll } else { Msg::SelectAll })}
                                </Button>
                                <Button
                                    onclick={on_delete_selected}
                                    disabled={is_busy || selected_count == 0}
                                    variant={ButtonVariant::Danger}
                                >
                                    {format!("{} ({})", text(lang, Msg::DeleteSelected), selected_count)}
                                </Button>
                            </div>

                            if visible.is_empty() && !is_busy {
                                <div class="empty-state">
                                    <p>{text(lang, Msg::NoSites)}</p>
                                </div>
                            } else {
                                <div class="sites-list">
                                    {for visible.iter().map(|site| html! {
                                        <SiteRow
                                            key={site.domain.clone()}
                                            lang={lang}
                                            site={(*site).clone()}
                                            now={now}
                                            selected={session.is_selected(&site.domain)}
                                            disabled={is_busy}
                                            on_toggle={on_toggle_site.clone()}
                                            on_delete={on_delete_site.clone()}
                                            on_details={on_details.clone()}
                                        />
                                    })}
                                </div>
                            }

                            <div class="toolbar">
                                <Button onclick={on_export} disabled={session.sites().is_empty()} variant={ButtonVariant::Secondary}>
                                    {format!("💾 {}", text(lang, Msg::Export))}
                                </Button>
                                <Button onclick={on_clear_history} disabled={is_busy} variant={ButtonVariant::Danger}>
                                    {format!("🕘 {}", text(lang, Msg::ClearHistory))}
                                </Button>
                            </div>
                        </div>
                    },
                    ActiveTab::Workers => html! {
                        <div class="flex-column-gap">
                            <div class="toolbar">
                                <span class="stat-item">{format!("{}: {}", text(lang, Msg::Workers), workers.len())}</span>
                                <Button onclick={on_load_workers.reform(|_: MouseEvent| ())} disabled={is_busy} variant={ButtonVariant::Secondary}>
                                    {format!("🔄 {}", text(lang, Msg::RefreshList))}
                                </Button>
                                <Button
                                    onclick={on_terminate_all}
                                    disabled={is_busy || workers.is_empty()}
                                    variant={ButtonVariant::Danger}
                                >
                                    {text(lang, Msg::TerminateAll)}
                                </Button>
                            </div>

                            if workers.is_empty() && !is_busy {
                                <div class="empty-state">
                                    <p>{text(lang, Msg::NoWorkers)}</p>
                                </div>
                            } else {
                                <div class="workers-list">
                                    {for workers.iter().map(|worker| html! {
                                        <WorkerRow
                                            key={format!("{}:{}", worker.kind.label(), worker.id)}
                                            lang={lang}
                                            worker={worker.clone()}
                                            disabled={is_busy}
                                            on_terminate={on_terminate_worker.clone()}
                                        />
                                    })}
                                </div>
                            }
                        </div>
                    },
                }}
            </div>

            <p class="footer-popup">
                {format!("{} v{}", text(lang, Msg::ExtensionName), env!("CARGO_PKG_VERSION"))}
            </p>
        </div>
    }
}
