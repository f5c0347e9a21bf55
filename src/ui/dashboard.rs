/// Options-page dashboard: one column per tracked tab, live updates and broadcast input

use crate::bridge;
use crate::config::{DASHBOARD_PORT_NAME, Settings};
use crate::dispatch::{self, ChromeTabs, Dispatcher, InputThrottle};
use crate::error::LoggerError;
use crate::messages::{AllLogsResponse, Request};
use crate::storage;
use crate::tab_data::{TabId, TabLogs};
use crate::ui::components::{LogColumn, StatsLine};
use crate::ui::live::{LiveRefresh, TimerAction};
use crate::ui::reconcile::{
    DashboardViewState, FocusStep, ReconcilePlan, ViewportMetrics, cycle_focus,
};
use patternfly_yew::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

const INPUT_MAX_HEIGHT_PX: i32 = 140;

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let plan = use_state(ReconcilePlan::default);
    let error = use_state(|| None::<String>);
    let flashing = use_state(Vec::<TabId>::new);
    let auto_refresh = use_state(|| Settings::default().auto_refresh);
    let focused = use_mut_ref(|| None::<TabId>);
    let force_update = use_force_update();
    let settings = use_mut_ref(Settings::default);
    let view_state = use_mut_ref(DashboardViewState::new);
    let live = use_mut_ref(LiveLink::default);
    let throttle = use_mut_ref(|| InputThrottle::new(Settings::default().input_throttle_ms));
    let pending_scroll = use_mut_ref(|| None::<ViewportMetrics>);
    let flash_generation = use_mut_ref(|| 0u32);
    let columns_ref = use_node_ref();
    let input_ref = use_node_ref();

    let refresh = {
        let refresher = Refresher {
            plan: plan.clone(),
            error: error.clone(),
            flashing: flashing.clone(),
            settings: settings.clone(),
            view_state: view_state.clone(),
            pending_scroll: pending_scroll.clone(),
            flash_generation: flash_generation.clone(),
            columns_ref: columns_ref.clone(),
        };
        Callback::from(move |_: ()| {
            let refresher = refresher.clone();
            spawn_local(refresher.run());
        })
    };

    // Load settings, open the push port and take the first snapshot
    {
        let refresh = refresh.clone();
        let settings = settings.clone();
        let throttle = throttle.clone();
        let auto_refresh = auto_refresh.clone();
        let live = live.clone();

        use_effect_with((), move |_| {
            let live_on_unmount = live.clone();
            spawn_local(async move {
                let loaded = storage::load_settings().await;
                *throttle.borrow_mut() = InputThrottle::new(loaded.input_throttle_ms);
                auto_refresh.set(loaded.auto_refresh);
                {
                    let mut link = live.borrow_mut();
                    link.policy = LiveRefresh::new(&loaded);
                    link.refresh = refresh.clone();
                }
                *settings.borrow_mut() = loaded;
                open_port(&live);
                refresh.emit(());
            });
            move || live_on_unmount.borrow_mut().stop_timer()
        });
    }

    // Jump to the trailing edge once new columns are on screen
    {
        let columns_ref = columns_ref.clone();
        let pending_scroll = pending_scroll.clone();

        use_effect_with((*plan).clone(), move |plan| {
            let before = pending_scroll.borrow_mut().take();
            if let (Some(before), Some(columns)) = (before, columns_ref.cast::<Element>()) {
                let left = plan.settled_scroll_left(&before, f64::from(columns.scroll_width()));
                columns.set_scroll_left(left as i32);
            }
            || ()
        });
    }

    // Alt+ArrowRight / Alt+ArrowLeft cycle the focused column
    {
        let focused = focused.clone();
        let view_state = view_state.clone();
        let force_update = force_update.clone();

        use_effect_with((), move |_| {
            let listener = Closure::wrap(Box::new(move |e: web_sys::KeyboardEvent| {
                if !e.alt_key() {
                    return;
                }
                let step = match e.key().as_str() {
                    "ArrowRight" => FocusStep::Next,
                    "ArrowLeft" => FocusStep::Previous,
                    _ => return,
                };
                e.prevent_default();
                let tab_ids = view_state.borrow().known_tab_ids();
                let next = cycle_focus(&tab_ids, *focused.borrow(), step);
                *focused.borrow_mut() = next;
                force_update.force_update();
            }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

            let window = web_sys::window();
            if let Some(window) = &window {
                let callback: &js_sys::Function = listener.as_ref().unchecked_ref();
                if let Err(e) = window.add_event_listener_with_callback("keydown", callback) {
                    log::warn!("Focus shortcuts unavailable: {:?}", e);
                }
            }
            move || {
                if let Some(window) = window {
                    let callback: &js_sys::Function = listener.as_ref().unchecked_ref();
                    let removed = window.remove_event_listener_with_callback("keydown", callback);
                    if let Err(e) = removed {
                        log::debug!("Could not remove focus shortcuts: {:?}", e);
                    }
                }
            }
        });
    }

    let on_refresh = refresh.reform(|_: MouseEvent| ());

    let on_clear = {
        let refresh = refresh.clone();
        Callback::from(move |_: MouseEvent| send_then_refresh(Request::ClearLogs, refresh.clone()))
    };

    let on_remove = {
        let refresh = refresh.clone();
        Callback::from(move |tab_id: TabId| {
            send_then_refresh(
                Request::RemoveTabLogs {
                    tab_id: Some(tab_id),
                },
                refresh.clone(),
            )
        })
    };

    let on_copy = {
        let plan = plan.clone();
        Callback::from(move |tab_id: TabId| {
            let Some(column) = plan.columns.iter().find(|c| c.tab_id == tab_id) else {
                return;
            };
            let text = column.body.clone();
            spawn_local(async move {
                if let Err(e) = bridge::copyToClipboard(&text).await {
                    log::warn!("Copy failed: {:?}", e);
                }
            });
        })
    };

    let on_auto_toggle = {
        let auto_refresh = auto_refresh.clone();
        let settings = settings.clone();
        let live = live.clone();

        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let enabled = input.checked();
            auto_refresh.set(enabled);
            {
                let mut link = live.borrow_mut();
                let action = link.policy.set_auto_refresh(enabled);
                link.apply(action);
            }

            settings.borrow_mut().auto_refresh = enabled;
            let snapshot = settings.borrow().clone();
            spawn_local(async move {
                if let Err(e) = storage::save_settings(&snapshot).await {
                    log::warn!("Failed to save settings: {}", e);
                }
            });
        })
    };

    let on_input = {
        let input_ref = input_ref.clone();
        let throttle = throttle.clone();
        let settings = settings.clone();

        Callback::from(move |_: InputEvent| {
            let Some(area) = input_ref.cast::<HtmlTextAreaElement>() else {
                return;
            };
            grow_to_fit(&area);
            if !throttle.borrow_mut().allow(js_sys::Date::now()) {
                return;
            }
            broadcast(settings.borrow().chat_patterns.clone(), area.value(), false);
        })
    };

    let submit = {
        let input_ref = input_ref.clone();
        let settings = settings.clone();

        Callback::from(move |_: ()| {
            let Some(area) = input_ref.cast::<HtmlTextAreaElement>() else {
                return;
            };
            let text = area.value();
            area.set_value("");
            grow_to_fit(&area);
            broadcast(settings.borrow().chat_patterns.clone(), text, true);
        })
    };

    let on_send_click = submit.reform(|_: MouseEvent| ());

    let on_input_keydown = {
        let submit = submit.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" && !e.shift_key() {
                e.prevent_default();
                submit.emit(());
            }
        })
    };

    let focused_id = *focused.borrow();

    html! {
        <div class="dashboard">
            <div class="toolbar">
                <h1 class="dashboard-title">{"AI Response Logs"}</h1>
                <div class="toolbar-actions">
                    <Button onclick={on_refresh} variant={ButtonVariant::Secondary}>
                        {"Refresh"}
                    </Button>
                    <Button onclick={on_clear} variant={ButtonVariant::Danger}>
                        {"Clear"}
                    </Button>
                    <label class="auto-toggle">
                        <input type="checkbox" checked={*auto_refresh} onchange={on_auto_toggle} />
                        {" Auto-refresh"}
                    </label>
                </div>
                <StatsLine text={plan.stats_line()} error={(*error).clone()} />
            </div>

            <div ref={columns_ref} class="columns">
                if plan.columns.is_empty() {
                    <div class="empty-state">
                        <p>{"No responses captured yet."}</p>
                        <p class="empty-state-hint">{"Open a chat tab and ask something."}</p>
                    </div>
                }
                {for plan.columns.iter().map(|column| html! {
                    <LogColumn
                        key={column.tab_id.to_string()}
                        column={column.clone()}
                        flashing={flashing.contains(&column.tab_id)}
                        focused={focused_id == Some(column.tab_id)}
                        on_copy={on_copy.clone()}
                        on_remove={on_remove.clone()}
                    />
                })}
            </div>

            <div class="composer">
                <textarea
                    ref={input_ref}
                    class="multi-input"
                    rows="1"
                    placeholder="Type to mirror into every chat tab, Enter to send"
                    oninput={on_input}
                    onkeydown={on_input_keydown}
                />
                <Button onclick={on_send_click} variant={ButtonVariant::Primary}>
                    {"Send to all"}
                </Button>
            </div>
        </div>
    }
}

/// Everything a refresh writes to
#[derive(Clone)]
struct Refresher {
    plan: UseStateHandle<ReconcilePlan>,
    error: UseStateHandle<Option<String>>,
    flashing: UseStateHandle<Vec<TabId>>,
    settings: Rc<RefCell<Settings>>,
    view_state: Rc<RefCell<DashboardViewState>>,
    pending_scroll: Rc<RefCell<Option<ViewportMetrics>>>,
    flash_generation: Rc<RefCell<u32>>,
    columns_ref: NodeRef,
}

impl Refresher {
    async fn run(self) {
        let logs = match fetch_logs().await {
            Ok(logs) => logs,
            Err(e) => {
                log::warn!("Failed to fetch logs: {}", e);
                self.error.set(Some(format!("Failed to fetch logs: {}", e)));
                return;
            }
        };

        let (tolerance_px, flash_ms) = {
            let settings = self.settings.borrow();
            (settings.scroll_edge_tolerance_px, settings.flash_duration_ms)
        };
        // Measured before the new columns render
        let before = viewport(&self.columns_ref);
        let was_at_end = before.is_none_or(|metrics| metrics.is_at_trailing_edge(tolerance_px));

        let next = self.view_state.borrow_mut().reconcile(&logs, was_at_end);
        *self.pending_scroll.borrow_mut() = if next.scroll_to_end { before } else { None };

        let grown = next.grown_tabs();
        if !grown.is_empty() {
            self.flash(grown, flash_ms);
        }
        self.error.set(None);
        self.plan.set(next);
    }

    fn flash(&self, tab_ids: Vec<TabId>, duration_ms: u32) {
        let generation = {
            let mut current = self.flash_generation.borrow_mut();
            *current = current.wrapping_add(1);
            *current
        };
        self.flashing.set(tab_ids);

        let flashing = self.flashing.clone();
        let current = self.flash_generation.clone();
        let clear = Closure::once_into_js(move || {
            // A newer flash owns the highlight now
            if *current.borrow() == generation {
                flashing.set(Vec::new());
            }
        });
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                clear.unchecked_ref(),
                duration_ms as i32,
            ) {
                log::warn!("Could not schedule highlight reset: {:?}", e);
            }
        }
    }
}

/// Push port and polling timer of the dashboard
#[derive(Default)]
struct LiveLink {
    policy: LiveRefresh,
    refresh: Callback<()>,
    port_handlers: Vec<Closure<dyn FnMut()>>,
    timer: Option<(i32, Closure<dyn FnMut()>)>,
}

impl LiveLink {
    fn apply(&mut self, action: TimerAction) {
        match action {
            TimerAction::Start(interval_ms) => self.start_timer(interval_ms),
            TimerAction::Stop => self.stop_timer(),
            TimerAction::Keep => {}
        }
    }

    fn start_timer(&mut self, interval_ms: u32) {
        self.stop_timer();
        let Some(window) = web_sys::window() else {
            return;
        };
        let refresh = self.refresh.clone();
        let tick = Closure::wrap(Box::new(move || refresh.emit(())) as Box<dyn FnMut()>);
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            interval_ms as i32,
        ) {
            Ok(handle) => {
                log::debug!("Polling every {}ms", interval_ms);
                self.timer = Some((handle, tick));
            }
            Err(e) => log::warn!("Could not start polling: {:?}", e),
        }
    }

    fn stop_timer(&mut self) {
        if let Some((handle, _tick)) = self.timer.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(handle);
            }
            log::debug!("Polling stopped");
        }
    }
}

fn open_port(live: &Rc<RefCell<LiveLink>>) {
    let refresh = live.borrow().refresh.clone();
    let on_message = Closure::wrap(Box::new(move || refresh.emit(())) as Box<dyn FnMut()>);

    let weak = Rc::downgrade(live);
    let on_disconnect = Closure::wrap(Box::new(move || {
        if let Some(live) = weak.upgrade() {
            log::info!("Background port disconnected");
            port_lost(&live);
        }
    }) as Box<dyn FnMut()>);

    match bridge::connectPort(
        DASHBOARD_PORT_NAME,
        on_message.as_ref().unchecked_ref(),
        on_disconnect.as_ref().unchecked_ref(),
    ) {
        Ok(_port) => {
            log::info!("Connected to background on port {:?}", DASHBOARD_PORT_NAME);
            let mut link = live.borrow_mut();
            link.port_handlers = vec![on_message, on_disconnect];
            let action = link.policy.port_opened();
            link.apply(action);
        }
        Err(e) => {
            log::warn!("Background port unavailable: {:?}", e);
            port_lost(live);
        }
    }
}

fn port_lost(live: &Rc<RefCell<LiveLink>>) {
    let mut link = live.borrow_mut();
    let action = link.policy.port_lost();
    link.apply(action);
}

fn viewport(columns_ref: &NodeRef) -> Option<ViewportMetrics> {
    columns_ref.cast::<Element>().map(|columns| ViewportMetrics {
        scroll_left: f64::from(columns.scroll_left()),
        client_width: f64::from(columns.client_width()),
        scroll_width: f64::from(columns.scroll_width()),
    })
}

async fn send_request(request: &Request) -> Result<JsValue, LoggerError> {
    let message = storage::to_js(request)?;
    bridge::sendRuntimeMessage(message)
        .await
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))
}

async fn fetch_logs() -> Result<TabLogs, LoggerError> {
    let response = send_request(&Request::GetAllLogs).await?;
    if response.is_null() || response.is_undefined() {
        return Err(LoggerError::Bridge("no response from background".to_string()));
    }
    let response: AllLogsResponse = serde_wasm_bindgen::from_value(response)?;
    Ok(response.tab_logs)
}

fn send_then_refresh(request: Request, refresh: Callback<()>) {
    spawn_local(async move {
        if let Err(e) = send_request(&request).await {
            log::warn!("Request failed: {}", e);
        }
        refresh.emit(());
    });
}

fn broadcast(patterns: Vec<String>, text: String, submit: bool) {
    spawn_local(async move {
        let tabs = dispatch::query_open_tabs().await;
        let dispatcher = Dispatcher::new(patterns);
        if submit {
            dispatcher.broadcast_submit(&tabs, &text, &ChromeTabs);
        } else {
            dispatcher.broadcast_text(&tabs, &text, &ChromeTabs);
        }
    });
}

/// Let the input box grow with its content, up to a cap
fn grow_to_fit(area: &HtmlTextAreaElement) {
    let style = area.style();
    if let Err(e) = style.set_property("height", "auto") {
        log::debug!("Could not reset input height: {:?}", e);
        return;
    }
    let height = area.scroll_height().min(INPUT_MAX_HEIGHT_PX);
    if let Err(e) = style.set_property("height", &format!("{}px", height)) {
        log::debug!("Could not grow input: {:?}", e);
    }
}
