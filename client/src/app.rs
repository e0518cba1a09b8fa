use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::api::HttpBackend;
use crate::config;
use crate::controller::{Command, Controller};
use crate::dashboard::DashboardView;
use crate::host::BrowserHost;
use crate::map_canvas::{CanvasMap, MapCanvas, MapHandle};
use crate::session::Session;
use crate::sidebar::Sidebar;
use crate::timeline::Timeline;

pub(crate) const SIDEBAR_WIDTH: f64 = 340.0;

type BrowserSession = Session<HttpBackend, CanvasMap, BrowserHost>;

/// Latest published dashboard state, shared with every component through context.
#[derive(Clone, Copy)]
pub(crate) struct Dashboard(pub RwSignal<DashboardView>);

struct WindowListener {
    window: web_sys::Window,
    event: &'static str,
    _handler: Closure<dyn Fn(web_sys::Event)>,
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback(self.event, self._handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static SESSION: RefCell<Option<BrowserSession>> = const { RefCell::new(None) };
    static WINDOW_LISTENERS: RefCell<Vec<WindowListener>> = const { RefCell::new(Vec::new()) };
}

/// Send a command to the running session. No-op before the app is mounted.
pub(crate) fn dispatch(command: Command) {
    // Clone out first: the session may re-enter the slot while handling the command.
    let session = SESSION.with(|slot| slot.borrow().clone());
    if let Some(session) = session {
        session.dispatch(command);
    }
}

fn listen(window: &web_sys::Window, event: &'static str, handler: impl Fn(web_sys::Event) + 'static) {
    let handler = Closure::<dyn Fn(web_sys::Event)>::new(handler);
    if window
        .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
        .is_err()
    {
        tracing::warn!(event, "failed to register window listener");
        return;
    }
    WINDOW_LISTENERS.with(|slot| {
        slot.borrow_mut().push(WindowListener {
            window: window.clone(),
            event,
            _handler: handler,
        });
    });
}

fn typing_in_input(e: &web_sys::Event) -> bool {
    let tag = e
        .target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
        .map(|el| el.tag_name())
        .unwrap_or_default();
    tag == "INPUT" || tag == "TEXTAREA" || tag == "SELECT"
}

fn bind_window(map: MapHandle) {
    WINDOW_LISTENERS.with(|slot| slot.borrow_mut().clear());
    let Some(window) = web_sys::window() else {
        return;
    };

    let keyboard_map = map.clone();
    listen(&window, "keydown", move |e| {
        if typing_in_input(&e) {
            return;
        }
        let Ok(e) = e.dyn_into::<web_sys::KeyboardEvent>() else {
            return;
        };
        if e.ctrl_key() || e.meta_key() || e.alt_key() {
            return;
        }
        match e.key().as_str() {
            " " => {
                e.prevent_default();
                dispatch(Command::TogglePlay);
            }
            "[" => dispatch(Command::Slower),
            "]" => dispatch(Command::Faster),
            "r" | "0" => keyboard_map.refit(),
            _ => {}
        }
    });

    listen(&window, "resize", move |_| map.request_repaint());
}

#[component]
pub fn App() -> impl IntoView {
    let dashboard = RwSignal::new(DashboardView::default());
    provide_context(Dashboard(dashboard));

    let map = MapHandle::new();
    let session = Session::new(
        Controller::default(),
        HttpBackend::new(config::API_ALGORITHM_PATH),
        CanvasMap::new(map.clone()),
        BrowserHost::new(dashboard),
    );
    session.publish();
    SESSION.with(|slot| {
        *slot.borrow_mut() = Some(session);
    });
    bind_window(map.clone());
    tracing::info!("dashboard mounted");

    view! {
        <div style="width: 100%; height: 100%; display: flex; background: #0c0e17; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;">
            <div style={format!("width: {SIDEBAR_WIDTH}px; flex-shrink: 0; height: 100%; overflow-y: auto; background: #13161f; border-right: 1px solid #282c3e;")}>
                <Sidebar />
            </div>
            <div style="flex: 1; min-width: 0; height: 100%; display: flex; flex-direction: column;">
                <div style="flex: 1; min-height: 0; position: relative;">
                    <MapCanvas map=map />
                </div>
                <Timeline />
            </div>
        </div>
    }
}
