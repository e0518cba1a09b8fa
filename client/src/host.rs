use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::dashboard::DashboardView;
use crate::session::Host;

/// Browser runtime: microtask executor, one cancellable timeout, and a signal the
/// components read the dashboard state from.
pub struct BrowserHost {
    view: RwSignal<DashboardView>,
    tick: RefCell<Option<Timeout>>,
}

impl BrowserHost {
    pub fn new(view: RwSignal<DashboardView>) -> Self {
        Self {
            view,
            tick: RefCell::new(None),
        }
    }
}

impl Host for BrowserHost {
    fn spawn(&self, task: Pin<Box<dyn Future<Output = ()>>>) {
        spawn_local(task);
    }

    fn schedule_tick(&self, delay_ms: u32, fire: Box<dyn FnOnce()>) {
        let timeout = Timeout::new(delay_ms, fire);
        if let Some(old) = self.tick.borrow_mut().replace(timeout) {
            old.cancel();
        }
    }

    fn cancel_tick(&self) {
        if let Some(timeout) = self.tick.borrow_mut().take() {
            timeout.cancel();
        }
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn state_changed(&self, view: DashboardView) {
        self.view.set(view);
    }
}
