use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;

use trajview_shared::SECONDS_PER_DAY;
use trajview_shared::time::{format_date, format_time_of_day, parse_date};

use crate::app::{Dashboard, dispatch};
use crate::controller::Command;

const SCRUB_DEBOUNCE_MS: u32 = 150;

const BUTTON_STYLE: &str = "display: inline-flex; align-items: center; justify-content: center; min-width: 30px; height: 28px; padding: 0 8px; background: #1a1d2a; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 4px; cursor: pointer; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem;";
const DATE_INPUT_STYLE: &str = "background: #13161f; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 3px; padding: 3px 5px; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem; color-scheme: dark;";

/// Date range, time-of-day scrubber and playback controls.
#[component]
pub fn Timeline() -> impl IntoView {
    let Dashboard(dashboard) = expect_context();

    // Slider position while the user drags, before the debounced command lands.
    let scrub = RwSignal::new(None::<u32>);
    let debounce_timeout = Rc::new(RefCell::new(None::<Timeout>));

    let on_range_input = {
        let debounce_timeout = Rc::clone(&debounce_timeout);
        move |e: web_sys::Event| {
            let Ok(secs) = event_target_value(&e).parse::<u32>() else {
                return;
            };
            scrub.set(Some(secs));

            if let Some(timeout) = debounce_timeout.borrow_mut().take() {
                timeout.cancel();
            }
            let timeout = Timeout::new(SCRUB_DEBOUNCE_MS, move || {
                dispatch(Command::SetTimeOfDay(secs));
                scrub.set(None);
            });
            *debounce_timeout.borrow_mut() = Some(timeout);
        }
    };

    let slider_value = move || scrub.get().unwrap_or_else(|| dashboard.with(|v| v.time_of_day));
    let slider_max = move || {
        dashboard.with(|v| SECONDS_PER_DAY.saturating_sub(v.granularity.max(1)))
    };
    let running = move || dashboard.with(|v| v.running);
    let controls_enabled = move || dashboard.with(|v| v.controls_enabled);

    let play_svg = r#"<svg width="12" height="14" viewBox="0 0 12 14" fill="currentColor" xmlns="http://www.w3.org/2000/svg"><path d="M1 1.5v11l10-5.5z"/></svg>"#;
    let pause_svg = r#"<svg width="12" height="14" viewBox="0 0 12 14" fill="currentColor" xmlns="http://www.w3.org/2000/svg"><rect x="1" y="1" width="3.5" height="12" rx="0.75"/><rect x="7.5" y="1" width="3.5" height="12" rx="0.75"/></svg>"#;

    view! {
        <div style="flex-shrink: 0; display: flex; flex-direction: column; gap: 8px; padding: 10px 14px; background: #13161f; border-top: 1px solid #282c3e;">
            <div style="display: flex; align-items: center; gap: 14px; flex-wrap: wrap; font-size: 0.78rem; color: #9a9590;">
                <label style="display: flex; align-items: center; gap: 6px;">
                    "Start"
                    <input
                        type="date"
                        style=DATE_INPUT_STYLE
                        prop:value=move || dashboard.with(|v| v.start_date.map(format_date).unwrap_or_default())
                        on:change=move |e| {
                            let raw = event_target_value(&e);
                            dispatch(Command::SetStartDate(parse_date(raw.trim())));
                        }
                    />
                </label>
                <label style="display: flex; align-items: center; gap: 6px;">
                    "End"
                    <input
                        type="date"
                        style=DATE_INPUT_STYLE
                        prop:value=move || dashboard.with(|v| format_date(v.end_date))
                        on:change=move |e| {
                            match parse_date(event_target_value(&e).trim()) {
                                Some(date) => dispatch(Command::SetEndDate(date)),
                                // The end date is mandatory; re-run the binding to restore the field.
                                None => dashboard.update(|_| {}),
                            }
                        }
                    />
                </label>
                <button
                    style=BUTTON_STYLE
                    title="Request the current window again"
                    prop:disabled=move || !controls_enabled()
                    on:click=move |_| dispatch(Command::Refresh)
                >
                    "Refresh"
                </button>
                <span style="margin-left: auto; font-family: 'JetBrains Mono', monospace; color: #e2e0d8; font-variant-numeric: tabular-nums;">
                    {move || dashboard.with(|v| v.display_time.clone())}
                </span>
            </div>
            <div style="display: flex; align-items: center; gap: 8px;">
                <button
                    style=BUTTON_STYLE
                    title="Slower ([)"
                    prop:disabled=move || !dashboard.with(|v| v.can_go_slower)
                    on:click=move |_| dispatch(Command::Slower)
                >
                    "-"
                </button>
                <button
                    style=BUTTON_STYLE
                    title="Play / pause (space)"
                    prop:disabled=move || !controls_enabled() && !running()
                    on:click=move |_| dispatch(Command::TogglePlay)
                    inner_html=move || if running() { pause_svg } else { play_svg }
                />
                <button
                    style=BUTTON_STYLE
                    title="Faster (])"
                    prop:disabled=move || !dashboard.with(|v| v.can_go_faster)
                    on:click=move |_| dispatch(Command::Faster)
                >
                    "+"
                </button>
                <span style="min-width: 72px; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #7c829e;">
                    {move || dashboard.with(|v| v.speed_label.clone())}
                </span>
                <input
                    type="range"
                    min="0"
                    max=move || slider_max().to_string()
                    step=move || dashboard.with(|v| v.granularity.max(1)).to_string()
                    prop:value=move || slider_value().to_string()
                    style="flex: 1; accent-color: #a855f7;"
                    on:input=on_range_input
                />
                <span style="min-width: 64px; text-align: right; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem; color: #e2e0d8;">
                    {move || format_time_of_day(slider_value())}
                </span>
            </div>
            <div style:color=move || if dashboard.with(|v| v.status.is_failed()) { "#e53935" } else { "#5a5860" }
                style="min-height: 1em; font-size: 0.68rem; font-family: 'JetBrains Mono', monospace;"
            >
                {move || dashboard.with(|v| v.status.label())}
            </div>
        </div>
    }
}
