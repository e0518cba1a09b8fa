use leptos::prelude::*;

use trajview_shared::{AlgorithmId, ParamSpec};

use crate::app::{Dashboard, dispatch};
use crate::colors::path_css;
use crate::controller::Command;
use crate::render::{MetricsRow, MetricsTable};

const SECTION_TITLE_STYLE: &str = "font-family: 'Silkscreen', monospace; font-size: 0.7rem; color: #7c829e; letter-spacing: 0.08em; text-transform: uppercase; margin: 0 0 8px;";

/// Algorithm selection, per-algorithm parameters and the error metrics table.
#[component]
pub fn Sidebar() -> impl IntoView {
    view! {
        <div style="display: flex; flex-direction: column; gap: 18px; padding: 16px 14px;">
            <div style="font-family: 'Silkscreen', monospace; font-size: 1rem; color: #e2e0d8;">
                "Trajectory Simplification"
            </div>
            <section>
                <h2 style=SECTION_TITLE_STYLE>"Algorithms"</h2>
                <div style="display: flex; flex-direction: column; gap: 6px;">
                    {AlgorithmId::SELECTABLE
                        .into_iter()
                        .map(|id| view! { <AlgorithmRow id=id /> })
                        .collect_view()}
                </div>
                <RawLegend />
            </section>
            <section>
                <h2 style=SECTION_TITLE_STYLE>"Error metrics"</h2>
                <ErrorsToggle />
                <MetricsPanel />
            </section>
        </div>
    }
}

#[component]
fn AlgorithmRow(id: AlgorithmId) -> impl IntoView {
    let Dashboard(dashboard) = expect_context();
    let enabled = move || {
        dashboard.with(|v| v.algorithm(id).map(|a| a.enabled).unwrap_or(false))
    };
    let swatch = format!(
        "display: inline-block; width: 14px; height: 4px; border-radius: 2px; background: {};",
        path_css(id, 0.9)
    );

    view! {
        <div style="background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; padding: 8px 10px;">
            <label style="display: flex; align-items: center; gap: 8px; cursor: pointer; font-size: 0.88rem;">
                <input
                    type="checkbox"
                    prop:checked=enabled
                    on:change=move |e| {
                        dispatch(Command::ToggleAlgorithm {
                            id,
                            enabled: event_target_checked(&e),
                        });
                    }
                />
                <span style=swatch />
                <span>{id.label()}</span>
            </label>
            {(!id.params().is_empty()).then(|| view! {
                <div style="display: flex; flex-wrap: wrap; gap: 8px; margin-top: 6px; padding-left: 24px;">
                    {id.params().iter().map(|spec| view! { <ParamInput id=id spec=spec /> }).collect_view()}
                </div>
            })}
        </div>
    }
}

#[component]
fn ParamInput(id: AlgorithmId, spec: &'static ParamSpec) -> impl IntoView {
    let Dashboard(dashboard) = expect_context();
    let param = move || {
        dashboard.with(|v| {
            v.algorithm(id)
                .and_then(|a| a.params.iter().find(|p| p.name == spec.name))
                .map(|p| (p.value, p.input_enabled))
                .unwrap_or((spec.default, false))
        })
    };

    view! {
        <label style="display: flex; flex-direction: column; gap: 2px; font-size: 0.7rem; color: #9a9590;">
            {spec.label}
            <input
                type="number"
                min=spec.min.map(|m| m.to_string())
                max=spec.max.map(|m| m.to_string())
                step=spec.step.to_string()
                prop:value=move || param().0.to_string()
                prop:disabled=move || !param().1
                style="width: 88px; background: #13161f; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 3px; padding: 3px 5px; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem;"
                on:change=move |e| {
                    match event_target_value(&e).trim().parse::<f64>() {
                        Ok(value) => dispatch(Command::SetParam {
                            id,
                            name: spec.name.to_string(),
                            value,
                        }),
                        Err(err) => {
                            tracing::debug!(algorithm = %id, param = spec.name, %err, "ignoring unparsable input");
                        }
                    }
                }
            />
        </label>
    }
}

#[component]
fn RawLegend() -> impl IntoView {
    let Dashboard(dashboard) = expect_context();
    let swatch = format!(
        "display: inline-block; width: 14px; height: 4px; border-radius: 2px; background: {};",
        path_css(AlgorithmId::Raw, 0.9)
    );
    view! {
        <div style="display: flex; align-items: center; gap: 8px; margin-top: 8px; font-size: 0.75rem; color: #9a9590;">
            <span style=swatch />
            {AlgorithmId::Raw.label()}
            <span style="margin-left: auto; font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #5a5860;">
                {move || match dashboard.with(|v| v.drawn_paths) {
                    0 => String::new(),
                    1 => "1 path".to_string(),
                    n => format!("{n} paths"),
                }}
            </span>
        </div>
    }
}

#[component]
fn ErrorsToggle() -> impl IntoView {
    let Dashboard(dashboard) = expect_context();
    let controls_enabled = move || dashboard.with(|v| v.controls_enabled);

    view! {
        <label style="display: flex; align-items: center; gap: 8px; font-size: 0.85rem; cursor: pointer;">
            <input
                type="checkbox"
                prop:checked=move || dashboard.with(|v| v.show_errors)
                prop:disabled=move || !controls_enabled()
                on:change=move |e| dispatch(Command::ShowErrors(event_target_checked(&e)))
            />
            "Show error metrics"
        </label>
    }
}

#[component]
fn MetricsPanel() -> impl IntoView {
    let Dashboard(dashboard) = expect_context();
    let table = move || dashboard.with(|v| if v.show_errors { v.table.clone() } else { None });

    move || table().map(|table| view! { <MetricsTableView table=table /> })
}

#[component]
fn MetricsTableView(table: MetricsTable) -> impl IntoView {
    let MetricsTable { headers, rows } = table;
    view! {
        <table style="width: 100%; margin-top: 10px; border-collapse: collapse; font-family: 'JetBrains Mono', monospace; font-size: 0.68rem;">
            <thead>
                <tr style="color: #7c829e;">
                    <th style="text-align: left; padding: 3px 4px;">"Algorithm"</th>
                    {headers
                        .into_iter()
                        .map(|header| view! { <th style="text-align: right; padding: 3px 4px;">{header}</th> })
                        .collect_view()}
                </tr>
            </thead>
            <tbody>
                {rows.into_iter().map(|row| view! { <MetricsRowView row=row /> }).collect_view()}
            </tbody>
        </table>
    }
}

#[component]
fn MetricsRowView(row: MetricsRow) -> impl IntoView {
    let cells = row.cells();
    let swatch = format!("color: {};", row.algorithm.path_color());
    view! {
        <tr style="border-top: 1px solid #282c3e;">
            <td style="padding: 3px 4px;">
                <span style=swatch>{"\u{25A0} "}</span>
                {row.algorithm.label()}
            </td>
            {cells
                .into_iter()
                .map(|cell| view! { <td style="text-align: right; padding: 3px 4px; color: #e2e0d8;">{cell}</td> })
                .collect_view()}
        </tr>
    }
}
