use chrono::NaiveDate;

use trajview_shared::AlgorithmId;

use crate::controller::Controller;
use crate::render::MetricsTable;

/// Outcome of the most recent request that was allowed to count.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UpdateStatus {
    #[default]
    Idle,
    Pending,
    Updated { seq: u64 },
    Failed { message: String },
}

impl UpdateStatus {
    pub fn label(&self) -> String {
        match self {
            UpdateStatus::Idle => String::new(),
            UpdateStatus::Pending => "updating...".to_string(),
            UpdateStatus::Updated { seq } => format!("updated (#{seq})"),
            UpdateStatus::Failed { message } => format!("last update failed: {message}"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UpdateStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    pub input_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmView {
    pub id: AlgorithmId,
    pub label: &'static str,
    pub color: String,
    pub enabled: bool,
    pub params: Vec<ParamView>,
}

/// Plain-data snapshot of everything the controls and readouts show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub algorithms: Vec<AlgorithmView>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub time_of_day: u32,
    pub granularity: u32,
    pub display_time: String,
    pub running: bool,
    pub speed_label: String,
    pub can_go_faster: bool,
    pub can_go_slower: bool,
    pub controls_enabled: bool,
    pub show_errors: bool,
    pub status: UpdateStatus,
    pub table: Option<MetricsTable>,
    pub drawn_paths: usize,
}

impl DashboardView {
    pub fn algorithm(&self, id: AlgorithmId) -> Option<&AlgorithmView> {
        self.algorithms.iter().find(|a| a.id == id)
    }

    pub fn build(
        controller: &Controller,
        status: &UpdateStatus,
        table: Option<&MetricsTable>,
        drawn_paths: usize,
    ) -> Self {
        let selection = controller.selection();
        let cursor = controller.cursor();
        let playback = controller.playback();

        let algorithms = AlgorithmId::SELECTABLE
            .into_iter()
            .map(|id| AlgorithmView {
                id,
                label: id.label(),
                color: id.path_color(),
                enabled: selection.is_enabled(id),
                params: id
                    .params()
                    .iter()
                    .map(|spec| ParamView {
                        name: spec.name,
                        label: spec.label,
                        value: selection.param(id, spec.name).unwrap_or(spec.default),
                        min: spec.min,
                        max: spec.max,
                        step: spec.step,
                        input_enabled: selection.param_input_enabled(id, spec.name),
                    })
                    .collect(),
            })
            .collect();

        Self {
            algorithms,
            start_date: cursor.start_date(),
            end_date: cursor.end_date(),
            time_of_day: cursor.time_of_day(),
            granularity: cursor.granularity(),
            display_time: cursor.display_string(),
            running: playback.is_running(),
            speed_label: playback.speed_label(),
            can_go_faster: playback.can_go_faster(),
            can_go_slower: playback.can_go_slower(),
            controls_enabled: selection.controls_enabled(),
            show_errors: controller.show_errors(),
            status: status.clone(),
            table: table.cloned(),
            drawn_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Command;

    #[test]
    fn view_lists_every_selectable_algorithm_with_its_inputs() {
        let mut controller = Controller::default();
        controller.dispatch(
            Command::ToggleAlgorithm {
                id: AlgorithmId::SquishE,
                enabled: true,
            },
            0.0,
        );
        let view = DashboardView::build(&controller, &UpdateStatus::Idle, None, 0);

        assert_eq!(view.algorithms.len(), AlgorithmId::SELECTABLE.len());
        let squish_e = view.algorithm(AlgorithmId::SquishE).expect("listed");
        assert!(squish_e.enabled);
        assert!(squish_e.params.iter().all(|p| p.input_enabled));
        let dp = &view.algorithms[0];
        assert!(!dp.enabled);
        assert!(dp.params.iter().all(|p| !p.input_enabled));
        assert!(view.controls_enabled);
        assert_eq!(view.display_time, "01-01-2024 00:00:00");
        assert_eq!(view.speed_label, "1h/tick");
    }

    #[test]
    fn status_labels() {
        assert_eq!(UpdateStatus::Idle.label(), "");
        assert_eq!(
            UpdateStatus::Failed {
                message: "network failure: reset".to_string()
            }
            .label(),
            "last update failed: network failure: reset"
        );
        assert!(!UpdateStatus::Updated { seq: 3 }.is_failed());
    }
}
