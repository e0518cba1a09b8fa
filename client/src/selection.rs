use std::collections::{BTreeMap, BTreeSet};

use trajview_shared::{AlgorithmId, AlgorithmParams};

/// Enabled algorithms and the values of every parameter input.
///
/// Values are kept for disabled algorithms too so re-enabling restores the last
/// input, but only enabled algorithms reach a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    enabled: BTreeSet<AlgorithmId>,
    values: BTreeMap<AlgorithmId, BTreeMap<&'static str, f64>>,
}

/// Immutable snapshot handed to the request pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Canonical order.
    pub algorithms: Vec<AlgorithmId>,
    /// Parameters of enabled algorithms only.
    pub params: AlgorithmParams,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn contains(&self, id: AlgorithmId) -> bool {
        self.algorithms.contains(&id)
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        let values = AlgorithmId::SELECTABLE
            .into_iter()
            .map(|id| {
                let defaults = id
                    .params()
                    .iter()
                    .map(|spec| (spec.name, spec.default))
                    .collect();
                (id, defaults)
            })
            .collect();
        Self {
            enabled: BTreeSet::new(),
            values,
        }
    }
}

impl SelectionState {
    /// Returns whether the enabled set changed. RAW is implicit and never toggles.
    pub fn set_enabled(&mut self, id: AlgorithmId, enabled: bool) -> bool {
        if !id.is_selectable() {
            return false;
        }
        if enabled {
            self.enabled.insert(id)
        } else {
            self.enabled.remove(&id)
        }
    }

    pub fn is_enabled(&self, id: AlgorithmId) -> bool {
        self.enabled.contains(&id)
    }

    /// Enabled algorithms in canonical order.
    pub fn enabled(&self) -> Vec<AlgorithmId> {
        self.enabled.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Play and show-errors only make sense with something to ask about.
    pub fn controls_enabled(&self) -> bool {
        !self.is_empty()
    }

    /// An input is live only while its algorithm is enabled and declares it.
    pub fn param_input_enabled(&self, id: AlgorithmId, name: &str) -> bool {
        self.is_enabled(id) && id.param(name).is_some()
    }

    pub fn param(&self, id: AlgorithmId, name: &str) -> Option<f64> {
        self.values.get(&id)?.get(name).copied()
    }

    pub fn params(&self, id: AlgorithmId) -> BTreeMap<String, f64> {
        self.values
            .get(&id)
            .map(|values| {
                values
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), *value))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Store a clamped value. Returns the stored value, or `None` when `id` does not
    /// declare `name`.
    pub fn set_param(&mut self, id: AlgorithmId, name: &str, value: f64) -> Option<f64> {
        let spec = id.param(name)?;
        let clamped = spec.clamp(value);
        self.values.entry(id).or_default().insert(spec.name, clamped);
        Some(clamped)
    }

    pub fn snapshot(&self) -> Selection {
        let algorithms = self.enabled();
        let params = algorithms
            .iter()
            .map(|id| (*id, self.params(*id)))
            .collect();
        Selection { algorithms, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_is_canonical_regardless_of_toggle_order() {
        let mut state = SelectionState::default();
        state.set_enabled(AlgorithmId::UniformSampling, true);
        state.set_enabled(AlgorithmId::Squish, true);
        state.set_enabled(AlgorithmId::Dp, true);
        assert_eq!(
            state.enabled(),
            vec![AlgorithmId::Dp, AlgorithmId::Squish, AlgorithmId::UniformSampling]
        );
    }

    #[test]
    fn toggle_sequences_never_leak_unchecked_ids() {
        let toggles = [
            (AlgorithmId::Dr, true),
            (AlgorithmId::SquishE, true),
            (AlgorithmId::Dr, false),
            (AlgorithmId::Dp, true),
            (AlgorithmId::SquishE, false),
            (AlgorithmId::SquishE, true),
            (AlgorithmId::Dp, false),
            (AlgorithmId::Dp, false),
        ];
        let mut state = SelectionState::default();
        let mut checked = BTreeSet::new();
        for (id, on) in toggles {
            state.set_enabled(id, on);
            if on {
                checked.insert(id);
            } else {
                checked.remove(&id);
            }
            let enabled = state.enabled();
            assert!(enabled.iter().all(|id| checked.contains(id)));
            assert_eq!(enabled.len(), checked.len());
            assert!(enabled.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn raw_is_not_toggleable() {
        let mut state = SelectionState::default();
        assert!(!state.set_enabled(AlgorithmId::Raw, true));
        assert!(state.is_empty());
        assert!(!state.controls_enabled());
    }

    #[test]
    fn set_enabled_reports_changes_only() {
        let mut state = SelectionState::default();
        assert!(state.set_enabled(AlgorithmId::Dp, true));
        assert!(!state.set_enabled(AlgorithmId::Dp, true));
        assert!(state.set_enabled(AlgorithmId::Dp, false));
        assert!(!state.set_enabled(AlgorithmId::Dp, false));
    }

    #[test]
    fn param_inputs_follow_declared_mapping() {
        let mut state = SelectionState::default();
        state.set_enabled(AlgorithmId::SquishE, true);
        assert!(state.param_input_enabled(AlgorithmId::SquishE, "low_comp"));
        assert!(state.param_input_enabled(AlgorithmId::SquishE, "max_sed"));
        assert!(!state.param_input_enabled(AlgorithmId::SquishE, "buff_size"));
        assert!(!state.param_input_enabled(AlgorithmId::Squish, "buff_size"));
        assert!(!state.param_input_enabled(AlgorithmId::Dp, "epsilon"));
    }

    #[test]
    fn set_param_clamps_and_rejects_undeclared_names() {
        let mut state = SelectionState::default();
        assert_eq!(state.set_param(AlgorithmId::Squish, "buff_size", 0.0), Some(2.0));
        assert_eq!(state.param(AlgorithmId::Squish, "buff_size"), Some(2.0));
        assert_eq!(state.set_param(AlgorithmId::Squish, "epsilon", 3.0), None);
        assert_eq!(state.param(AlgorithmId::Squish, "epsilon"), None);
    }

    #[test]
    fn shared_parameter_names_stay_separate_per_algorithm() {
        let mut state = SelectionState::default();
        state.set_param(AlgorithmId::Squish, "buff_size", 50.0);
        assert_eq!(state.param(AlgorithmId::SquishReckoning, "buff_size"), Some(1000.0));
    }

    #[test]
    fn snapshot_carries_params_for_enabled_algorithms_only() {
        let mut state = SelectionState::default();
        state.set_param(AlgorithmId::Dr, "tolerance", 42.0);
        state.set_enabled(AlgorithmId::Squish, true);
        state.set_enabled(AlgorithmId::Dp, true);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.algorithms, vec![AlgorithmId::Dp, AlgorithmId::Squish]);
        assert_eq!(
            snapshot.params.keys().copied().collect::<Vec<_>>(),
            vec![AlgorithmId::Dp, AlgorithmId::Squish]
        );
        assert_eq!(snapshot.params[&AlgorithmId::Dp]["epsilon"], 10.0);
        assert!(!snapshot.params.contains_key(&AlgorithmId::Dr));
    }
}
