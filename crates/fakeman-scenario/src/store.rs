//! Scenario persistence.

use std::path::Path;

use fakeman_core::fs;

use crate::error::ScenarioError;
use crate::model::ScenarioState;

pub fn save_scenario(path: &Path, state: &ScenarioState) -> Result<(), ScenarioError> {
    fs::write_json_atomic(path, state)?;
    Ok(())
}

/// Load a scenario; a missing file yields `None`.
pub fn load_scenario(path: &Path) -> Result<Option<ScenarioState>, ScenarioError> {
    let mut state: Option<ScenarioState> = fs::read_json(path)?;
    if let Some(s) = state.as_mut() {
        s.predicted = s.predicted.clamped();
        for item in &mut s.external_info {
            if !(0.0..=1.0).contains(&item.certainty) || !(0.0..=1.0).contains(&item.importance) {
                return Err(ScenarioError::Invalid(format!(
                    "external info out of range: {:?}",
                    item.content
                )));
            }
        }
    }
    Ok(state)
}
