// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Saving and restoring a [`SweepPlan`] as JSON.
use crate::error::ConfigError;
use crate::sweep::plan::SweepPlan;
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn save_state(path: &Path, plan: &SweepPlan) -> Result<(), ConfigError> {
  let write_error = |source| ConfigError::WriteState {
    path: path.to_path_buf(),
    source,
  };
  let json = serde_json::to_string_pretty(plan).map_err(|e| write_error(std::io::Error::other(e)))?;
  fs::write(path, json).map_err(write_error)?;
  debug!(path = %path.display(), models = plan.names().len(), "Saved sweep state");
  Ok(())
}

/// Loads a plan saved by [`save_state`].
///
/// Invalid JSON is reported as an unrecognized file; a well-formed file whose
/// content cannot be used (activation of an unknown model, a range with too
/// few steps) as an unusable one.
pub fn load_state(path: &Path) -> Result<SweepPlan, ConfigError> {
  let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadState {
    path: path.to_path_buf(),
    source,
  })?;
  let plan: SweepPlan =
    serde_json::from_str(&text).map_err(|source| ConfigError::UnrecognizedState {
      path: path.to_path_buf(),
      source,
    })?;

  let unusable = |reason: String| ConfigError::UnusableState {
    path: path.to_path_buf(),
    reason,
  };
  if let Some(name) = plan.unregistered_activations().first() {
    return Err(unusable(format!("activation for unregistered model '{name}'")));
  }
  for model in plan.models() {
    model
      .validate()
      .map_err(|e| unusable(format!("model '{}': {e}", model.name())))?;
  }

  debug!(path = %path.display(), models = plan.names().len(), "Loaded sweep state");
  Ok(plan)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listeners::tests::counter;
  use std::sync::atomic::Ordering;

  #[test]
  fn round_trip_keeps_activation_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.json");
    let mut plan = SweepPlan::with_catalog();
    plan.set_active("LoG detector", true).unwrap();
    plan.set_active("Simple LAP tracker", true).unwrap();
    save_state(&path, &plan).unwrap();

    let loaded = load_state(&path).unwrap();
    assert_eq!(loaded.names(), plan.names());
    assert!(loaded.is_active("LoG detector").unwrap());
    assert!(!loaded.is_active("DoG detector").unwrap());
    assert_eq!(loaded.count(), plan.count());
  }

  #[test]
  fn loaded_plan_forwards_model_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.json");
    save_state(&path, &SweepPlan::with_catalog()).unwrap();

    let mut loaded = load_state(&path).unwrap();
    let count = counter(loaded.listeners());
    loaded.set_active("LoG detector", true).unwrap();
    let model = loaded.model_mut("LoG detector").unwrap();
    if let Some(crate::range::RangeParameter::Double(p)) = model.param_mut("THRESHOLD") {
      p.set_max(200.0);
    }
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn garbage_is_unrecognized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.json");
    std::fs::write(&path, "not json at all").unwrap();
    assert!(matches!(
      load_state(&path),
      Err(ConfigError::UnrecognizedState { .. })
    ));
  }

  #[test]
  fn unknown_activation_is_unusable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.json");
    save_state(&path, &SweepPlan::with_catalog()).unwrap();

    let mut json: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    json["active"]["Unlisted detector"] = serde_json::Value::Bool(true);
    std::fs::write(&path, json.to_string()).unwrap();

    match load_state(&path) {
      Err(ConfigError::UnusableState { reason, .. }) => assert!(reason.contains("Unlisted")),
      other => panic!("expected an unusable state, got {other:?}"),
    }
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      load_state(&dir.path().join("absent.json")),
      Err(ConfigError::ReadState { .. })
    ));
  }
}
