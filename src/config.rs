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
//! Sweep files: which models to run, how to range their parameters, and
//! which pipeline command to run the configurations with.
//!
//! Files are TOML, or JSON when the extension is `.json`. Values can be
//! overridden with `SWEEP_`-prefixed environment variables, using `__` to
//! reach nested keys (e.g. `SWEEP_PIPELINE__COMMAND=python3`).
use crate::command::CommandArgs;
use crate::error::ConfigError;
use crate::error::RangeError;
use crate::range::ChoiceMode;
use crate::range::FlagMode;
use crate::range::NumberKind;
use crate::range::NumberParam;
use crate::range::RangeParameter;
use crate::range::number::Number;
use crate::settings::FeatureFilter;
use crate::settings::PipelineConfig;
use crate::settings::Value;
use crate::sweep::filter::FilterSweep;
use crate::sweep::plan::SweepPlan;
use figment::Figment;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Json;
use figment::providers::Toml;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_target_channel() -> u32 {
  1
}

fn default_is_above() -> bool {
  true
}

/// The parsed content of a sweep file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFile {
  /// Channel the detectors analyse, 1-based.
  #[serde(default = "default_target_channel")]
  pub target_channel: u32,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pipeline: Option<CommandArgs>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub models: Vec<ModelOverride>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub spot_filters: Vec<FilterSpec>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub track_filters: Vec<FilterSpec>,
}

impl Default for SweepFile {
  fn default() -> Self {
    Self {
      target_channel: default_target_channel(),
      pipeline: None,
      models: Vec::new(),
      spot_filters: Vec::new(),
      track_filters: Vec::new(),
    }
  }
}

/// Activation and parameter overrides for one catalog model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOverride {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub active: Option<bool>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub params: BTreeMap<String, ParamOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
  Fixed,
  Linear,
  Log,
  Manual,
  All,
  List,
  Both,
  Strings,
}

impl OverrideKind {
  fn name(self) -> &'static str {
    match self {
      OverrideKind::Fixed => "fixed",
      OverrideKind::Linear => "linear",
      OverrideKind::Log => "log",
      OverrideKind::Manual => "manual",
      OverrideKind::All => "all",
      OverrideKind::List => "list",
      OverrideKind::Both => "both",
      OverrideKind::Strings => "strings",
    }
  }
}

/// A new range for one parameter. Unset bounds keep the current ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamOverride {
  pub kind: OverrideKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub steps: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub values: Option<Vec<Value>>,
}

impl ParamOverride {
  fn new(kind: OverrideKind) -> Self {
    Self {
      kind,
      min: None,
      max: None,
      steps: None,
      value: None,
      values: None,
    }
  }

  /// The override that reproduces `param` as it stands. `None` for notes.
  pub fn describing(param: &RangeParameter) -> Option<Self> {
    let described = match param {
      RangeParameter::Double(p) => number_override(p, |v| v),
      RangeParameter::Int(p) => number_override(p, |v| v as f64),
      RangeParameter::Choice(p) => match p.mode() {
        ChoiceMode::All => Self::new(OverrideKind::All),
        ChoiceMode::Fixed => Self {
          value: p.fixed().map(Value::from),
          ..Self::new(OverrideKind::Fixed)
        },
        ChoiceMode::List => Self {
          values: Some(p.selected().iter().map(|s| Value::from(s.as_str())).collect()),
          ..Self::new(OverrideKind::List)
        },
      },
      RangeParameter::Flag(p) => match p.mode() {
        FlagMode::Both => Self::new(OverrideKind::Both),
        FlagMode::Fixed => Self {
          value: Some(Value::Bool(p.value())),
          ..Self::new(OverrideKind::Fixed)
        },
      },
      RangeParameter::Text(p) => Self {
        values: Some(p.values().iter().map(|s| Value::from(s.as_str())).collect()),
        ..Self::new(OverrideKind::Strings)
      },
      RangeParameter::Info(_) => return None,
    };
    Some(described)
  }

  /// Applies this override to `param`, firing its change notifications.
  pub fn apply(&self, param: &mut RangeParameter) -> Result<(), RangeError> {
    let label = param.label().to_string();
    let mismatch = || RangeError::KindMismatch {
      label: label.clone(),
      kind: self.kind.name().to_string(),
    };
    let missing = |field: &'static str| RangeError::MissingField {
      label: label.clone(),
      field,
    };

    match param {
      RangeParameter::Double(p) => self.apply_number(p, |v| v.as_f64(), &mismatch, &missing),
      RangeParameter::Int(p) => self.apply_number(
        p,
        |v| v.as_f64().map(|f| f.round() as i64),
        &mismatch,
        &missing,
      ),
      RangeParameter::Choice(p) => match self.kind {
        OverrideKind::All => {
          p.set_mode(ChoiceMode::All);
          Ok(())
        }
        OverrideKind::Fixed => {
          let value = self.value.as_ref().ok_or_else(|| missing("value"))?;
          p.set_fixed(&value.to_string())?.set_mode(ChoiceMode::Fixed);
          Ok(())
        }
        OverrideKind::List => {
          let values = self.values.as_ref().ok_or_else(|| missing("values"))?;
          p.set_selected(values.iter().map(Value::to_string))?
            .set_mode(ChoiceMode::List);
          Ok(())
        }
        _ => Err(mismatch()),
      },
      RangeParameter::Flag(p) => match self.kind {
        OverrideKind::Both => {
          p.set_mode(FlagMode::Both);
          Ok(())
        }
        OverrideKind::Fixed => {
          let value = self
            .value
            .as_ref()
            .and_then(Value::as_bool)
            .ok_or_else(|| missing("value"))?;
          p.set_value(value).set_mode(FlagMode::Fixed);
          Ok(())
        }
        _ => Err(mismatch()),
      },
      RangeParameter::Text(p) => match self.kind {
        OverrideKind::Strings => {
          let values = self
            .values
            .as_ref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| missing("values"))?;
          p.set_all(values.iter().map(Value::to_string).collect());
          Ok(())
        }
        _ => Err(mismatch()),
      },
      RangeParameter::Info(_) => Err(mismatch()),
    }
  }

  fn apply_number<N, F>(
    &self,
    param: &mut NumberParam<N>,
    convert: F,
    mismatch: &dyn Fn() -> RangeError,
    missing: &dyn Fn(&'static str) -> RangeError,
  ) -> Result<(), RangeError>
  where
    N: Number,
    F: Fn(&Value) -> Option<N>,
  {
    match self.kind {
      OverrideKind::Fixed => {
        let value = match &self.value {
          Some(value) => Some(convert(value).ok_or_else(|| missing("value"))?),
          None => self.min.and_then(|m| convert(&Value::Double(m))),
        };
        if let Some(value) = value {
          param.set_min(value);
        }
        param.set_kind(NumberKind::Fixed)?;
      }
      OverrideKind::Linear | OverrideKind::Log => {
        if let Some(steps) = self.steps {
          param.set_n_steps(steps)?;
        }
        if let Some(min) = self.min.and_then(|m| convert(&Value::Double(m))) {
          param.set_min(min);
        }
        if let Some(max) = self.max.and_then(|m| convert(&Value::Double(m))) {
          param.set_max(max);
        }
        let kind = if self.kind == OverrideKind::Log {
          NumberKind::Log
        } else {
          NumberKind::Linear
        };
        param.set_kind(kind)?;
      }
      OverrideKind::Manual => {
        let values = self.values.as_ref().ok_or_else(|| missing("values"))?;
        let values = values
          .iter()
          .map(|v| convert(v).ok_or_else(|| missing("values")))
          .collect::<Result<Vec<N>, _>>()?;
        param.set_manual(values).set_kind(NumberKind::Manual)?;
      }
      _ => return Err(mismatch()),
    }
    Ok(())
  }
}

fn number_override<N: Number>(param: &NumberParam<N>, to_f64: fn(N) -> f64) -> ParamOverride {
  match param.kind() {
    NumberKind::Fixed => ParamOverride {
      value: Some(param.min().into()),
      ..ParamOverride::new(OverrideKind::Fixed)
    },
    NumberKind::Linear | NumberKind::Log => ParamOverride {
      min: Some(to_f64(param.min())),
      max: Some(to_f64(param.max())),
      steps: Some(param.n_steps()),
      ..ParamOverride::new(if param.kind() == NumberKind::Log {
        OverrideKind::Log
      } else {
        OverrideKind::Linear
      })
    },
    NumberKind::Manual => ParamOverride {
      values: Some(param.manual_values().iter().map(|v| (*v).into()).collect()),
      ..ParamOverride::new(OverrideKind::Manual)
    },
  }
}

/// One filter entry; every threshold yields one installed filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
  pub feature: String,
  pub threshold: Vec<f64>,
  #[serde(default = "default_is_above")]
  pub is_above: bool,
}

impl FilterSpec {
  fn filters(&self) -> Result<Vec<FeatureFilter>, ConfigError> {
    let Some(&first) = self.threshold.first() else {
      return Err(ConfigError::EmptyFilter {
        feature: self.feature.clone(),
      });
    };
    let mut sweep = FilterSweep::single(&FeatureFilter::new(&self.feature, first, self.is_above));
    sweep.value().set_manual(self.threshold.clone());
    sweep
      .value()
      .set_kind(NumberKind::Manual)
      .map_err(|source| ConfigError::Override {
        model: "filters".to_string(),
        param: self.feature.clone(),
        source,
      })?;
    Ok(sweep.filters().collect())
  }
}

/// Loads a sweep file, then applies `SWEEP_` environment overrides.
pub fn load_sweep_file(path: &Path) -> Result<SweepFile, ConfigError> {
  if !path.is_file() {
    return Err(ConfigError::NotFound(path.to_path_buf()));
  }
  let figment = if path.extension().is_some_and(|ext| ext == "json") {
    Figment::new().merge(Json::file(path))
  } else {
    Figment::new().merge(Toml::file(path))
  };
  let file: SweepFile = figment
    .merge(
      Env::prefixed("SWEEP_")
        .ignore(&["config", "log_file", "log_max_lines"])
        .split("__"),
    )
    .extract()
    .map_err(Box::new)?;
  tracing::debug!(
    path = %path.display(),
    models = file.models.len(),
    "Loaded sweep file"
  );
  Ok(file)
}

impl SweepFile {
  /// A file listing every catalog model, inactive, with its starting ranges.
  pub fn template() -> Self {
    let plan = SweepPlan::with_catalog();
    let models = plan
      .models()
      .map(|model| ModelOverride {
        name: model.name().to_string(),
        active: Some(false),
        params: model
          .params()
          .filter_map(|(key, param)| {
            ParamOverride::describing(param).map(|o| (key.to_string(), o))
          })
          .collect(),
      })
      .collect();
    Self {
      pipeline: Some(CommandArgs {
        command: "python3".into(),
        args: vec!["run_pipeline.py".to_string()],
      }),
      models,
      ..Self::default()
    }
  }

  pub fn to_toml(&self) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(self)?)
  }

  pub fn write_toml(&self, path: &Path) -> Result<(), ConfigError> {
    fs::write(path, self.to_toml()?).map_err(|source| ConfigError::WriteSweepFile {
      path: path.to_path_buf(),
      source,
    })
  }

  /// The configuration every sweep starts from.
  pub fn base(&self) -> PipelineConfig {
    PipelineConfig::new(self.target_channel)
  }

  pub fn pipeline(&self) -> Result<&CommandArgs, ConfigError> {
    self.pipeline.as_ref().ok_or(ConfigError::NoPipeline)
  }

  /// The catalog plan with this file's activations, ranges and filters applied.
  pub fn build_plan(&self) -> Result<SweepPlan, ConfigError> {
    let mut plan = SweepPlan::with_catalog();
    for entry in &self.models {
      let available = plan.names();
      let model = plan
        .model_mut(&entry.name)
        .ok_or_else(|| ConfigError::UnknownModel {
          name: entry.name.clone(),
          available: available.clone(),
        })?;

      for (key, param_override) in &entry.params {
        let model_keys = model.keys();
        let param = model
          .param_mut(key)
          .ok_or_else(|| ConfigError::UnknownParam {
            model: entry.name.clone(),
            param: key.clone(),
            available: model_keys,
          })?;
        param_override
          .apply(param)
          .map_err(|source| ConfigError::Override {
            model: entry.name.clone(),
            param: key.clone(),
            source,
          })?;
      }

      if let Some(active) = entry.active {
        plan
          .set_active(&entry.name, active)
          .map_err(|_| ConfigError::UnknownModel {
            name: entry.name.clone(),
            available,
          })?;
      }
    }

    plan.set_spot_filters(collect_filters(&self.spot_filters)?);
    plan.set_track_filters(collect_filters(&self.track_filters)?);
    Ok(plan)
  }
}

fn collect_filters(specs: &[FilterSpec]) -> Result<Vec<FeatureFilter>, ConfigError> {
  let mut filters = Vec::new();
  for spec in specs {
    filters.extend(spec.filters()?);
  }
  Ok(filters)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::Family;
  use std::io::Write;

  fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
  }

  const SWEEP: &str = r#"
target_channel = 2

[pipeline]
command = "python3"
args = ["run.py"]

[[models]]
name = "LoG detector"
active = true

[models.params.THRESHOLD]
kind = "linear"
min = 10.0
max = 30.0
steps = 5

[models.params.DO_MEDIAN_FILTERING]
kind = "both"

[[models]]
name = "Simple LAP tracker"
active = true

[models.params.MAX_FRAME_GAP]
kind = "manual"
values = [1, 2, 2, 3]

[[spot_filters]]
feature = "QUALITY"
threshold = [10.0, 20.0]
"#;

  #[test]
  fn builds_the_plan_from_a_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "sweep.toml", SWEEP);
    let file = load_sweep_file(&path).unwrap();
    assert_eq!(file.target_channel, 2);
    assert_eq!(file.pipeline().unwrap().args, vec!["run.py".to_string()]);

    let plan = file.build_plan().unwrap();
    assert!(plan.is_active("LoG detector").unwrap());
    assert!(!plan.is_active("DoG detector").unwrap());
    // 5 thresholds x 2 median settings, 3 linking distances x 3 frame gaps.
    assert_eq!(plan.count_detector_settings(), 10);
    assert_eq!(plan.count_tracker_settings(), 9);
    assert_eq!(plan.count(), 90);
    assert_eq!(
      plan.spot_filters(),
      [
        FeatureFilter::new("QUALITY", 10.0, true),
        FeatureFilter::new("QUALITY", 20.0, true)
      ]
    );

    let first = plan.configurations(&file.base()).next().unwrap();
    assert_eq!(first.target_channel, 2);
    assert_eq!(first.get(Family::Detector, "THRESHOLD"), Some(&Value::Double(10.0)));
    assert_eq!(first.get(Family::Tracker, "MAX_FRAME_GAP"), Some(&Value::Int(1)));
  }

  #[test]
  fn json_files_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      &dir,
      "sweep.json",
      r#"{"models": [{"name": "Kalman tracker", "active": true}]}"#,
    );
    let file = load_sweep_file(&path).unwrap();
    assert_eq!(file.target_channel, 1);
    assert!(file.pipeline().is_err());
    assert!(file.build_plan().unwrap().is_active("Kalman tracker").unwrap());
  }

  #[test]
  fn unknown_model_is_reported_with_alternatives() {
    let file = SweepFile {
      models: vec![ModelOverride {
        name: "Unlisted detector".into(),
        active: Some(true),
        params: BTreeMap::new(),
      }],
      ..SweepFile::default()
    };
    match file.build_plan() {
      Err(ConfigError::UnknownModel { name, available }) => {
        assert_eq!(name, "Unlisted detector");
        assert!(available.contains(&"LoG detector".to_string()));
      }
      other => panic!("expected an unknown model, got {other:?}"),
    }
  }

  #[test]
  fn unknown_param_is_reported() {
    let mut params = BTreeMap::new();
    params.insert("SIGMA".to_string(), ParamOverride::new(OverrideKind::Both));
    let file = SweepFile {
      models: vec![ModelOverride {
        name: "LoG detector".into(),
        active: None,
        params,
      }],
      ..SweepFile::default()
    };
    assert!(matches!(
      file.build_plan(),
      Err(ConfigError::UnknownParam { param, .. }) if param == "SIGMA"
    ));
  }

  #[test]
  fn kind_mismatch_and_bad_steps_are_rejected() {
    let mut threshold: RangeParameter = NumberParam::linear("Threshold", 1.0, 2.0, 3).unwrap().into();
    assert!(matches!(
      ParamOverride::new(OverrideKind::Both).apply(&mut threshold),
      Err(RangeError::KindMismatch { .. })
    ));
    let one_step = ParamOverride {
      steps: Some(1),
      ..ParamOverride::new(OverrideKind::Linear)
    };
    assert!(matches!(
      one_step.apply(&mut threshold),
      Err(RangeError::TooFewSteps { .. })
    ));
    assert!(matches!(
      ParamOverride::new(OverrideKind::Manual).apply(&mut threshold),
      Err(RangeError::MissingField { field: "values", .. })
    ));
  }

  #[test]
  fn empty_filter_thresholds_are_rejected() {
    let file = SweepFile {
      spot_filters: vec![FilterSpec {
        feature: "QUALITY".into(),
        threshold: vec![],
        is_above: true,
      }],
      ..SweepFile::default()
    };
    assert!(matches!(
      file.build_plan(),
      Err(ConfigError::EmptyFilter { .. })
    ));
  }

  #[test]
  fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      load_sweep_file(&dir.path().join("absent.toml")),
      Err(ConfigError::NotFound(_))
    ));
  }

  #[test]
  fn template_reloads_to_the_catalog_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.toml");
    let template = SweepFile::template();
    template.write_toml(&path).unwrap();

    let file = load_sweep_file(&path).unwrap();
    let plan = file.build_plan().unwrap();
    let catalog = SweepPlan::with_catalog();
    for model in catalog.models() {
      assert_eq!(plan.model(model.name()).map(|m| m.count()), Some(model.count()));
      assert!(!plan.is_active(model.name()).unwrap());
    }
  }
}
