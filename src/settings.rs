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
//! Concrete values and the pipeline configuration combinations are applied into.
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key under which detector fragments receive the channel to analyse.
pub const KEY_TARGET_CHANNEL: &str = "TARGET_CHANNEL";

/// One concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Bool(bool),
  Int(i64),
  Double(f64),
  Str(String),
}

impl Value {
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(v) => Some(*v as f64),
      Value::Double(v) => Some(*v),
      Value::Bool(_) | Value::Str(_) => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(v) => Some(v),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Bool(v) => write!(f, "{v}"),
      Value::Int(v) => write!(f, "{v}"),
      Value::Double(v) => write!(f, "{v}"),
      Value::Str(v) => f.write_str(v),
    }
  }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Bool(v)
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Value::Int(v)
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Double(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Str(v.to_string())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Str(v)
  }
}

/// An algorithm's settings, indexed by parameter key.
pub type Settings = BTreeMap<String, Value>;

/// Which slot of a [`PipelineConfig`] a sweep model writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
  Detector,
  Tracker,
}

impl fmt::Display for Family {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Family::Detector => f.write_str("detector"),
      Family::Tracker => f.write_str("tracker"),
    }
  }
}

/// Keeps objects whose `feature` is above (or below) `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFilter {
  pub feature: String,
  pub threshold: f64,
  pub is_above: bool,
}

impl FeatureFilter {
  pub fn new(feature: impl Into<String>, threshold: f64, is_above: bool) -> Self {
    Self {
      feature: feature.into(),
      threshold,
      is_above,
    }
  }
}

impl fmt::Display for FeatureFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let op = if self.is_above { ">" } else { "<" };
    write!(f, "{} {} {}", self.feature, op, self.threshold)
  }
}

/// The algorithm chosen for one family, and its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSettings {
  /// Stable key of the factory that produced the defaults.
  pub key: String,
  pub name: String,
  pub settings: Settings,
}

/// A full pipeline configuration: one detector, one tracker and the filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
  pub target_channel: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detector: Option<ModuleSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tracker: Option<ModuleSettings>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub spot_filters: Vec<FeatureFilter>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub track_filters: Vec<FeatureFilter>,
}

impl PipelineConfig {
  pub fn new(target_channel: u32) -> Self {
    Self {
      target_channel,
      ..Self::default()
    }
  }

  pub fn module(&self, family: Family) -> Option<&ModuleSettings> {
    match family {
      Family::Detector => self.detector.as_ref(),
      Family::Tracker => self.tracker.as_ref(),
    }
  }

  /// Replaces the fragment of `family` wholesale.
  pub fn install(&mut self, family: Family, module: ModuleSettings) {
    match family {
      Family::Detector => self.detector = Some(module),
      Family::Tracker => self.tracker = Some(module),
    }
  }

  /// Writes `key` into the fragment of `family`.
  ///
  /// Returns `false`, leaving the configuration untouched, when no algorithm
  /// is installed for that family yet.
  pub fn set(&mut self, family: Family, key: impl Into<String>, value: Value) -> bool {
    let slot = match family {
      Family::Detector => self.detector.as_mut(),
      Family::Tracker => self.tracker.as_mut(),
    };
    match slot {
      Some(module) => {
        module.settings.insert(key.into(), value);
        true
      }
      None => false,
    }
  }

  pub fn get(&self, family: Family, key: &str) -> Option<&Value> {
    self.module(family)?.settings.get(key)
  }
}
