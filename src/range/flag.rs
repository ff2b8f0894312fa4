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
use crate::listeners::Listeners;
use crate::settings::Value;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagMode {
  /// `false` then `true`.
  #[default]
  Both,
  Fixed,
}

impl fmt::Display for FlagMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FlagMode::Both => f.write_str("test both"),
      FlagMode::Fixed => f.write_str("fixed value"),
    }
  }
}

/// A boolean parameter.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlagParam {
  label: String,
  mode: FlagMode,
  value: bool,
  #[serde(skip)]
  listeners: Listeners,
}

impl FlagParam {
  /// Tests both values; the fixed value is `true`.
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      mode: FlagMode::Both,
      value: true,
      listeners: Listeners::new(),
    }
  }

  pub fn fixed(label: impl Into<String>, value: bool) -> Self {
    let mut param = Self::new(label);
    param.mode = FlagMode::Fixed;
    param.value = value;
    param
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn mode(&self) -> FlagMode {
    self.mode
  }

  pub fn value(&self) -> bool {
    self.value
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  pub fn values(&self) -> Vec<bool> {
    match self.mode {
      FlagMode::Both => vec![false, true],
      FlagMode::Fixed => vec![self.value],
    }
  }

  pub fn range(&self) -> Vec<Value> {
    self.values().into_iter().map(Value::Bool).collect()
  }

  pub fn set_mode(&mut self, mode: FlagMode) -> &mut Self {
    if self.mode != mode {
      self.mode = mode;
      self.listeners.notify();
    }
    self
  }

  pub fn set_value(&mut self, value: bool) -> &mut Self {
    if self.value != value {
      self.value = value;
      self.listeners.notify();
    }
    self
  }

  pub fn describe(&self) -> String {
    match self.mode {
      FlagMode::Both => format!("{}:\n - type: {}", self.label, self.mode),
      FlagMode::Fixed => format!("{}:\n - type: {}\n - value: {}", self.label, self.mode, self.value),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listeners::tests::counter;
  use std::sync::atomic::Ordering;

  #[test]
  fn both_is_false_then_true() {
    let param = FlagParam::new("Allow gap closing");
    assert_eq!(param.values(), vec![false, true]);
    assert_eq!(param.range(), vec![Value::Bool(false), Value::Bool(true)]);
  }

  #[test]
  fn fixed_is_a_singleton() {
    let mut param = FlagParam::fixed("Median filter", false);
    assert_eq!(param.values(), vec![false]);
    param.set_value(true);
    assert_eq!(param.values(), vec![true]);
  }

  #[test]
  fn notifies_on_change_only() {
    let mut param = FlagParam::new("Sub-pixel localization");
    let count = counter(param.listeners());
    param.set_value(true).set_mode(FlagMode::Both);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    param.set_mode(FlagMode::Fixed).set_value(false);
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }
}
