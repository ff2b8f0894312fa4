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
use crate::error::RangeError;
use crate::listeners::Listeners;
use crate::settings::Value;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceMode {
  /// Every choice, in declaration order.
  All,
  /// The single fixed choice.
  #[default]
  Fixed,
  /// The selected choices, in selection order.
  List,
}

impl fmt::Display for ChoiceMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ChoiceMode::All => "test all",
      ChoiceMode::Fixed => "single value",
      ChoiceMode::List => "list",
    };
    f.write_str(name)
  }
}

/// A parameter taking one value out of a fixed set of choices.
///
/// The fixed value and every selected value always belong to the choices.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChoiceParam {
  label: String,
  choices: Vec<String>,
  mode: ChoiceMode,
  fixed: Option<String>,
  selected: Vec<String>,
  #[serde(skip)]
  listeners: Listeners,
}

impl ChoiceParam {
  /// Fixed on the first choice, with an empty selection.
  pub fn new<I, S>(label: impl Into<String>, choices: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut unique: Vec<String> = Vec::new();
    for choice in choices {
      let choice = choice.into();
      if !unique.contains(&choice) {
        unique.push(choice);
      }
    }
    Self {
      label: label.into(),
      fixed: unique.first().cloned(),
      choices: unique,
      mode: ChoiceMode::Fixed,
      selected: Vec::new(),
      listeners: Listeners::new(),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn choices(&self) -> &[String] {
    &self.choices
  }

  pub fn mode(&self) -> ChoiceMode {
    self.mode
  }

  pub fn fixed(&self) -> Option<&str> {
    self.fixed.as_deref()
  }

  pub fn selected(&self) -> &[String] {
    &self.selected
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  pub fn values(&self) -> Vec<String> {
    match self.mode {
      ChoiceMode::All => self.choices.clone(),
      ChoiceMode::Fixed => self.fixed.iter().cloned().collect(),
      ChoiceMode::List => self.selected.clone(),
    }
  }

  pub fn range(&self) -> Vec<Value> {
    self.values().into_iter().map(Value::Str).collect()
  }

  pub fn set_mode(&mut self, mode: ChoiceMode) -> &mut Self {
    if self.mode != mode {
      self.mode = mode;
      self.listeners.notify();
    }
    self
  }

  pub fn set_fixed(&mut self, value: &str) -> Result<&mut Self, RangeError> {
    self.check(value)?;
    if self.fixed.as_deref() != Some(value) {
      self.fixed = Some(value.to_string());
      self.listeners.notify();
    }
    Ok(self)
  }

  /// Adds `value` to the end of the selection. Already selected values are ignored.
  pub fn select(&mut self, value: &str) -> Result<&mut Self, RangeError> {
    self.check(value)?;
    if !self.selected.iter().any(|s| s == value) {
      self.selected.push(value.to_string());
      self.listeners.notify();
    }
    Ok(self)
  }

  pub fn deselect(&mut self, value: &str) -> &mut Self {
    if let Some(pos) = self.selected.iter().position(|s| s == value) {
      self.selected.remove(pos);
      self.listeners.notify();
    }
    self
  }

  /// Replaces the whole selection in one notification.
  pub fn set_selected<I, S>(&mut self, values: I) -> Result<&mut Self, RangeError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut selected: Vec<String> = Vec::new();
    for value in values {
      let value = value.as_ref();
      self.check(value)?;
      if !selected.iter().any(|s| s == value) {
        selected.push(value.to_string());
      }
    }
    if self.selected != selected {
      self.selected = selected;
      self.listeners.notify();
    }
    Ok(self)
  }

  pub fn validate(&self) -> Result<(), RangeError> {
    if let Some(fixed) = &self.fixed {
      self.check(fixed)?;
    }
    self.selected.iter().try_for_each(|value| self.check(value))
  }

  pub fn describe(&self) -> String {
    match self.mode {
      ChoiceMode::Fixed => format!(
        "{}:\n - type: {}\n - value: {}",
        self.label,
        self.mode,
        self.fixed.as_deref().unwrap_or("")
      ),
      ChoiceMode::All | ChoiceMode::List => format!(
        "{}:\n - type: {}\n - values: [{}]",
        self.label,
        self.mode,
        self.values().join(", ")
      ),
    }
  }

  fn check(&self, value: &str) -> Result<(), RangeError> {
    if self.choices.iter().any(|c| c == value) {
      Ok(())
    } else {
      Err(RangeError::UnknownChoice {
        label: self.label.clone(),
        value: value.to_string(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listeners::tests::counter;
  use std::sync::atomic::Ordering;

  fn iou() -> ChoiceParam {
    ChoiceParam::new("IoU calculation", ["FAST", "PRECISE"])
  }

  #[test]
  fn each_mode_has_its_range() {
    let mut param = iou();
    assert_eq!(param.values(), vec!["FAST"]);

    param.set_mode(ChoiceMode::All);
    assert_eq!(param.values(), vec!["FAST", "PRECISE"]);

    param.set_mode(ChoiceMode::List);
    assert!(param.values().is_empty());
    param.select("PRECISE").unwrap().select("FAST").unwrap();
    assert_eq!(param.values(), vec!["PRECISE", "FAST"]);
    assert_eq!(
      param.range(),
      vec![Value::Str("PRECISE".into()), Value::Str("FAST".into())]
    );
  }

  #[test]
  fn values_outside_the_choices_are_rejected() {
    let mut param = iou();
    let count = counter(param.listeners());
    assert!(matches!(
      param.set_fixed("EXACT"),
      Err(RangeError::UnknownChoice { .. })
    ));
    assert!(param.select("EXACT").is_err());
    assert!(param.set_selected(["FAST", "EXACT"]).is_err());
    assert_eq!(param.fixed(), Some("FAST"));
    assert!(param.selected().is_empty());
    assert_eq!(count.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn selection_is_an_ordered_set() {
    let mut param = iou();
    let count = counter(param.listeners());
    param.select("PRECISE").unwrap();
    param.select("PRECISE").unwrap();
    assert_eq!(param.selected(), ["PRECISE"]);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    param.deselect("FAST");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    param.deselect("PRECISE");
    assert_eq!(count.load(Ordering::SeqCst), 2);

    param.set_selected(["FAST", "PRECISE", "FAST"]).unwrap();
    assert_eq!(param.selected(), ["FAST", "PRECISE"]);
    assert_eq!(count.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn unchanged_setters_are_silent() {
    let mut param = iou();
    let count = counter(param.listeners());
    param.set_mode(ChoiceMode::Fixed);
    param.set_fixed("FAST").unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    param.set_fixed("PRECISE").unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn describes_fixed_and_listed_values() {
    let mut param = iou();
    param.set_fixed("PRECISE").unwrap();
    assert_eq!(
      param.describe(),
      "IoU calculation:\n - type: single value\n - value: PRECISE"
    );
    param.set_mode(ChoiceMode::All);
    assert!(param.describe().ends_with(" - values: [FAST, PRECISE]"));
  }
}
