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

/// A free list of strings, swept in order. Typically paths to model files.
#[derive(Debug, Serialize, Deserialize)]
pub struct TextParam {
  label: String,
  values: Vec<String>,
  #[serde(default)]
  is_file: bool,
  #[serde(skip)]
  listeners: Listeners,
}

impl TextParam {
  pub fn new<I, S>(label: impl Into<String>, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      label: label.into(),
      values: values.into_iter().map(Into::into).collect(),
      is_file: false,
      listeners: Listeners::new(),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn values(&self) -> &[String] {
    &self.values
  }

  pub fn is_file(&self) -> bool {
    self.is_file
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  pub fn range(&self) -> Vec<Value> {
    self.values.iter().cloned().map(Value::Str).collect()
  }

  /// Appends `value`, duplicates included.
  pub fn push(&mut self, value: impl Into<String>) -> &mut Self {
    self.values.push(value.into());
    self.listeners.notify();
    self
  }

  /// Removes the entry at `index`. Ignored when out of bounds or when it is
  /// the last entry.
  pub fn remove(&mut self, index: usize) -> &mut Self {
    if self.values.len() < 2 || index >= self.values.len() {
      return self;
    }
    self.values.remove(index);
    self.listeners.notify();
    self
  }

  /// Replaces the entry at `index`. Ignored when out of bounds.
  pub fn set(&mut self, index: usize, value: impl Into<String>) -> &mut Self {
    let value = value.into();
    match self.values.get_mut(index) {
      Some(slot) if *slot != value => {
        *slot = value;
        self.listeners.notify();
      }
      _ => {}
    }
    self
  }

  pub fn set_all(&mut self, values: Vec<String>) -> &mut Self {
    if self.values != values {
      self.values = values;
      self.listeners.notify();
    }
    self
  }

  pub fn set_is_file(&mut self, is_file: bool) -> &mut Self {
    if self.is_file != is_file {
      self.is_file = is_file;
      self.listeners.notify();
    }
    self
  }

  pub fn describe(&self) -> String {
    let mut text = format!("{}:", self.label);
    for (i, value) in self.values.iter().enumerate() {
      text.push_str(&format!("\n - {i:2}: {value}"));
    }
    text
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listeners::tests::counter;
  use std::sync::atomic::Ordering;

  #[test]
  fn range_is_the_list_in_order() {
    let param = TextParam::new("Model", ["b.zip", "a.zip", "b.zip"]);
    assert_eq!(
      param.range(),
      vec![
        Value::Str("b.zip".into()),
        Value::Str("a.zip".into()),
        Value::Str("b.zip".into())
      ]
    );
  }

  #[test]
  fn never_removes_the_last_entry() {
    let mut param = TextParam::new("Model", ["a.zip", "b.zip"]);
    let count = counter(param.listeners());
    param.remove(5);
    param.remove(0);
    param.remove(0);
    assert_eq!(param.values(), ["b.zip"]);
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn push_always_notifies() {
    let mut param = TextParam::new("Model", ["a.zip"]);
    let count = counter(param.listeners());
    param.push("a.zip").push("a.zip");
    assert_eq!(param.values().len(), 3);
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn set_ignores_same_value_and_bad_index() {
    let mut param = TextParam::new("Model", ["a.zip"]);
    let count = counter(param.listeners());
    param.set(0, "a.zip").set(3, "c.zip");
    assert_eq!(count.load(Ordering::SeqCst), 0);
    param.set(0, "c.zip");
    assert_eq!(param.values(), ["c.zip"]);
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn describes_each_entry() {
    let param = TextParam::new("Model", ["a.zip", "b.zip"]);
    assert_eq!(param.describe(), "Model:\n -  0: a.zip\n -  1: b.zip");
  }
}
