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
//! Numeric ranges: fixed, linear, logarithmic and manual.
use crate::error::RangeError;
use crate::listeners::Listeners;
use crate::range::render;
use crate::settings::Value;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// Physical unit a numeric parameter is expressed in. Display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
  #[default]
  None,
  Length,
  Time,
  Intensity,
  Quality,
  Angle,
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Dimension::None => "none",
      Dimension::Length => "length",
      Dimension::Time => "time",
      Dimension::Intensity => "intensity",
      Dimension::Quality => "quality",
      Dimension::Angle => "angle",
    };
    f.write_str(name)
  }
}

/// How the values of a numeric parameter are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
  /// Only `min`.
  Fixed,
  /// `n_steps` values evenly spaced from `min` to `max`.
  #[default]
  Linear,
  /// `n_steps` values evenly spaced in log space from `min` to `max`.
  Log,
  /// The manual list as given.
  Manual,
}

impl fmt::Display for NumberKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      NumberKind::Fixed => "fixed value",
      NumberKind::Linear => "linear range",
      NumberKind::Log => "log range",
      NumberKind::Manual => "manual range",
    };
    f.write_str(name)
  }
}

/// Scalar types a [`NumberParam`] can sweep over.
pub trait Number:
  Copy + PartialEq + fmt::Display + Into<Value> + Serialize + DeserializeOwned + 'static
{
  /// Values evenly spaced between `min` and `max`, both included. `n_steps >= 2`.
  fn linear(min: Self, max: Self, n_steps: usize) -> Vec<Self>;

  /// Values evenly spaced in log space between `min` and `max`. `n_steps >= 2`.
  fn log(min: Self, max: Self, n_steps: usize) -> Vec<Self>;

  /// Manual lists as enumerated.
  fn manual(values: &[Self]) -> Vec<Self>;

  fn render(values: &[Self]) -> String;

  fn from_f64(value: f64) -> Self;
}

/// Evenly spaced doubles, `min` and `max` included.
pub fn linspace(min: f64, max: f64, n_steps: usize) -> Vec<f64> {
  let last = (n_steps - 1) as f64;
  (0..n_steps)
    .map(|i| min + (max - min) * i as f64 / last)
    .collect()
}

/// Doubles evenly spaced in log space over the domain shifted to start at 1.
///
/// The shift makes zero and negative bounds usable. A reversed interval is
/// computed on the ordered bounds and returned in descending order.
pub fn logspace(min: f64, max: f64, n_steps: usize) -> Vec<f64> {
  let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
  let exponents = linspace(0.0, (1.0 - lo + hi).ln(), n_steps);
  let mut values: Vec<f64> = exponents.into_iter().map(|e| e.exp() + lo - 1.0).collect();
  if min > max {
    values.reverse();
  }
  values
}

fn unique(values: impl IntoIterator<Item = i64>) -> Vec<i64> {
  let mut out: Vec<i64> = Vec::new();
  for value in values {
    if !out.contains(&value) {
      out.push(value);
    }
  }
  out
}

impl Number for f64 {
  fn linear(min: f64, max: f64, n_steps: usize) -> Vec<f64> {
    linspace(min, max, n_steps)
  }

  fn log(min: f64, max: f64, n_steps: usize) -> Vec<f64> {
    logspace(min, max, n_steps)
  }

  fn manual(values: &[f64]) -> Vec<f64> {
    values.to_vec()
  }

  fn render(values: &[f64]) -> String {
    render::render_floats(values)
  }

  fn from_f64(value: f64) -> f64 {
    value
  }
}

impl Number for i64 {
  fn linear(min: i64, max: i64, n_steps: usize) -> Vec<i64> {
    let (min, max) = (min as i128, max as i128);
    let last = (n_steps - 1) as i128;
    unique((0..n_steps as i128).map(|i| (min + (max - min) * i / last) as i64))
  }

  fn log(min: i64, max: i64, n_steps: usize) -> Vec<i64> {
    unique(
      logspace(min as f64, max as f64, n_steps)
        .into_iter()
        .map(|v| v.round() as i64),
    )
  }

  fn manual(values: &[i64]) -> Vec<i64> {
    unique(values.iter().copied())
  }

  fn render(values: &[i64]) -> String {
    render::render_ints(values)
  }

  fn from_f64(value: f64) -> i64 {
    value.round() as i64
  }
}

/// A numeric parameter. The fixed value is `min`.
///
/// All bounds are kept when the kind changes, so switching back and forth
/// between kinds restores the previous range.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "N: Number")]
pub struct NumberParam<N: Number> {
  label: String,
  #[serde(default)]
  dimension: Dimension,
  kind: NumberKind,
  min: N,
  max: N,
  n_steps: usize,
  manual: Vec<N>,
  #[serde(skip)]
  listeners: Listeners,
}

impl<N: Number> NumberParam<N> {
  /// A linear 1 to 10 range in 10 steps, with a manual list of 1 to 10.
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      dimension: Dimension::None,
      kind: NumberKind::Linear,
      min: N::from_f64(1.0),
      max: N::from_f64(10.0),
      n_steps: 10,
      manual: (1..=10).map(|v| N::from_f64(v as f64)).collect(),
      listeners: Listeners::new(),
    }
  }

  pub fn fixed(label: impl Into<String>, value: N) -> Self {
    let mut param = Self::new(label);
    param.kind = NumberKind::Fixed;
    param.min = value;
    param
  }

  pub fn linear(label: impl Into<String>, min: N, max: N, n_steps: usize) -> Result<Self, RangeError> {
    Self::spanning(label, NumberKind::Linear, min, max, n_steps)
  }

  pub fn log(label: impl Into<String>, min: N, max: N, n_steps: usize) -> Result<Self, RangeError> {
    Self::spanning(label, NumberKind::Log, min, max, n_steps)
  }

  pub fn manual(label: impl Into<String>, values: Vec<N>) -> Self {
    let mut param = Self::new(label);
    param.kind = NumberKind::Manual;
    param.manual = values;
    param
  }

  fn spanning(
    label: impl Into<String>,
    kind: NumberKind,
    min: N,
    max: N,
    n_steps: usize,
  ) -> Result<Self, RangeError> {
    check_steps(kind, n_steps)?;
    let mut param = Self::new(label);
    param.kind = kind;
    param.min = min;
    param.max = max;
    param.n_steps = n_steps;
    Ok(param)
  }

  pub fn with_dimension(mut self, dimension: Dimension) -> Self {
    self.dimension = dimension;
    self
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn kind(&self) -> NumberKind {
    self.kind
  }

  pub fn dimension(&self) -> Dimension {
    self.dimension
  }

  pub fn min(&self) -> N {
    self.min
  }

  pub fn max(&self) -> N {
    self.max
  }

  pub fn n_steps(&self) -> usize {
    self.n_steps
  }

  pub fn manual_values(&self) -> &[N] {
    &self.manual
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  /// The candidate values for the current kind.
  pub fn values(&self) -> Vec<N> {
    match self.kind {
      NumberKind::Fixed => vec![self.min],
      NumberKind::Linear => N::linear(self.min, self.max, self.n_steps),
      NumberKind::Log => N::log(self.min, self.max, self.n_steps),
      NumberKind::Manual => N::manual(&self.manual),
    }
  }

  pub fn range(&self) -> Vec<Value> {
    self.values().into_iter().map(Into::into).collect()
  }

  pub fn render(&self) -> String {
    N::render(&self.values())
  }

  pub fn validate(&self) -> Result<(), RangeError> {
    check_steps(self.kind, self.n_steps)
  }

  pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
    let label = label.into();
    if self.label != label {
      self.label = label;
      self.listeners.notify();
    }
    self
  }

  pub fn set_dimension(&mut self, dimension: Dimension) -> &mut Self {
    if self.dimension != dimension {
      self.dimension = dimension;
      self.listeners.notify();
    }
    self
  }

  /// Switching to a spanning kind re-validates the retained step count.
  pub fn set_kind(&mut self, kind: NumberKind) -> Result<&mut Self, RangeError> {
    check_steps(kind, self.n_steps)?;
    if self.kind != kind {
      self.kind = kind;
      self.listeners.notify();
    }
    Ok(self)
  }

  pub fn set_min(&mut self, min: N) -> &mut Self {
    if self.min != min {
      self.min = min;
      self.listeners.notify();
    }
    self
  }

  pub fn set_max(&mut self, max: N) -> &mut Self {
    if self.max != max {
      self.max = max;
      self.listeners.notify();
    }
    self
  }

  /// Rejects fewer than 2 steps whatever the current kind, leaving the
  /// parameter untouched.
  pub fn set_n_steps(&mut self, n_steps: usize) -> Result<&mut Self, RangeError> {
    check_steps(NumberKind::Linear, n_steps)?;
    if self.n_steps != n_steps {
      self.n_steps = n_steps;
      self.listeners.notify();
    }
    Ok(self)
  }

  pub fn set_manual(&mut self, values: Vec<N>) -> &mut Self {
    if self.manual != values {
      self.manual = values;
      self.listeners.notify();
    }
    self
  }

  pub fn describe(&self) -> String {
    let head = format!("{} ({}):\n - type: {}", self.label, self.dimension, self.kind);
    match self.kind {
      NumberKind::Fixed => format!("{head}\n - value: {}", self.min),
      NumberKind::Linear | NumberKind::Log => format!(
        "{head}\n - min: {}\n - max: {}\n - n_steps: {}\n - values: {}",
        self.min,
        self.max,
        self.n_steps,
        self.render()
      ),
      NumberKind::Manual => format!("{head}\n - values: {}", self.render()),
    }
  }
}

fn check_steps(kind: NumberKind, n_steps: usize) -> Result<(), RangeError> {
  match kind {
    NumberKind::Linear | NumberKind::Log if n_steps < 2 => Err(RangeError::TooFewSteps {
      kind: if kind == NumberKind::Log { "log" } else { "linear" },
      n_steps,
    }),
    _ => Ok(()),
  }
}
