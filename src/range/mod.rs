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
//! Range parameters: one algorithm parameter and the values it is swept over.
//!
//! Every parameter owns a [`Listeners`] registry and notifies it once per
//! observable change. Setters that receive the current value do nothing.
pub mod choice;
pub mod flag;
pub mod info;
pub mod number;
pub mod render;
pub mod text;

use crate::error::RangeError;
use crate::listeners::Listeners;
use crate::settings::Value;
use serde::Deserialize;
use serde::Serialize;

pub use choice::ChoiceMode;
pub use choice::ChoiceParam;
pub use flag::FlagMode;
pub use flag::FlagParam;
pub use info::InfoParam;
pub use number::Dimension;
pub use number::NumberKind;
pub use number::NumberParam;
pub use text::TextParam;

/// The closed set of parameter kinds a sweep model can hold.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum RangeParameter {
  Double(NumberParam<f64>),
  Int(NumberParam<i64>),
  Choice(ChoiceParam),
  Flag(FlagParam),
  Text(TextParam),
  Info(InfoParam),
}

impl RangeParameter {
  pub fn label(&self) -> &str {
    match self {
      RangeParameter::Double(p) => p.label(),
      RangeParameter::Int(p) => p.label(),
      RangeParameter::Choice(p) => p.label(),
      RangeParameter::Flag(p) => p.label(),
      RangeParameter::Text(p) => p.label(),
      RangeParameter::Info(p) => p.label(),
    }
  }

  /// The ordered candidate values. Empty only for [`InfoParam`] and for
  /// choice lists with nothing selected.
  pub fn range(&self) -> Vec<Value> {
    match self {
      RangeParameter::Double(p) => p.range(),
      RangeParameter::Int(p) => p.range(),
      RangeParameter::Choice(p) => p.range(),
      RangeParameter::Flag(p) => p.range(),
      RangeParameter::Text(p) => p.range(),
      RangeParameter::Info(_) => Vec::new(),
    }
  }

  pub fn listeners(&self) -> &Listeners {
    match self {
      RangeParameter::Double(p) => p.listeners(),
      RangeParameter::Int(p) => p.listeners(),
      RangeParameter::Choice(p) => p.listeners(),
      RangeParameter::Flag(p) => p.listeners(),
      RangeParameter::Text(p) => p.listeners(),
      RangeParameter::Info(p) => p.listeners(),
    }
  }

  /// Placeholders carry a note and never contribute values.
  pub fn is_placeholder(&self) -> bool {
    matches!(self, RangeParameter::Info(_))
  }

  /// Checks state that may have bypassed the setters, e.g. after deserialization.
  pub fn validate(&self) -> Result<(), RangeError> {
    match self {
      RangeParameter::Double(p) => p.validate(),
      RangeParameter::Int(p) => p.validate(),
      RangeParameter::Choice(p) => p.validate(),
      RangeParameter::Flag(_) | RangeParameter::Text(_) | RangeParameter::Info(_) => Ok(()),
    }
  }

  pub fn describe(&self) -> String {
    match self {
      RangeParameter::Double(p) => p.describe(),
      RangeParameter::Int(p) => p.describe(),
      RangeParameter::Choice(p) => p.describe(),
      RangeParameter::Flag(p) => p.describe(),
      RangeParameter::Text(p) => p.describe(),
      RangeParameter::Info(p) => p.describe(),
    }
  }
}

impl From<NumberParam<f64>> for RangeParameter {
  fn from(p: NumberParam<f64>) -> Self {
    RangeParameter::Double(p)
  }
}

impl From<NumberParam<i64>> for RangeParameter {
  fn from(p: NumberParam<i64>) -> Self {
    RangeParameter::Int(p)
  }
}

impl From<ChoiceParam> for RangeParameter {
  fn from(p: ChoiceParam) -> Self {
    RangeParameter::Choice(p)
  }
}

impl From<FlagParam> for RangeParameter {
  fn from(p: FlagParam) -> Self {
    RangeParameter::Flag(p)
  }
}

impl From<TextParam> for RangeParameter {
  fn from(p: TextParam) -> Self {
    RangeParameter::Text(p)
  }
}

impl From<InfoParam> for RangeParameter {
  fn from(p: InfoParam) -> Self {
    RangeParameter::Info(p)
  }
}
