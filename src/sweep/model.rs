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
//! A sweep over the parameters of one algorithm.
use crate::combinations::Combinations;
use crate::error::RangeError;
use crate::listeners::ListenerId;
use crate::listeners::Listeners;
use crate::range::RangeParameter;
use crate::settings::Family;
use crate::settings::KEY_TARGET_CHANNEL;
use crate::settings::PipelineConfig;
use crate::settings::Value;
use crate::sweep::factory::AlgorithmFactory;
use serde::Deserialize;
use serde::Serialize;

/// An ordered `key -> parameter` map bound to an algorithm factory.
///
/// Without a factory (e.g. an optional module that is not installed) the
/// model produces no configurations at all.
#[derive(Debug, Serialize, Deserialize)]
#[serde(from = "SweepModelState")]
pub struct SweepModel {
  name: String,
  family: Family,
  factory: Option<AlgorithmFactory>,
  params: Vec<(String, RangeParameter)>,
  #[serde(skip)]
  listeners: Listeners,
}

/// Persisted form of a [`SweepModel`], rebuilt through [`SweepModel::from_parts`].
#[derive(Deserialize)]
struct SweepModelState {
  name: String,
  family: Family,
  factory: Option<AlgorithmFactory>,
  params: Vec<(String, RangeParameter)>,
}

impl From<SweepModelState> for SweepModel {
  fn from(state: SweepModelState) -> Self {
    SweepModel::from_parts(state.name, state.family, state.factory, state.params)
  }
}

impl SweepModel {
  pub fn new(name: impl Into<String>, family: Family, factory: Option<AlgorithmFactory>) -> Self {
    Self::from_parts(name.into(), family, factory, Vec::new())
  }

  fn from_parts(
    name: String,
    family: Family,
    factory: Option<AlgorithmFactory>,
    params: Vec<(String, RangeParameter)>,
  ) -> Self {
    let listeners = Listeners::new();
    for (_, param) in &params {
      param.listeners().subscribe(listeners.forwarder());
    }
    Self {
      name,
      family,
      factory,
      params,
      listeners,
    }
  }

  /// Appends a parameter, replacing any parameter already under `key`.
  pub fn with_param(mut self, key: impl Into<String>, param: impl Into<RangeParameter>) -> Self {
    let key = key.into();
    let param = param.into();
    param.listeners().subscribe(self.listeners.forwarder());
    match self.params.iter_mut().find(|(k, _)| *k == key) {
      Some((_, slot)) => *slot = param,
      None => self.params.push((key, param)),
    }
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn family(&self) -> Family {
    self.family
  }

  pub fn factory(&self) -> Option<&AlgorithmFactory> {
    self.factory.as_ref()
  }

  pub fn params(&self) -> impl Iterator<Item = (&str, &RangeParameter)> {
    self.params.iter().map(|(k, p)| (k.as_str(), p))
  }

  pub fn param(&self, key: &str) -> Option<&RangeParameter> {
    self.params.iter().find(|(k, _)| k == key).map(|(_, p)| p)
  }

  /// Mutations made through the returned parameter reach this model's subscribers.
  pub fn param_mut(&mut self, key: &str) -> Option<&mut RangeParameter> {
    self
      .params
      .iter_mut()
      .find(|(k, _)| k == key)
      .map(|(_, p)| p)
  }

  pub fn keys(&self) -> Vec<String> {
    self.params.iter().map(|(k, _)| k.clone()).collect()
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  pub fn subscribe<F>(&self, callback: F) -> ListenerId
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.listeners.subscribe(callback)
  }

  pub fn unsubscribe(&self, id: ListenerId) -> bool {
    self.listeners.unsubscribe(id)
  }

  /// The `key -> values` mapping fed to the enumerator. Placeholders are left out.
  pub fn value_lists(&self) -> Vec<(String, Vec<Value>)> {
    self
      .params
      .iter()
      .filter(|(_, p)| !p.is_placeholder())
      .map(|(k, p)| (k.clone(), p.range()))
      .collect()
  }

  /// Number of configurations [`SweepModel::expand`] yields.
  pub fn count(&self) -> usize {
    if self.factory.is_none() {
      return 0;
    }
    Combinations::new(self.value_lists()).total()
  }

  /// Lazily yields one configuration per combination of parameter values.
  ///
  /// Each configuration is a copy of `base` whose fragment for this model's
  /// family is the factory defaults, overwritten by the combination.
  pub fn expand(&self, base: &PipelineConfig) -> Expansion {
    let Some(factory) = &self.factory else {
      return Expansion {
        template: base.clone(),
        family: self.family,
        source: Source::Done,
      };
    };

    let mut template = base.clone();
    template.install(self.family, factory.copy().fragment());
    if self.family == Family::Detector {
      template.set(
        Family::Detector,
        KEY_TARGET_CHANNEL,
        Value::Int(i64::from(base.target_channel)),
      );
    }

    Expansion {
      template,
      family: self.family,
      source: Source::Combinations(Combinations::new(self.value_lists())),
    }
  }

  pub fn validate(&self) -> Result<(), RangeError> {
    self.params.iter().try_for_each(|(_, p)| p.validate())
  }

  pub fn describe(&self) -> String {
    let mut text = format!("{} ({}):", self.name, self.family);
    if self.factory.is_none() {
      text.push_str("\n  (not available)");
    }
    for (key, param) in &self.params {
      text.push_str(&format!("\n  [{key}] "));
      text.push_str(&param.describe().replace('\n', "\n  "));
    }
    text
  }
}

enum Source {
  Done,
  Combinations(Combinations<Value>),
}

/// Iterator returned by [`SweepModel::expand`].
pub struct Expansion {
  template: PipelineConfig,
  family: Family,
  source: Source,
}

impl Iterator for Expansion {
  type Item = PipelineConfig;

  fn next(&mut self) -> Option<Self::Item> {
    match &mut self.source {
      Source::Done => None,
      Source::Combinations(combinations) => {
        let combination = combinations.next()?;
        let mut config = self.template.clone();
        for (key, value) in combination {
          config.set(self.family, key, value);
        }
        Some(config)
      }
    }
  }
}
