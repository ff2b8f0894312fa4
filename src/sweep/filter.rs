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
use crate::combinations::Combinations;
use crate::listeners::Listeners;
use crate::range::ChoiceParam;
use crate::range::FlagParam;
use crate::range::NumberParam;
use crate::settings::FeatureFilter;
use crate::settings::Value;

pub const KEY_FEATURE: &str = "FEATURE";
pub const KEY_VALUE: &str = "VALUE";
pub const KEY_IS_ABOVE: &str = "ISABOVE";

/// Sweeps feature filters: which feature, which threshold, above or below.
///
/// Defaults to a single filter on the first feature, above 5.
#[derive(Debug)]
pub struct FilterSweep {
  feature: ChoiceParam,
  value: NumberParam<f64>,
  is_above: FlagParam,
  listeners: Listeners,
}

impl FilterSweep {
  pub fn new<I, S>(features: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let feature = ChoiceParam::new("Feature", features);
    let value = NumberParam::fixed("Threshold", 5.0);
    let is_above = FlagParam::fixed("Above?", true);
    let listeners = Listeners::new();
    feature.listeners().subscribe(listeners.forwarder());
    value.listeners().subscribe(listeners.forwarder());
    is_above.listeners().subscribe(listeners.forwarder());
    Self {
      feature,
      value,
      is_above,
      listeners,
    }
  }

  /// A sweep that yields exactly `filter`.
  pub fn single(filter: &FeatureFilter) -> Self {
    let mut sweep = Self::new([filter.feature.as_str()]);
    sweep.value.set_min(filter.threshold);
    sweep.is_above.set_value(filter.is_above);
    sweep
  }

  pub fn feature(&mut self) -> &mut ChoiceParam {
    &mut self.feature
  }

  pub fn value(&mut self) -> &mut NumberParam<f64> {
    &mut self.value
  }

  pub fn is_above(&mut self) -> &mut FlagParam {
    &mut self.is_above
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  pub fn count(&self) -> usize {
    Combinations::new(self.value_lists()).total()
  }

  /// One filter per combination of feature, threshold and direction.
  pub fn filters(&self) -> impl Iterator<Item = FeatureFilter> + use<> {
    Combinations::new(self.value_lists()).filter_map(|combination| {
      let feature = combination.get(KEY_FEATURE)?.as_str()?.to_string();
      let threshold = combination.get(KEY_VALUE)?.as_f64()?;
      let is_above = combination.get(KEY_IS_ABOVE)?.as_bool()?;
      Some(FeatureFilter::new(feature, threshold, is_above))
    })
  }

  fn value_lists(&self) -> Vec<(&'static str, Vec<Value>)> {
    vec![
      (KEY_FEATURE, self.feature.range()),
      (KEY_VALUE, self.value.range()),
      (KEY_IS_ABOVE, self.is_above.range()),
    ]
  }
}
