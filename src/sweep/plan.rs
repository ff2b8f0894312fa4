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
//! The full sweep: every detector model crossed with every tracker model.
use crate::catalog;
use crate::error::SweepError;
use crate::listeners::ListenerId;
use crate::listeners::Listeners;
use crate::nested::NestedIterator;
use crate::settings::FeatureFilter;
use crate::settings::Family;
use crate::settings::ModuleSettings;
use crate::settings::PipelineConfig;
use crate::sweep::model::SweepModel;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Detector and tracker sweep models, their activation flags and the filters
/// installed on every configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(from = "SweepPlanState")]
pub struct SweepPlan {
  detectors: Vec<SweepModel>,
  trackers: Vec<SweepModel>,
  active: BTreeMap<String, bool>,
  spot_filters: Vec<FeatureFilter>,
  track_filters: Vec<FeatureFilter>,
  #[serde(skip)]
  listeners: Listeners,
}

#[derive(Deserialize)]
struct SweepPlanState {
  detectors: Vec<SweepModel>,
  trackers: Vec<SweepModel>,
  #[serde(default)]
  active: BTreeMap<String, bool>,
  #[serde(default)]
  spot_filters: Vec<FeatureFilter>,
  #[serde(default)]
  track_filters: Vec<FeatureFilter>,
}

impl From<SweepPlanState> for SweepPlan {
  fn from(state: SweepPlanState) -> Self {
    let mut plan = SweepPlan::new(state.detectors, state.trackers);
    // Unregistered names are kept so that loading can report them.
    plan.active.extend(state.active);
    plan.spot_filters = state.spot_filters;
    plan.track_filters = state.track_filters;
    plan
  }
}

impl SweepPlan {
  /// Every model starts inactive.
  pub fn new(detectors: Vec<SweepModel>, trackers: Vec<SweepModel>) -> Self {
    let listeners = Listeners::new();
    let mut active = BTreeMap::new();
    for model in detectors.iter().chain(&trackers) {
      model.subscribe(listeners.forwarder());
      active.insert(model.name().to_string(), false);
    }
    Self {
      detectors,
      trackers,
      active,
      spot_filters: Vec::new(),
      track_filters: Vec::new(),
      listeners,
    }
  }

  /// A plan over the built-in detector and tracker catalog.
  pub fn with_catalog() -> Self {
    Self::new(catalog::detectors(), catalog::trackers())
  }

  pub fn detectors(&self) -> &[SweepModel] {
    &self.detectors
  }

  pub fn trackers(&self) -> &[SweepModel] {
    &self.trackers
  }

  pub fn models(&self) -> impl Iterator<Item = &SweepModel> {
    self.detectors.iter().chain(&self.trackers)
  }

  pub fn model(&self, name: &str) -> Option<&SweepModel> {
    self.models().find(|m| m.name() == name)
  }

  pub fn model_mut(&mut self, name: &str) -> Option<&mut SweepModel> {
    self
      .detectors
      .iter_mut()
      .chain(self.trackers.iter_mut())
      .find(|m| m.name() == name)
  }

  pub fn names(&self) -> Vec<String> {
    self.models().map(|m| m.name().to_string()).collect()
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

  pub fn is_active(&self, name: &str) -> Result<bool, SweepError> {
    if self.model(name).is_none() {
      return Err(unregistered(name));
    }
    Ok(self.active.get(name).copied().unwrap_or(false))
  }

  pub fn set_active(&mut self, name: &str, active: bool) -> Result<(), SweepError> {
    if self.is_active(name)? == active {
      return Ok(());
    }
    self.active.insert(name.to_string(), active);
    self.listeners.notify();
    Ok(())
  }

  /// Activation entries naming no registered model.
  pub fn unregistered_activations(&self) -> Vec<String> {
    self
      .active
      .keys()
      .filter(|name| self.model(name).is_none())
      .cloned()
      .collect()
  }

  pub fn active_detectors(&self) -> impl Iterator<Item = &SweepModel> {
    self.detectors.iter().filter(|m| self.flag(m))
  }

  pub fn active_trackers(&self) -> impl Iterator<Item = &SweepModel> {
    self.trackers.iter().filter(|m| self.flag(m))
  }

  fn flag(&self, model: &SweepModel) -> bool {
    self.active.get(model.name()).copied().unwrap_or(false)
  }

  pub fn spot_filters(&self) -> &[FeatureFilter] {
    &self.spot_filters
  }

  pub fn track_filters(&self) -> &[FeatureFilter] {
    &self.track_filters
  }

  pub fn set_spot_filters(&mut self, filters: Vec<FeatureFilter>) {
    if self.spot_filters != filters {
      self.spot_filters = filters;
      self.listeners.notify();
    }
  }

  pub fn set_track_filters(&mut self, filters: Vec<FeatureFilter>) {
    if self.track_filters != filters {
      self.track_filters = filters;
      self.listeners.notify();
    }
  }

  pub fn count_detector_settings(&self) -> usize {
    self.active_detectors().map(SweepModel::count).sum()
  }

  pub fn count_tracker_settings(&self) -> usize {
    self.active_trackers().map(SweepModel::count).sum()
  }

  /// Number of configurations [`SweepPlan::configurations`] yields.
  pub fn count(&self) -> usize {
    self
      .active_detectors()
      .map(|detector| detector.count() * self.count_tracker_settings())
      .sum()
  }

  /// Lazily yields every detector and tracker combination installed on a copy
  /// of `base`, together with this plan's filters.
  ///
  /// Detector settings vary slowest. Tracker settings are regenerated for
  /// every detector setting rather than held in memory.
  pub fn configurations(&self, base: &PipelineConfig) -> Configurations<'_> {
    let mut template = base.clone();
    template.spot_filters = self.spot_filters.clone();
    template.track_filters = self.track_filters.clone();
    let sources = vec![
      FamilySweep {
        models: self.active_detectors().collect(),
        family: Family::Detector,
        base: template.clone(),
      },
      FamilySweep {
        models: self.active_trackers().collect(),
        family: Family::Tracker,
        base: template.clone(),
      },
    ];
    Configurations {
      template,
      inner: NestedIterator::new(sources),
    }
  }

  pub fn describe(&self) -> String {
    let mut sections = Vec::new();
    for model in self.models() {
      let state = if self.flag(model) { "active" } else { "inactive" };
      sections.push(format!("[{state}] {}", model.describe()));
    }
    for filter in &self.spot_filters {
      sections.push(format!("spot filter: {filter}"));
    }
    for filter in &self.track_filters {
      sections.push(format!("track filter: {filter}"));
    }
    sections.join("\n\n")
  }
}

fn unregistered(name: &str) -> SweepError {
  SweepError::InvalidArgument(format!("Unregistered model with name: {name}"))
}

/// The settings fragments of one family, over all its active models.
#[derive(Clone)]
struct FamilySweep<'a> {
  models: Vec<&'a SweepModel>,
  family: Family,
  base: PipelineConfig,
}

impl<'a> IntoIterator for FamilySweep<'a> {
  type Item = ModuleSettings;
  type IntoIter = Box<dyn Iterator<Item = ModuleSettings> + 'a>;

  fn into_iter(self) -> Self::IntoIter {
    let FamilySweep {
      models,
      family,
      base,
    } = self;
    Box::new(models.into_iter().flat_map(move |model| {
      model
        .expand(&base)
        .filter_map(move |config| config.module(family).cloned())
    }))
  }
}

/// Iterator returned by [`SweepPlan::configurations`].
pub struct Configurations<'a> {
  template: PipelineConfig,
  inner: NestedIterator<FamilySweep<'a>>,
}

impl Iterator for Configurations<'_> {
  type Item = PipelineConfig;

  fn next(&mut self) -> Option<Self::Item> {
    let mut fragments = self.inner.next()?.into_iter();
    let mut config = self.template.clone();
    if let Some(detector) = fragments.next() {
      config.install(Family::Detector, detector);
    }
    if let Some(tracker) = fragments.next() {
      config.install(Family::Tracker, tracker);
    }
    Some(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listeners::tests::counter;
  use crate::range::NumberParam;
  use crate::settings::Value;
  use crate::sweep::factory::AlgorithmFactory;
  use std::sync::atomic::Ordering;

  fn model(name: &str, family: Family, sizes: &[usize]) -> SweepModel {
    let factory = AlgorithmFactory::new(name.to_uppercase(), name);
    let mut model = SweepModel::new(name, family, Some(factory));
    for (i, &size) in sizes.iter().enumerate() {
      let values = (0..size).map(|v| v as i64).collect();
      model = model.with_param(format!("P{i}"), NumberParam::<i64>::manual(format!("P{i}"), values));
    }
    model
  }

  fn plan() -> SweepPlan {
    SweepPlan::new(
      vec![
        model("D1", Family::Detector, &[2, 3]),
        model("D2", Family::Detector, &[3]),
      ],
      vec![
        model("T1", Family::Tracker, &[2]),
        model("T2", Family::Tracker, &[1, 3]),
      ],
    )
  }

  fn activate_all(plan: &mut SweepPlan) {
    for name in ["D1", "D2", "T1", "T2"] {
      plan.set_active(name, true).unwrap();
    }
  }

  #[test]
  fn models_start_inactive() {
    let plan = plan();
    for name in plan.names() {
      assert!(!plan.is_active(&name).unwrap());
    }
    assert_eq!(plan.count(), 0);
    assert_eq!(plan.configurations(&PipelineConfig::new(1)).count(), 0);
  }

  #[test]
  fn unregistered_names_are_rejected() {
    let mut plan = plan();
    assert!(matches!(
      plan.is_active("Unlisted"),
      Err(SweepError::InvalidArgument(msg)) if msg.contains("Unlisted")
    ));
    assert!(plan.set_active("Unlisted", true).is_err());
  }

  #[test]
  fn set_active_notifies_on_change_only() {
    let mut plan = plan();
    let count = counter(plan.listeners());
    plan.set_active("D1", false).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    plan.set_active("D1", true).unwrap();
    plan.set_active("D1", true).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn count_is_a_sum_of_products() {
    let mut plan = plan();
    activate_all(&mut plan);
    // (6 + 3) detector settings times (2 + 3) tracker settings.
    assert_eq!(plan.count_detector_settings(), 9);
    assert_eq!(plan.count_tracker_settings(), 5);
    assert_eq!(plan.count(), 45);
    assert_eq!(plan.configurations(&PipelineConfig::new(1)).count(), 45);

    plan.set_active("T2", false).unwrap();
    assert_eq!(plan.count(), 18);
    assert_eq!(plan.configurations(&PipelineConfig::new(1)).count(), 18);
  }

  #[test]
  fn every_detector_setting_pairs_with_every_tracker_setting() {
    let mut plan = SweepPlan::new(
      vec![
        model("D1", Family::Detector, &[2]),
        model("D2", Family::Detector, &[3]),
      ],
      vec![
        model("T1", Family::Tracker, &[4]),
        model("T2", Family::Tracker, &[5]),
      ],
    );
    activate_all(&mut plan);
    assert_eq!(plan.count_detector_settings(), 5);
    assert_eq!(plan.count_tracker_settings(), 9);
    assert_eq!(plan.count(), 2 * (4 + 5) + 3 * (4 + 5));
    assert_eq!(plan.count(), 45);
    assert_eq!(plan.configurations(&PipelineConfig::new(1)).count(), 45);
  }

  #[test]
  fn configurations_vary_trackers_fastest() {
    let mut plan = plan();
    activate_all(&mut plan);
    let configs: Vec<_> = plan.configurations(&PipelineConfig::new(3)).collect();

    let first = &configs[0];
    assert_eq!(first.detector.as_ref().map(|d| d.name.as_str()), Some("D1"));
    assert_eq!(first.tracker.as_ref().map(|t| t.name.as_str()), Some("T1"));
    assert_eq!(first.get(Family::Detector, "TARGET_CHANNEL"), Some(&Value::Int(3)));

    let second = &configs[1];
    assert_eq!(second.get(Family::Detector, "P1"), Some(&Value::Int(0)));
    assert_eq!(second.get(Family::Tracker, "P0"), Some(&Value::Int(1)));

    let last = &configs[44];
    assert_eq!(last.detector.as_ref().map(|d| d.name.as_str()), Some("D2"));
    assert_eq!(last.get(Family::Detector, "P0"), Some(&Value::Int(2)));
    assert_eq!(last.tracker.as_ref().map(|t| t.name.as_str()), Some("T2"));
    assert_eq!(last.get(Family::Tracker, "P1"), Some(&Value::Int(2)));
  }

  #[test]
  fn filters_are_installed_on_every_configuration() {
    let mut plan = plan();
    activate_all(&mut plan);
    let count = counter(plan.listeners());
    let filters = vec![FeatureFilter::new("QUALITY", 30.0, true)];
    plan.set_spot_filters(filters.clone());
    plan.set_spot_filters(filters.clone());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(
      plan
        .configurations(&PipelineConfig::new(1))
        .all(|c| c.spot_filters == filters && c.track_filters.is_empty())
    );
  }

  #[test]
  fn model_changes_reach_plan_subscribers() {
    let mut plan = plan();
    let count = counter(plan.listeners());
    let model = plan.model_mut("T1").unwrap();
    if let Some(crate::range::RangeParameter::Int(p)) = model.param_mut("P0") {
      p.set_manual(vec![4, 5, 6]);
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
}
