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
//! Built-in detector and tracker sweep models.
//!
//! Each model pairs the algorithm's default settings with a small starting
//! sweep: one or two parameters are ranged, the rest are fixed.
use crate::range::ChoiceParam;
use crate::range::Dimension;
use crate::range::FlagParam;
use crate::range::InfoParam;
use crate::range::NumberParam;
use crate::range::RangeParameter;
use crate::settings::Family;
use crate::sweep::factory::AlgorithmFactory;
use crate::sweep::model::SweepModel;

pub const KEY_RADIUS: &str = "RADIUS";
pub const KEY_RADIUS_Z: &str = "RADIUS_Z";
pub const KEY_THRESHOLD: &str = "THRESHOLD";
pub const KEY_DO_SUBPIXEL_LOCALIZATION: &str = "DO_SUBPIXEL_LOCALIZATION";
pub const KEY_DO_MEDIAN_FILTERING: &str = "DO_MEDIAN_FILTERING";
pub const KEY_NORMALIZE: &str = "NORMALIZE";
pub const KEY_INTENSITY_THRESHOLD: &str = "INTENSITY_THRESHOLD";
pub const KEY_SIMPLIFY_CONTOURS: &str = "SIMPLIFY_CONTOURS";

pub const KEY_LINKING_MAX_DISTANCE: &str = "LINKING_MAX_DISTANCE";
pub const KEY_ALLOW_GAP_CLOSING: &str = "ALLOW_GAP_CLOSING";
pub const KEY_GAP_CLOSING_MAX_DISTANCE: &str = "GAP_CLOSING_MAX_DISTANCE";
pub const KEY_MAX_FRAME_GAP: &str = "MAX_FRAME_GAP";
pub const KEY_ALLOW_TRACK_SPLITTING: &str = "ALLOW_TRACK_SPLITTING";
pub const KEY_SPLITTING_MAX_DISTANCE: &str = "SPLITTING_MAX_DISTANCE";
pub const KEY_ALLOW_TRACK_MERGING: &str = "ALLOW_TRACK_MERGING";
pub const KEY_MERGING_MAX_DISTANCE: &str = "MERGING_MAX_DISTANCE";
pub const KEY_KALMAN_SEARCH_RADIUS: &str = "KALMAN_SEARCH_RADIUS";
pub const KEY_SCALE_FACTOR: &str = "SCALE_FACTOR";
pub const KEY_MIN_IOU: &str = "MIN_IOU";
pub const KEY_IOU_CALCULATION: &str = "IOU_CALCULATION";

/// Detector models, in display order.
pub fn detectors() -> Vec<SweepModel> {
  vec![
    blob_detector("LOG_DETECTOR", "LoG detector"),
    blob_detector("DOG_DETECTOR", "DoG detector"),
    hessian_detector(),
    threshold_detector(),
    contour_detector("MASK_DETECTOR", "Mask detector"),
    contour_detector("LABEL_IMAGE_DETECTOR", "Label image detector"),
    missing_module("StarDist detector", "StarDist"),
    missing_module("StarDist custom detector", "StarDist"),
    missing_module("Cellpose detector", "Cellpose"),
    missing_module("Ilastik detector", "Ilastik"),
    missing_module("MorphoLibJ detector", "MorphoLibJ"),
    missing_module("Weka detector", "Weka"),
  ]
}

/// Tracker models, in display order.
pub fn trackers() -> Vec<SweepModel> {
  vec![
    simple_lap_tracker(),
    lap_tracker(),
    kalman_tracker(),
    overlap_tracker(),
    nearest_neighbor_tracker(),
    unavailable(
      "Trackastra tracker",
      Family::Tracker,
      "The Trackastra tracker requires a Trackastra environment, which is not configured.",
    ),
  ]
}

fn length(param: NumberParam<f64>) -> RangeParameter {
  param.with_dimension(Dimension::Length).into()
}

/// A linear range over `min..=max` in three steps.
fn span(label: &str, min: f64, max: f64) -> NumberParam<f64> {
  NumberParam::linear(label, min, max, 3).unwrap_or_else(|_| NumberParam::fixed(label, min))
}

fn blob_detector(key: &str, name: &str) -> SweepModel {
  let factory = AlgorithmFactory::new(key, name)
    .with_default(KEY_DO_SUBPIXEL_LOCALIZATION, true)
    .with_default(KEY_RADIUS, 5.0)
    .with_default(KEY_THRESHOLD, 0.0)
    .with_default(KEY_DO_MEDIAN_FILTERING, false);
  SweepModel::new(name, Family::Detector, Some(factory))
    .with_param(KEY_RADIUS, length(NumberParam::fixed("Estimated radius", 5.0)))
    .with_param(
      KEY_THRESHOLD,
      span("Threshold", 50.0, 100.0).with_dimension(Dimension::Quality),
    )
    .with_param(
      KEY_DO_SUBPIXEL_LOCALIZATION,
      FlagParam::fixed("Sub-pixel localization", true),
    )
    .with_param(KEY_DO_MEDIAN_FILTERING, FlagParam::fixed("Median filtering", false))
}

fn hessian_detector() -> SweepModel {
  let factory = AlgorithmFactory::new("HESSIAN_DETECTOR", "Hessian detector")
    .with_default(KEY_RADIUS, 5.0)
    .with_default(KEY_RADIUS_Z, 8.0)
    .with_default(KEY_THRESHOLD, 0.0)
    .with_default(KEY_NORMALIZE, false)
    .with_default(KEY_DO_SUBPIXEL_LOCALIZATION, true);
  SweepModel::new("Hessian detector", Family::Detector, Some(factory))
    .with_param(KEY_RADIUS, length(NumberParam::fixed("Estimated XY radius", 1.0)))
    .with_param(KEY_RADIUS_Z, length(NumberParam::fixed("Estimated Z radius", 2.0)))
    .with_param(KEY_THRESHOLD, span("Threshold", 0.5, 0.9))
    .with_param(KEY_NORMALIZE, FlagParam::fixed("Normalize quality", true))
    .with_param(
      KEY_DO_SUBPIXEL_LOCALIZATION,
      FlagParam::fixed("Sub-pixel localization", true),
    )
}

fn threshold_detector() -> SweepModel {
  let factory = AlgorithmFactory::new("THRESHOLD_DETECTOR", "Thresholding detector")
    .with_default(KEY_INTENSITY_THRESHOLD, 0.0)
    .with_default(KEY_SIMPLIFY_CONTOURS, true);
  SweepModel::new("Thresholding detector", Family::Detector, Some(factory))
    .with_param(
      KEY_INTENSITY_THRESHOLD,
      span("Intensity threshold", 50.0, 100.0).with_dimension(Dimension::Intensity),
    )
    .with_param(KEY_SIMPLIFY_CONTOURS, FlagParam::fixed("Simplify contours", true))
}

fn contour_detector(key: &str, name: &str) -> SweepModel {
  let factory = AlgorithmFactory::new(key, name).with_default(KEY_SIMPLIFY_CONTOURS, true);
  SweepModel::new(name, Family::Detector, Some(factory))
    .with_param(KEY_SIMPLIFY_CONTOURS, FlagParam::fixed("Simplify contours", true))
}

fn lap_defaults(factory: AlgorithmFactory) -> AlgorithmFactory {
  factory
    .with_default(KEY_LINKING_MAX_DISTANCE, 15.0)
    .with_default(KEY_ALLOW_GAP_CLOSING, true)
    .with_default(KEY_GAP_CLOSING_MAX_DISTANCE, 15.0)
    .with_default(KEY_MAX_FRAME_GAP, 2_i64)
    .with_default(KEY_ALLOW_TRACK_SPLITTING, false)
    .with_default(KEY_SPLITTING_MAX_DISTANCE, 15.0)
    .with_default(KEY_ALLOW_TRACK_MERGING, false)
    .with_default(KEY_MERGING_MAX_DISTANCE, 15.0)
    .with_default("ALTERNATIVE_LINKING_COST_FACTOR", 1.05)
    .with_default("CUTOFF_PERCENTILE", 0.9)
}

fn linking_distance() -> RangeParameter {
  length(span("Max linking distance", 10.0, 20.0))
}

fn simple_lap_tracker() -> SweepModel {
  let factory = lap_defaults(AlgorithmFactory::new(
    "SIMPLE_SPARSE_LAP_TRACKER",
    "Simple LAP tracker",
  ));
  SweepModel::new("Simple LAP tracker", Family::Tracker, Some(factory))
    .with_param(KEY_LINKING_MAX_DISTANCE, linking_distance())
    .with_param(
      KEY_GAP_CLOSING_MAX_DISTANCE,
      length(NumberParam::fixed("Gap-closing distance", 15.0)),
    )
    .with_param(KEY_MAX_FRAME_GAP, NumberParam::<i64>::fixed("Max frame gap", 2))
}

fn lap_tracker() -> SweepModel {
  let factory = lap_defaults(AlgorithmFactory::new("SPARSE_LAP_TRACKER", "LAP tracker"));
  SweepModel::new("LAP tracker", Family::Tracker, Some(factory))
    .with_param(KEY_LINKING_MAX_DISTANCE, linking_distance())
    .with_param(KEY_ALLOW_GAP_CLOSING, FlagParam::fixed("Allow gap-closing", true))
    .with_param(
      KEY_GAP_CLOSING_MAX_DISTANCE,
      length(NumberParam::fixed("Gap-closing distance", 15.0)),
    )
    .with_param(KEY_MAX_FRAME_GAP, NumberParam::<i64>::fixed("Max frame gap", 2))
    .with_param(
      KEY_ALLOW_TRACK_SPLITTING,
      FlagParam::fixed("Allow track splitting", true),
    )
    .with_param(
      KEY_SPLITTING_MAX_DISTANCE,
      length(NumberParam::fixed("Splitting max distance", 15.0)),
    )
    .with_param(KEY_ALLOW_TRACK_MERGING, FlagParam::fixed("Allow track merging", true))
    .with_param(
      KEY_MERGING_MAX_DISTANCE,
      length(NumberParam::fixed("Merging max distance", 15.0)),
    )
}

fn kalman_tracker() -> SweepModel {
  let factory = AlgorithmFactory::new("KALMAN_TRACKER", "Kalman tracker")
    .with_default(KEY_LINKING_MAX_DISTANCE, 15.0)
    .with_default(KEY_KALMAN_SEARCH_RADIUS, 15.0)
    .with_default(KEY_MAX_FRAME_GAP, 2_i64);
  SweepModel::new("Kalman tracker", Family::Tracker, Some(factory))
    .with_param(KEY_LINKING_MAX_DISTANCE, linking_distance())
    .with_param(
      KEY_KALMAN_SEARCH_RADIUS,
      length(NumberParam::fixed("Kalman search radius", 15.0)),
    )
    .with_param(KEY_MAX_FRAME_GAP, NumberParam::<i64>::fixed("Max frame gap", 2))
}

fn overlap_tracker() -> SweepModel {
  let factory = AlgorithmFactory::new("OVERLAP_TRACKER", "Overlap tracker")
    .with_default(KEY_SCALE_FACTOR, 1.0)
    .with_default(KEY_MIN_IOU, 0.3)
    .with_default(KEY_IOU_CALCULATION, "PRECISE");
  let iou = ChoiceParam::new("IoU calculation", ["PRECISE", "FAST"]);
  SweepModel::new("Overlap tracker", Family::Tracker, Some(factory))
    .with_param(KEY_SCALE_FACTOR, span("Scale factor", 1.0, 1.4))
    .with_param(KEY_MIN_IOU, NumberParam::fixed("Min IoU", 0.3))
    .with_param(KEY_IOU_CALCULATION, iou)
}

fn nearest_neighbor_tracker() -> SweepModel {
  let factory = AlgorithmFactory::new("NEAREST_NEIGHBOR_TRACKER", "Nearest-neighbor tracker")
    .with_default(KEY_LINKING_MAX_DISTANCE, 15.0);
  SweepModel::new("Nearest-neighbor tracker", Family::Tracker, Some(factory))
    .with_param(KEY_LINKING_MAX_DISTANCE, linking_distance())
}

/// A detector whose optional module is not installed.
fn missing_module(name: &str, module: &str) -> SweepModel {
  let info = format!("The {name} requires the {module} module, which is not installed.");
  unavailable(name, Family::Detector, &info)
}

fn unavailable(name: &str, family: Family, info: &str) -> SweepModel {
  SweepModel::new(name, family, None).with_param("", InfoParam::new("", info))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::PipelineConfig;
  use crate::settings::Value;
  use std::collections::HashSet;

  #[test]
  fn names_are_unique() {
    let names: Vec<String> = detectors()
      .iter()
      .chain(&trackers())
      .map(|m| m.name().to_string())
      .collect();
    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
  }

  #[test]
  fn families_match_their_lists() {
    assert!(detectors().iter().all(|m| m.family() == Family::Detector));
    assert!(trackers().iter().all(|m| m.family() == Family::Tracker));
  }

  #[test]
  fn starting_sweeps_have_expected_sizes() {
    let count = |models: Vec<SweepModel>, name: &str| {
      models
        .iter()
        .find(|m| m.name() == name)
        .map(SweepModel::count)
    };
    assert_eq!(count(detectors(), "LoG detector"), Some(3));
    assert_eq!(count(detectors(), "Hessian detector"), Some(3));
    assert_eq!(count(detectors(), "Mask detector"), Some(1));
    assert_eq!(count(detectors(), "StarDist detector"), Some(0));
    assert_eq!(count(trackers(), "LAP tracker"), Some(3));
    assert_eq!(count(trackers(), "Overlap tracker"), Some(3));
  }

  #[test]
  fn optional_detectors_are_listed_but_yield_nothing() {
    let models = detectors();
    for name in [
      "StarDist detector",
      "StarDist custom detector",
      "Cellpose detector",
      "Ilastik detector",
      "MorphoLibJ detector",
      "Weka detector",
    ] {
      let model = models.iter().find(|m| m.name() == name);
      assert!(model.is_some(), "{name} is missing");
      let model = model.unwrap();
      assert_eq!(model.count(), 0);
      assert_eq!(model.expand(&PipelineConfig::new(1)).count(), 0);
      assert!(model.describe().contains("module, which is not installed"));
    }
  }

  #[test]
  fn log_threshold_spans_fifty_to_one_hundred() {
    let models = detectors();
    let log = &models[0];
    let values = log.param(KEY_THRESHOLD).map(|p| p.range()).unwrap_or_default();
    assert_eq!(
      values,
      vec![Value::Double(50.0), Value::Double(75.0), Value::Double(100.0)]
    );
  }

  #[test]
  fn overlap_configurations_use_precise_iou() {
    let models = trackers();
    let overlap = models.iter().find(|m| m.name() == "Overlap tracker").unwrap();
    let configs: Vec<_> = overlap.expand(&PipelineConfig::new(1)).collect();
    assert_eq!(configs.len(), 3);
    for config in &configs {
      assert_eq!(
        config.get(Family::Tracker, KEY_IOU_CALCULATION),
        Some(&Value::Str("PRECISE".into()))
      );
    }
  }
}
