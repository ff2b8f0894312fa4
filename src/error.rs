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
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error enum for the sweeplab library.
#[derive(Error, Debug)]
pub enum SweepError {
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  #[error("Invalid parameter range")]
  Range(#[from] RangeError),

  #[error("Configuration error")]
  Config(#[from] ConfigError),

  #[error("Scoring failed")]
  Scoring(#[from] ScoringError),

  #[error("Pipeline run failed")]
  Run(#[from] RunError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON serialization/deserialization error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Errors raised when a range parameter is given an unusable state (src/range).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
  #[error("A {kind} range needs at least 2 steps, got {n_steps}")]
  TooFewSteps { kind: &'static str, n_steps: usize },

  #[error("Value '{value}' is not one of the choices of '{label}'")]
  UnknownChoice { label: String, value: String },

  #[error("Range kind '{kind}' does not apply to parameter '{label}'")]
  KindMismatch { label: String, kind: String },

  #[error("Parameter '{label}' needs '{field}' for this range kind")]
  MissingField { label: String, field: &'static str },
}

/// Errors related to sweep files and persisted sweep state (src/config.rs, src/sweep/state.rs).
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Sweep file not found: {0}")]
  NotFound(PathBuf),

  #[error("Failed to load sweep file")]
  Load(#[from] Box<figment::Error>),

  #[error("Unknown model '{name}'. Available: {available:?}")]
  UnknownModel {
    name: String,
    available: Vec<String>,
  },

  #[error("Model '{model}' has no parameter '{param}'. Available: {available:?}")]
  UnknownParam {
    model: String,
    param: String,
    available: Vec<String>,
  },

  #[error("Override for '{model}.{param}' is invalid")]
  Override {
    model: String,
    param: String,
    #[source]
    source: RangeError,
  },

  #[error("Spot or track filter on '{feature}' needs at least one threshold")]
  EmptyFilter { feature: String },

  #[error("No pipeline command configured. Add a [pipeline] section to the sweep file.")]
  NoPipeline,

  #[error("Failed to write sweep file: {path}")]
  WriteSweepFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to render sweep file")]
  Render(#[from] toml::ser::Error),

  #[error("Failed to read sweep state file: {path}")]
  ReadState {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write sweep state file: {path}")]
  WriteState {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{path} is not a recognized sweep state file")]
  UnrecognizedState {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("{path} is a sweep state file but cannot be used: {reason}")]
  UnusableState { path: PathBuf, reason: String },
}

/// Errors related to batch scoring (src/scoring.rs).
#[derive(Error, Debug)]
pub enum ScoringError {
  #[error("Reference file not found: {0}")]
  ReferenceNotFound(PathBuf),

  #[error("{0} is not a recognized ground-truth file (no <root> element)")]
  UnrecognizedReference(PathBuf),

  #[error(
    "{0} is a recognized ground-truth file but cannot be used for SPT metrics (no <TrackContestISBI2012> element)"
  )]
  UnsupportedReference(PathBuf),

  #[error("Candidates folder not found: {0}")]
  CandidatesNotFound(PathBuf),

  #[error("Could not find any XML file in the ground-truth folder {0}")]
  NoReferences(PathBuf),

  #[error("Failed to read candidates folder: {path}")]
  ReadCandidates {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to spawn scorer for {candidate}")]
  SpawnScorer {
    candidate: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Scorer exited with {code:?} for {candidate}: {stderr}")]
  ScorerFailed {
    candidate: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("Expected 5 comma-separated scores, got {parts} in line: {line}")]
  ScoreParts { parts: usize, line: String },

  #[error("Failed to parse score '{value}'")]
  ParseScore {
    value: String,
    #[source]
    source: std::num::ParseFloatError,
  },

  #[error("Failed to read results file: {path}")]
  ReadResults {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to write results file: {path}")]
  WriteResults {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Errors related to executing the external pipeline (src/runner.rs).
#[derive(Error, Debug)]
pub enum RunError {
  #[error("Failed to encode configuration")]
  Encode(#[from] serde_json::Error),

  #[error("Failed to spawn pipeline command")]
  SpawnPipeline(#[source] std::io::Error),

  #[error("Failed to take pipeline {0} pipe")]
  Pipe(&'static str),

  #[error("Failed to write configuration to pipeline stdin")]
  WriteStdin(#[source] std::io::Error),

  #[error("Failed to wait for pipeline process")]
  Wait(#[source] std::io::Error),

  #[error("Pipeline timed out after {0} s")]
  Timeout(u64),

  #[error("Pipeline exited with {0:?}")]
  Failed(Option<i32>),

  #[error("Failed to read pipeline {target}")]
  Read {
    target: &'static str,
    #[source]
    source: std::io::Error,
  },

  #[error("Pipeline {0} task failed")]
  Task(&'static str, #[source] tokio::task::JoinError),
}
