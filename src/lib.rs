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

//! # Sweeplab
//!
//! `sweeplab` enumerates parameter sweeps over a two-stage tracking pipeline
//! (a spot detector followed by a tracker), runs an external pipeline command
//! for every configuration, and scores the resulting tracks against a
//! ground truth.
//!
//! This crate contains the library behind the `sweep` CLI.
//!
//! ## Core Modules
//!
//! * [`range`]: Value ranges of a single parameter: fixed, linear, log and
//!   manual numbers, choices, flags, strings and informational placeholders.
//! * [`combinations`] and [`nested`]: Odometer enumeration of every
//!   combination of several value lists, or of several restartable sources.
//! * [`sweep`]: Sweep models (ranged parameters of one algorithm factory),
//!   the sweep plan over all detectors and trackers, and its saved state.
//! * [`catalog`]: The built-in detector and tracker models.
//! * [`config`]: Sweep files, loaded with `figment` from TOML or JSON.
//! * [`runner`]: Runs the pipeline command for every configuration.
//! * [`scoring`]: Batch scoring of result files with an external scorer.
//! * [`cli`]: Defines the `clap`-based command-line interface.
//! * [`error`]: Defines the custom error types for the library.
//! * [`logging`]: Provides the `setup_tracing` utility.

pub mod catalog;
pub mod cli;
pub mod combinations;
pub mod command;
pub mod config;
pub mod error;
pub mod listeners;
pub mod logging;
pub mod nested;
mod odometer;
pub mod range;
pub mod runner;
pub mod scoring;
pub mod settings;
pub mod sweep;
