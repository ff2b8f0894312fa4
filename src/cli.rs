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
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Parameter sweeps over tracking pipelines")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Prints how many configurations a sweep file describes.
  Count {
    #[arg(short, long, env = "SWEEP_CONFIG")]
    config: PathBuf,
  },

  /// Prints the configurations of a sweep as JSON lines.
  Plan {
    #[arg(short, long, env = "SWEEP_CONFIG")]
    config: PathBuf,

    #[command(flatten)]
    selection: SelectionArgs,
  },

  /// Runs the pipeline command once per configuration.
  Run {
    #[arg(short, long, env = "SWEEP_CONFIG")]
    config: PathBuf,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Kill a pipeline run after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
  },

  /// Prints the parameter ranges of the active models.
  Describe {
    /// Sweep file to describe.
    #[arg(short, long, env = "SWEEP_CONFIG", conflicts_with = "state")]
    config: Option<PathBuf>,

    /// Saved sweep state to describe instead of a sweep file.
    #[arg(long)]
    state: Option<PathBuf>,
  },

  /// Saves the plan built from a sweep file as a JSON state file.
  SaveState {
    #[arg(short, long, env = "SWEEP_CONFIG")]
    config: PathBuf,

    #[arg(long)]
    state: PathBuf,
  },

  /// Writes a sweep file listing every built-in model.
  Init {
    #[arg(short, long, default_value = "sweep.toml")]
    output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
  },

  /// Scores every XML file of a folder against a ground-truth file.
  Score {
    /// Ground-truth XML file.
    #[arg(long)]
    reference: PathBuf,

    /// Folder of candidate XML files.
    #[arg(long)]
    candidates: PathBuf,

    /// Results CSV. Defaults to a file named after the reference, next to
    /// the candidates folder.
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    scorer: ScorerArgs,
  },

  /// Scores every ground-truth file of `<gt>/<category>` against the
  /// candidates in `<results>/<category>/<ground-truth stem>`.
  ScoreAll {
    #[arg(long)]
    gt: PathBuf,

    #[arg(long)]
    results: PathBuf,

    #[arg(long = "category", default_values_t = default_categories())]
    categories: Vec<String>,

    #[command(flatten)]
    scorer: ScorerArgs,
  },
}

/// Which configurations of a sweep to visit.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
  /// Stop after this many configurations.
  #[arg(long)]
  pub limit: Option<usize>,

  /// Visit a random subset of this many configurations.
  #[arg(long)]
  pub sample: Option<usize>,

  /// Seed for `--sample`. A random seed is used and logged when omitted.
  #[arg(long, requires = "sample")]
  pub seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ScorerArgs {
  /// Scorer executable, called as `<scorer> <args..> <reference> <candidate>`.
  #[arg(long, env = "SWEEP_SCORER")]
  pub scorer: PathBuf,

  /// Argument passed to the scorer before the reference. Repeatable.
  #[arg(long = "scorer-arg", allow_hyphen_values = true)]
  pub scorer_args: Vec<String>,

  /// Candidates scored concurrently. Defaults to the available parallelism.
  #[arg(short, long)]
  pub jobs: Option<usize>,
}

fn default_categories() -> Vec<String> {
  ["MICROTUBULE", "VESICLE", "RECEPTOR"]
    .map(String::from)
    .to_vec()
}
