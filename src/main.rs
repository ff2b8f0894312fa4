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
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use sweeplab::cli::Cli;
use sweeplab::cli::Commands;
use sweeplab::cli::ScorerArgs;
use sweeplab::cli::SelectionArgs;
use sweeplab::command::CommandArgs;
use sweeplab::config::SweepFile;
use sweeplab::config::load_sweep_file;
use sweeplab::logging::setup_tracing;
use sweeplab::runner::Selection;
use sweeplab::runner::generate_seed;
use sweeplab::runner::run_sweep;
use sweeplab::scoring::BatchOptions;
use sweeplab::scoring::batch;
use sweeplab::scoring::discover_batches;
use sweeplab::sweep::state::load_state;
use sweeplab::sweep::state::save_state;
use tracing::Instrument;

#[tokio::main]
async fn main() -> Result<()> {
  let _guard = setup_tracing()?;

  let Cli { command } = Cli::parse();
  execute(command)
    .instrument(tracing::info_span!("sweep"))
    .await
}

async fn execute(command: Commands) -> Result<()> {
  match command {
    Commands::Count { config } => {
      let plan = load_sweep_file(&config)?.build_plan()?;
      tracing::info!(
        detectors = plan.count_detector_settings(),
        trackers = plan.count_tracker_settings(),
        "Counted settings"
      );
      println!("{}", plan.count());
    }
    Commands::Plan { config, selection } => {
      let file = load_sweep_file(&config)?;
      let plan = file.build_plan()?;
      let base = file.base();
      for (index, configuration) in selection_from(selection).apply(&plan, &base) {
        let line = serde_json::json!({ "index": index, "configuration": configuration });
        println!("{line}");
      }
    }
    Commands::Run {
      config,
      selection,
      timeout_secs,
    } => {
      let file = load_sweep_file(&config)?;
      let plan = file.build_plan()?;
      let pipeline = file.pipeline()?;
      tracing::info!(configurations = plan.count(), "Initializing sweep run...");

      let summary = run_sweep(
        &plan,
        &file.base(),
        pipeline,
        selection_from(selection),
        timeout_secs.map(Duration::from_secs),
      )
      .await?;
      if summary.failed > 0 {
        bail!(
          "{} of {} configurations failed",
          summary.failed,
          summary.failed + summary.succeeded
        );
      }
    }
    Commands::Describe { config, state } => {
      let plan = match (config, state) {
        (_, Some(state)) => load_state(&state)?,
        (Some(config), None) => load_sweep_file(&config)?.build_plan()?,
        (None, None) => bail!("Pass a sweep file with --config or a state file with --state"),
      };
      println!("{}", plan.describe());
      println!("\nConfigurations: {}", plan.count());
    }
    Commands::SaveState { config, state } => {
      let plan = load_sweep_file(&config)?.build_plan()?;
      save_state(&state, &plan)?;
      tracing::info!(path = %state.display(), "Sweep state saved");
    }
    Commands::Init { output, force } => {
      if output.exists() && !force {
        bail!(
          "{} already exists. Pass --force to overwrite it.",
          output.display()
        );
      }
      SweepFile::template().write_toml(&output)?;
      tracing::info!(path = %output.display(), "Sweep file written");
    }
    Commands::Score {
      reference,
      candidates,
      output,
      scorer,
    } => {
      let options = batch_options(scorer, output)?;
      let summary = batch(&reference, &candidates, &options).await?;
      println!("{}", summary.output.display());
    }
    Commands::ScoreAll {
      gt,
      results,
      categories,
      scorer,
    } => {
      let options = batch_options(scorer, None)?;
      let pairs = discover_batches(&gt, &results, &categories)?;
      let mut failed = 0;
      for (reference, candidates) in &pairs {
        if let Err(e) = score_folder(reference, candidates, &options).await {
          tracing::error!(error = ?e, "Batch for {} failed. Skipping.", reference.display());
          failed += 1;
        }
      }
      if failed > 0 {
        bail!("{} of {} batches failed", failed, pairs.len());
      }
    }
  }

  Ok(())
}

async fn score_folder(reference: &Path, candidates: &Path, options: &BatchOptions) -> Result<()> {
  let summary = batch(reference, candidates, options)
    .await
    .with_context(|| format!("Scoring {}", candidates.display()))?;
  println!("{}", summary.output.display());
  Ok(())
}

fn selection_from(SelectionArgs { limit, sample, seed }: SelectionArgs) -> Selection {
  let seed = seed.unwrap_or_else(generate_seed);
  if sample.is_some() {
    tracing::info!(seed, "Sampling configurations");
  }
  Selection {
    limit,
    sample,
    seed,
  }
}

fn batch_options(
  ScorerArgs {
    scorer,
    scorer_args,
    jobs,
  }: ScorerArgs,
  output: Option<std::path::PathBuf>,
) -> Result<BatchOptions> {
  let jobs = match jobs {
    Some(0) => bail!("--jobs must be at least 1"),
    Some(jobs) => jobs,
    None => std::thread::available_parallelism()
      .map(usize::from)
      .unwrap_or(1),
  };
  Ok(BatchOptions {
    scorer: CommandArgs::new(scorer, scorer_args),
    jobs,
    output,
  })
}
