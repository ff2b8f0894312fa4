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
//! Runs the external pipeline once per configuration of a sweep.
use crate::command::CommandArgs;
use crate::error::RunError;
use crate::settings::PipelineConfig;
use crate::sweep::plan::SweepPlan;
use anyhow::Result;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tracing::Instrument;

/// Generates a fresh 64-bit seed.
pub fn generate_seed() -> u64 {
  let mut rng = rand::rng();
  rng.next_u64()
}

/// Which configurations of a sweep to visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
  /// Visit at most this many configurations.
  pub limit: Option<usize>,
  /// Visit a random subset of this size, drawn with `seed`.
  pub sample: Option<usize>,
  pub seed: u64,
}

impl Selection {
  /// Lazily yields `(index, configuration)` pairs, `index` counting over the
  /// full sweep.
  pub fn apply<'a>(
    &self,
    plan: &'a SweepPlan,
    base: &PipelineConfig,
  ) -> impl Iterator<Item = (usize, PipelineConfig)> + use<'a> {
    let picked = self.sample.map(|amount| sample_indices(plan.count(), amount, self.seed));
    plan
      .configurations(base)
      .enumerate()
      .filter(move |(index, _)| picked.as_ref().is_none_or(|p| p.contains(index)))
      .take(self.limit.unwrap_or(usize::MAX))
  }
}

/// `amount` distinct indices below `total`, chosen uniformly from `seed`.
pub fn sample_indices(total: usize, amount: usize, seed: u64) -> BTreeSet<usize> {
  let mut rng = StdRng::seed_from_u64(seed);
  rand::seq::index::sample(&mut rng, total, amount.min(total))
    .into_iter()
    .collect()
}

/// One line printed by the pipeline for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
  pub index: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detector: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tracker: Option<String>,
  /// The line, parsed as JSON when possible.
  pub output: serde_json::Value,
}

/// Outcome counts of a sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub succeeded: usize,
  pub failed: usize,
}

/// Runs `pipeline` for every selected configuration, printing records as JSONL.
///
/// A failing configuration is logged and skipped.
pub async fn run_sweep(
  plan: &SweepPlan,
  base: &PipelineConfig,
  pipeline: &CommandArgs,
  selection: Selection,
  timeout: Option<Duration>,
) -> Result<RunSummary> {
  let span = tracing::info_span!(
    "run_sweep",
    pipeline = %pipeline,
    total = plan.count()
  );

  async {
    tracing::info!("--- Starting Sweep ---");
    let mut summary = RunSummary::default();
    for (index, config) in selection.apply(plan, base) {
      let config_span = tracing::info_span!(
        "run_configuration",
        index,
        detector = config.detector.as_ref().map(|d| d.name.as_str()).unwrap_or("none"),
        tracker = config.tracker.as_ref().map(|t| t.name.as_str()).unwrap_or("none")
      );
      match run_configuration(pipeline, index, &config, timeout)
        .instrument(config_span)
        .await
      {
        Ok(records) => {
          for record in records {
            println!("{}", serde_json::to_string(&record)?);
          }
          summary.succeeded += 1;
        }
        Err(e) => {
          tracing::error!(index, error = %e, "Configuration failed. Skipping.");
          summary.failed += 1;
        }
      }
    }
    tracing::info!(
      succeeded = summary.succeeded,
      failed = summary.failed,
      "--- Sweep complete ---"
    );
    Ok::<_, anyhow::Error>(summary)
  }
  .instrument(span)
  .await
}

/// Spawns the pipeline for one configuration, written as JSON to its stdin.
pub async fn run_configuration(
  pipeline: &CommandArgs,
  index: usize,
  config: &PipelineConfig,
  timeout: Option<Duration>,
) -> Result<Vec<RunRecord>, RunError> {
  let payload = serde_json::to_vec(config)?;

  let mut cmd = pipeline.piped();
  cmd.stdin(Stdio::piped());
  tracing::debug!(cmd = ?cmd, "Spawning pipeline");
  let mut child = cmd.spawn().map_err(RunError::SpawnPipeline)?;

  let mut stdin = child.stdin.take().ok_or(RunError::Pipe("stdin"))?;
  let stdout = child.stdout.take().ok_or(RunError::Pipe("stdout"))?;
  let stderr = child.stderr.take().ok_or(RunError::Pipe("stderr"))?;

  let template = RunRecord {
    index,
    detector: config.detector.as_ref().map(|d| d.name.clone()),
    tracker: config.tracker.as_ref().map(|t| t.name.clone()),
    output: serde_json::Value::Null,
  };
  let stdout_task = tokio::spawn(
    collect_pipeline_stdout(stdout, template)
      .instrument(tracing::info_span!("stdout_handler", target = "pipeline")),
  );
  let stderr_task = tokio::spawn(
    read_and_log_stderr(stderr, "pipeline")
      .instrument(tracing::info_span!("stderr_handler", target = "pipeline")),
  );

  match stdin.write_all(&payload).await {
    Ok(()) => {}
    // The pipeline may exit without reading its configuration.
    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
      tracing::debug!("Pipeline closed stdin before reading the configuration");
    }
    Err(e) => return Err(RunError::WriteStdin(e)),
  }
  drop(stdin);

  let status = match timeout {
    Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
      Ok(status) => status,
      Err(_) => {
        if let Err(e) = child.kill().await {
          tracing::warn!(error = %e, "Failed to kill timed-out pipeline");
        }
        stdout_task.abort();
        stderr_task.abort();
        return Err(RunError::Timeout(limit.as_secs()));
      }
    },
    None => child.wait().await,
  }
  .map_err(RunError::Wait)?;

  let records = stdout_task
    .await
    .map_err(|e| RunError::Task("stdout", e))??;
  stderr_task
    .await
    .map_err(|e| RunError::Task("stderr", e))??;

  if !status.success() {
    return Err(RunError::Failed(status.code()));
  }
  Ok(records)
}

/// Reads the pipeline's stdout into one record per non-empty line.
async fn collect_pipeline_stdout<R: AsyncRead + Unpin>(
  stream: R,
  template: RunRecord,
) -> Result<Vec<RunRecord>, RunError> {
  let mut reader = BufReader::new(stream).lines();
  let mut records = Vec::new();

  while let Some(line) = reader
    .next_line()
    .await
    .map_err(|source| RunError::Read {
      target: "stdout",
      source,
    })?
  {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    let output = serde_json::from_str(line)
      .unwrap_or_else(|_| serde_json::Value::String(line.to_string()));
    records.push(RunRecord {
      output,
      ..template.clone()
    });
  }
  Ok(records)
}

/// Reads lines from a process's stderr and logs them.
async fn read_and_log_stderr<R: AsyncRead + Unpin>(
  stream: R,
  target: &'static str,
) -> Result<(), RunError> {
  let mut reader = BufReader::new(stream).lines();

  while let Some(line) = reader
    .next_line()
    .await
    .map_err(|source| RunError::Read {
      target: "stderr",
      source,
    })?
  {
    tracing::warn!(target, "{}", line);
  }
  Ok(())
}
