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
//! Batch scoring of tracking results against a ground-truth file.
//!
//! Every `.xml` file in a candidates folder is handed to an external scorer
//! together with the reference. Scores are appended to a CSV file next to
//! the candidates folder. Candidates already listed in that file are skipped,
//! so an interrupted batch can simply be run again.
use crate::command::CommandArgs;
use crate::error::ScoringError;
use anyhow::Context;
use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::Semaphore;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::Instrument;

pub const CSV_HEADER: &str = "name, alpha, beta, detectionsJaccard, tracksJaccard, rmse";

/// The five metrics of the particle tracking challenge, in CSV column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
  pub alpha: f64,
  pub beta: f64,
  pub detections_jaccard: f64,
  pub tracks_jaccard: f64,
  pub rmse: f64,
}

impl Scores {
  pub fn csv_row(&self, name: &str) -> String {
    format!(
      "{}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}",
      name, self.alpha, self.beta, self.detections_jaccard, self.tracks_jaccard, self.rmse
    )
  }
}

/// Parses the last non-empty line of the scorer's output.
pub fn parse_scores(output: &str) -> Result<Scores, ScoringError> {
  let line = output
    .lines()
    .map(str::trim)
    .rfind(|l| !l.is_empty())
    .unwrap_or("");
  let parts: Vec<&str> = line.split(',').map(str::trim).collect();
  if parts.len() != 5 {
    return Err(ScoringError::ScoreParts {
      parts: if line.is_empty() { 0 } else { parts.len() },
      line: line.to_string(),
    });
  }
  let mut values = [0.0; 5];
  for (slot, part) in values.iter_mut().zip(&parts) {
    *slot = part.parse::<f64>().map_err(|source| ScoringError::ParseScore {
      value: part.to_string(),
      source,
    })?;
  }
  let [alpha, beta, detections_jaccard, tracks_jaccard, rmse] = values;
  Ok(Scores {
    alpha,
    beta,
    detections_jaccard,
    tracks_jaccard,
    rmse,
  })
}

/// Checks that `reference` is a particle tracking challenge ground-truth file.
pub fn sniff_reference(reference: &Path) -> Result<(), ScoringError> {
  let content = fs::read_to_string(reference)
    .map_err(|_| ScoringError::ReferenceNotFound(reference.to_path_buf()))?;
  if !content.contains("<root") {
    return Err(ScoringError::UnrecognizedReference(reference.to_path_buf()));
  }
  if !content.contains("<TrackContestISBI2012") {
    return Err(ScoringError::UnsupportedReference(reference.to_path_buf()));
  }
  Ok(())
}

/// `<candidates parent>/<reference name with .xml replaced by .csv>`.
pub fn default_output(reference: &Path, candidates: &Path) -> PathBuf {
  let name = reference
    .file_name()
    .map(|n| n.to_string_lossy().replace(".xml", ".csv"))
    .unwrap_or_else(|| "scores.csv".to_string());
  let parent = candidates
    .canonicalize()
    .ok()
    .and_then(|c| c.parent().map(Path::to_path_buf))
    .unwrap_or_else(|| PathBuf::from("."));
  parent.join(name)
}

/// Names already present in `output`, or an empty set when it does not exist.
pub fn read_skip_set(output: &Path) -> Result<HashSet<String>, ScoringError> {
  if !output.is_file() {
    return Ok(HashSet::new());
  }
  let content = fs::read_to_string(output).map_err(|source| ScoringError::ReadResults {
    path: output.to_path_buf(),
    source,
  })?;
  Ok(
    content
      .lines()
      .filter_map(|line| line.split_once(','))
      .map(|(name, _)| name.to_string())
      .collect(),
  )
}

/// The `.xml` files of `dir`, sorted by name.
pub fn list_candidates(dir: &Path) -> Result<Vec<PathBuf>, ScoringError> {
  if !dir.is_dir() {
    return Err(ScoringError::CandidatesNotFound(dir.to_path_buf()));
  }
  let read_error = |source: std::io::Error| ScoringError::ReadCandidates {
    path: dir.to_path_buf(),
    source,
  };
  let mut files = Vec::new();
  for entry in fs::read_dir(dir).map_err(read_error)? {
    let path = entry.map_err(read_error)?.path();
    if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

/// Runs `<scorer> <args..> <reference> <candidate>` and parses its scores.
pub async fn score_candidate(
  scorer: &CommandArgs,
  reference: &Path,
  candidate: &Path,
) -> Result<Scores, ScoringError> {
  let name = candidate.display().to_string();
  let mut cmd = scorer.piped();
  cmd.arg(reference).arg(candidate);
  tracing::debug!(cmd = ?cmd, "Spawning scorer");
  let spawn_error = |source: std::io::Error| ScoringError::SpawnScorer {
    candidate: name.clone(),
    source,
  };
  let mut child = cmd.spawn().map_err(spawn_error)?;
  let mut stdout = child
    .stdout
    .take()
    .ok_or_else(|| spawn_error(std::io::Error::other("scorer stdout not piped")))?;
  let stderr = child
    .stderr
    .take()
    .ok_or_else(|| spawn_error(std::io::Error::other("scorer stderr not piped")))?;
  let stderr_task = tokio::spawn(
    collect_stderr(stderr).instrument(tracing::info_span!("stderr_handler", target = "scorer")),
  );

  let mut output = String::new();
  stdout
    .read_to_string(&mut output)
    .await
    .map_err(spawn_error)?;
  let status = child.wait().await.map_err(spawn_error)?;
  let stderr = match stderr_task.await {
    Ok(Ok(text)) => text,
    Ok(Err(e)) => {
      tracing::warn!(error = %e, "Failed to read scorer stderr");
      String::new()
    }
    Err(e) => {
      tracing::warn!(error = %e, "Scorer stderr task failed");
      String::new()
    }
  };

  if !status.success() {
    return Err(ScoringError::ScorerFailed {
      candidate: name,
      code: status.code(),
      stderr: stderr.trim().to_string(),
    });
  }
  parse_scores(&output)
}

/// Logs every stderr line of the scorer and returns them joined.
async fn collect_stderr<R: AsyncRead + Unpin>(stream: R) -> std::io::Result<String> {
  let mut lines = BufReader::new(stream).lines();
  let mut text = String::new();
  while let Some(line) = lines.next_line().await? {
    tracing::warn!(stream = "stderr", "{}", line);
    text.push_str(&line);
    text.push('\n');
  }
  Ok(text)
}

/// How to run a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
  pub scorer: CommandArgs,
  /// Number of candidates scored concurrently.
  pub jobs: usize,
  /// Results file; see [`default_output`] when unset.
  pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
  pub output: PathBuf,
  pub scored: usize,
  pub skipped: usize,
  pub failed: usize,
}

/// Scores every candidate of `candidates` against `reference`.
///
/// Candidates are scored by up to `jobs` concurrent scorer processes. A
/// single task owns the results file and appends rows as they arrive, so
/// rows follow completion order. A failing candidate is logged and skipped.
pub async fn batch(reference: &Path, candidates: &Path, options: &BatchOptions) -> Result<BatchSummary> {
  let span = tracing::info_span!("batch", candidates = %candidates.display());

  async {
    sniff_reference(reference)?;
    let files = list_candidates(candidates)?;
    let output = options
      .output
      .clone()
      .unwrap_or_else(|| default_output(reference, candidates));

    let done = read_skip_set(&output)?;
    if !output.is_file() {
      fs::write(&output, format!("{CSV_HEADER}\n")).map_err(|source| ScoringError::WriteResults {
        path: output.clone(),
        source,
      })?;
    }
    tracing::info!(
      output = %output.display(),
      candidates = files.len(),
      "Processing {}",
      candidates.display()
    );

    let (tx, rx) = mpsc::channel::<String>(64);
    let appender = tokio::spawn(
      append_rows(output.clone(), rx).instrument(tracing::info_span!("appender")),
    );

    let semaphore = Arc::new(Semaphore::new(options.jobs.max(1)));
    let scorer = Arc::new(options.scorer.clone());
    let reference = Arc::new(reference.to_path_buf());
    let mut workers = JoinSet::new();
    let mut skipped = 0;

    for file in files {
      let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
      if done.contains(&name) {
        tracing::info!("Found results in target file for {}. Skipping.", name);
        skipped += 1;
        continue;
      }

      let permit = Arc::clone(&semaphore)
        .acquire_owned()
        .await
        .context("Scoring pool closed")?;
      let scorer = Arc::clone(&scorer);
      let reference = Arc::clone(&reference);
      let tx = tx.clone();
      let worker_span = tracing::info_span!("score", candidate = %name);
      workers.spawn(
        async move {
          let _permit = permit;
          let start = Instant::now();
          tracing::info!("Processing {}", name);
          match score_candidate(&scorer, &reference, &file).await {
            Ok(scores) => {
              if tx.send(scores.csv_row(&name)).await.is_err() {
                tracing::error!("Results appender stopped. Dropping scores for {}.", name);
                return false;
              }
              tracing::info!(
                "Processed {} in {:.1} s.",
                name,
                start.elapsed().as_secs_f64()
              );
              true
            }
            Err(e) => {
              tracing::error!(error = %e, "Trouble dealing with file {}. Skipping.", name);
              false
            }
          }
        }
        .instrument(worker_span),
      );
    }
    drop(tx);

    let mut scored = 0;
    let mut failed = 0;
    while let Some(joined) = workers.join_next().await {
      match joined {
        Ok(true) => scored += 1,
        Ok(false) => failed += 1,
        Err(e) => {
          tracing::error!(error = %e, "Scoring task panicked");
          failed += 1;
        }
      }
    }
    appender.await.context("Results appender task failed")??;

    tracing::info!(scored, skipped, failed, "Finished processing {}", candidates.display());
    Ok::<_, anyhow::Error>(BatchSummary {
      output,
      scored,
      skipped,
      failed,
    })
  }
  .instrument(span)
  .await
}

/// Appends every received row to `output`, one line each.
async fn append_rows(output: PathBuf, mut rows: mpsc::Receiver<String>) -> Result<usize, ScoringError> {
  let write_error = |source: std::io::Error| ScoringError::WriteResults {
    path: output.clone(),
    source,
  };
  let mut file = tokio::fs::OpenOptions::new()
    .append(true)
    .open(&output)
    .await
    .map_err(write_error)?;
  let mut written = 0;
  while let Some(row) = rows.recv().await {
    file
      .write_all(format!("{row}\n").as_bytes())
      .await
      .map_err(write_error)?;
    file.flush().await.map_err(write_error)?;
    written += 1;
  }
  Ok(written)
}

/// Pairs every ground-truth file of `<gt_root>/<category>` with its
/// candidates folder `<results_root>/<category>/<file stem>`.
pub fn discover_batches(
  gt_root: &Path,
  results_root: &Path,
  categories: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>, ScoringError> {
  let mut pairs = Vec::new();
  for category in categories {
    let gt_dir = gt_root.join(category);
    let references = list_candidates(&gt_dir).map_err(|_| ScoringError::NoReferences(gt_dir.clone()))?;
    if references.is_empty() {
      return Err(ScoringError::NoReferences(gt_dir));
    }
    for reference in references {
      let Some(stem) = reference.file_stem() else {
        continue;
      };
      let folder = results_root.join(category).join(stem);
      pairs.push((reference, folder));
    }
  }
  Ok(pairs)
}
