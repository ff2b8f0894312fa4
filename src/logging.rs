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
use std::env;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE_VAR: &str = "SWEEP_LOG_FILE";
pub const LOG_MAX_LINES_VAR: &str = "SWEEP_LOG_MAX_LINES";
pub const DEFAULT_MAX_LINES: usize = 10_000;

/// Sets up the global tracing subscriber.
///
/// Reads the `SWEEP_LOG_FILE` env var.
/// - If set, logs to that file, keeping at most `SWEEP_LOG_MAX_LINES` lines.
/// - If not set, logs to stderr.
///
/// Log level is controlled by the `RUST_LOG` env var (e.g., `RUST_LOG=info`).
/// The returned guard flushes the file writer when dropped and must be held
/// until the program exits.
pub fn setup_tracing() -> Result<Option<WorkerGuard>> {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  match env::var(LOG_FILE_VAR) {
    Ok(log_file) if !log_file.is_empty() => {
      let max_lines = match env::var(LOG_MAX_LINES_VAR) {
        Ok(raw) => raw
          .parse::<usize>()
          .with_context(|| format!("Invalid {LOG_MAX_LINES_VAR}: '{raw}'"))?,
        Err(_) => DEFAULT_MAX_LINES,
      };
      let log = CircularLogFile::open(&log_file, max_lines)
        .with_context(|| format!("Failed to open log file '{log_file}'"))?;
      let (non_blocking_writer, guard) = tracing_appender::non_blocking(log);

      tracing_subscriber::registry()
        .with(env_filter)
        .with(
          fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false),
        )
        .init();
      Ok(Some(guard))
    }
    _ => {
      tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
      Ok(None)
    }
  }
}

/// An append-only text file that drops its oldest lines so that it never
/// holds more than `max_lines` lines after a write.
#[derive(Debug)]
pub struct CircularLogFile {
  path: PathBuf,
  max_lines: usize,
  lines: usize,
  file: File,
}

impl CircularLogFile {
  pub fn open(path: impl AsRef<Path>, max_lines: usize) -> io::Result<Self> {
    let path = path.as_ref().to_path_buf();
    let lines = match fs::read(&path) {
      Ok(content) => count_lines(&content),
      Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
      Err(e) => return Err(e),
    };
    let file = append_to(&path)?;
    Ok(Self {
      path,
      max_lines: max_lines.max(1),
      lines,
      file,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Lines currently in the file.
  pub fn lines(&self) -> usize {
    self.lines
  }

  fn drop_oldest(&mut self, amount: usize) -> io::Result<()> {
    self.file.flush()?;
    let content = fs::read(&self.path)?;
    fs::write(&self.path, &content[skip_lines(&content, amount)..])?;
    self.file = append_to(&self.path)?;
    self.lines = self.lines.saturating_sub(amount);
    Ok(())
  }
}

impl Write for CircularLogFile {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    let incoming = count_lines(buf);
    if incoming > self.max_lines {
      // The write alone overflows the cap: keep only its newest lines.
      self.file.flush()?;
      fs::write(&self.path, &buf[skip_lines(buf, incoming - self.max_lines)..])?;
      self.file = append_to(&self.path)?;
      self.lines = self.max_lines;
      return Ok(buf.len());
    }
    let total = self.lines + incoming;
    if total > self.max_lines {
      self.drop_oldest((total - self.max_lines).min(self.lines))?;
    }
    self.file.write_all(buf)?;
    self.lines += incoming;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    self.file.flush()
  }
}

fn append_to(path: &Path) -> io::Result<File> {
  OpenOptions::new().create(true).append(true).open(path)
}

/// Byte offset just past the `amount`-th newline.
fn skip_lines(bytes: &[u8], amount: usize) -> usize {
  if amount == 0 {
    return 0;
  }
  bytes
    .iter()
    .enumerate()
    .filter(|(_, b)| **b == b'\n')
    .nth(amount - 1)
    .map_or(bytes.len(), |(i, _)| i + 1)
}

fn count_lines(bytes: &[u8]) -> usize {
  bytes.iter().filter(|b| **b == b'\n').count()
}
