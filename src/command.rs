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
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// An external command and its base arguments: the pipeline that runs one
/// configuration, or the scorer that compares one result to the ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandArgs {
  /// The command to execute (e.g., "python3" or "/path/to/binary").
  pub command: PathBuf,

  /// Arguments passed before any per-invocation argument (e.g., ["./run.py"]).
  #[serde(default)]
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<String>,
}

impl CommandArgs {
  pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
    Self {
      command: command.into(),
      args,
    }
  }

  /// A process builder with piped stdout and stderr, killed when dropped.
  pub fn piped(&self) -> Command {
    let mut cmd = Command::new(&self.command);
    cmd
      .args(&self.args)
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);
    cmd
  }
}

impl fmt::Display for CommandArgs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command.display())?;
    for arg in &self.args {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}
