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
use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

use serde_json::Value;

const SWEEP: &str = r#"
target_channel = 2

[pipeline]
command = "sh"
args = ["-c", "cat > /dev/null; echo '{\"quality\": 0.5}'"]

[[models]]
name = "LoG detector"
active = true

[models.params.THRESHOLD]
kind = "manual"
values = [10.0, 20.0, 30.0]

[models.params.DO_MEDIAN_FILTERING]
kind = "both"

[[models]]
name = "Simple LAP tracker"
active = true

[models.params.LINKING_MAX_DISTANCE]
kind = "fixed"
value = 15.0
"#;

const REFERENCE: &str = r#"<root>
  <TrackContestISBI2012 snr="4" density="low" scenario="VESICLE">
    <particle><detection t="0" x="1" y="2" z="0"/></particle>
  </TrackContestISBI2012>
</root>
"#;

fn sweep() -> Command {
  let mut cmd = Command::new(cargo::cargo_bin!("sweep"));
  cmd
    .env("CLICOLOR", "0")
    .env_remove("SWEEP_LOG_FILE")
    .env_remove("SWEEP_CONFIG");
  cmd
}

fn write_sweep(dir: &Path) -> std::path::PathBuf {
  let path = dir.join("sweep.toml");
  fs::write(&path, SWEEP).unwrap();
  path
}

#[test]
fn test_count() {
  let temp = tempdir().unwrap();
  let config = write_sweep(temp.path());

  // 3 thresholds x 2 median settings, one tracker setting.
  sweep()
    .arg("count")
    .arg("-c")
    .arg(&config)
    .assert()
    .success()
    .stdout("6\n");
}

#[test]
fn test_plan_prints_one_json_line_per_configuration() {
  let temp = tempdir().unwrap();
  let config = write_sweep(temp.path());

  let out = sweep().arg("plan").arg("-c").arg(&config).output().unwrap();
  assert!(out.status.success());
  let stdout = String::from_utf8(out.stdout).unwrap();
  let lines: Vec<Value> = stdout
    .lines()
    .map(|l| serde_json::from_str(l).unwrap())
    .collect();
  assert_eq!(lines.len(), 6);
  assert_eq!(lines[0]["index"], 0);
  assert_eq!(lines[0]["configuration"]["target_channel"], 2);
  assert_eq!(lines[0]["configuration"]["detector"]["name"], "LoG detector");
  assert_eq!(
    lines[0]["configuration"]["tracker"]["name"],
    "Simple LAP tracker"
  );
}

#[test]
fn test_plan_limit_and_sample() {
  let temp = tempdir().unwrap();
  let config = write_sweep(temp.path());

  let limited = sweep()
    .args(["plan", "--limit", "2", "-c"])
    .arg(&config)
    .output()
    .unwrap();
  assert_eq!(String::from_utf8(limited.stdout).unwrap().lines().count(), 2);

  let sampled = |seed: &str| {
    let out = sweep()
      .args(["plan", "--sample", "3", "--seed", seed, "-c"])
      .arg(&config)
      .output()
      .unwrap();
    String::from_utf8(out.stdout).unwrap()
  };
  let first = sampled("7");
  assert_eq!(first.lines().count(), 3);
  assert_eq!(first, sampled("7"));
}

#[test]
fn test_unknown_model_fails() {
  let temp = tempdir().unwrap();
  let config = temp.path().join("sweep.toml");
  fs::write(&config, "[[models]]\nname = \"Unlisted detector\"\nactive = true\n").unwrap();

  sweep()
    .arg("count")
    .arg("-c")
    .arg(&config)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Unknown model 'Unlisted detector'"));
}

#[test]
fn test_missing_sweep_file_fails() {
  sweep()
    .args(["count", "-c", "non_existent_sweep.toml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Sweep file not found"));
}

#[test]
fn test_init_then_describe() {
  let temp = tempdir().unwrap();
  let output = temp.path().join("template.toml");

  sweep()
    .arg("init")
    .arg("-o")
    .arg(&output)
    .assert()
    .success()
    .stderr(predicate::str::contains("Sweep file written"));

  // Refuses to overwrite.
  sweep().arg("init").arg("-o").arg(&output).assert().failure();

  sweep()
    .arg("describe")
    .arg("-c")
    .arg(&output)
    .assert()
    .success()
    .stdout(predicate::str::contains("[inactive] LoG detector"))
    .stdout(predicate::str::contains("Configurations: 0"));
}

#[test]
fn test_save_state_then_describe_state() {
  let temp = tempdir().unwrap();
  let config = write_sweep(temp.path());
  let state = temp.path().join("state.json");

  sweep()
    .arg("save-state")
    .arg("-c")
    .arg(&config)
    .arg("--state")
    .arg(&state)
    .assert()
    .success();

  let saved: Value = serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
  assert_eq!(saved["active"]["LoG detector"], true);

  sweep()
    .arg("describe")
    .arg("--state")
    .arg(&state)
    .assert()
    .success()
    .stdout(predicate::str::contains("[active] LoG detector"));
}

#[test]
fn test_run_emits_records() {
  let temp = tempdir().unwrap();
  let config = write_sweep(temp.path());

  let out = sweep()
    .args(["run", "--limit", "2", "-c"])
    .arg(&config)
    .output()
    .unwrap();
  assert!(out.status.success());
  let records: Vec<Value> = String::from_utf8(out.stdout)
    .unwrap()
    .lines()
    .map(|l| serde_json::from_str(l).unwrap())
    .collect();
  assert_eq!(records.len(), 2);
  assert_eq!(records[1]["index"], 1);
  assert_eq!(records[1]["detector"], "LoG detector");
  assert_eq!(records[1]["output"]["quality"], 0.5);
}

#[test]
fn test_run_without_pipeline_fails() {
  let temp = tempdir().unwrap();
  let config = temp.path().join("sweep.toml");
  fs::write(&config, "[[models]]\nname = \"LoG detector\"\nactive = true\n").unwrap();

  sweep()
    .arg("run")
    .arg("-c")
    .arg(&config)
    .assert()
    .failure()
    .stderr(predicate::str::contains("No pipeline command configured"));
}

#[test]
fn test_score_appends_csv() {
  let temp = tempdir().unwrap();
  let reference = temp.path().join("VESICLE snr 4.xml");
  fs::write(&reference, REFERENCE).unwrap();
  let candidates = temp.path().join("candidates");
  fs::create_dir(&candidates).unwrap();
  fs::write(candidates.join("run-0.xml"), "<root/>").unwrap();
  fs::write(candidates.join("run-1.xml"), "<root/>").unwrap();

  let score = || {
    let mut cmd = sweep();
    cmd
      .arg("score")
      .arg("--reference")
      .arg(&reference)
      .arg("--candidates")
      .arg(&candidates)
      .args(["--scorer", "sh", "--scorer-arg", "-c"])
      .args(["--scorer-arg", "echo 0.5, 0.25, 0.75, 1.0, 3.0", "--scorer-arg", "scorer"])
      .args(["--jobs", "2"]);
    cmd
  };

  score().assert().success();
  let output = temp.path().join("VESICLE snr 4.csv");
  let content = fs::read_to_string(&output).unwrap();
  let lines: Vec<&str> = content.lines().collect();
  assert_eq!(lines[0], "name, alpha, beta, detectionsJaccard, tracksJaccard, rmse");
  assert_eq!(lines.len(), 3);
  assert!(lines.contains(&"run-0.xml, 0.500000, 0.250000, 0.750000, 1.000000, 3.000000"));

  // Second pass skips everything already scored.
  score()
    .assert()
    .success()
    .stderr(predicate::str::contains("Skipping."));
  assert_eq!(fs::read_to_string(&output).unwrap(), content);
}

#[test]
fn test_score_rejects_foreign_reference() {
  let temp = tempdir().unwrap();
  let reference = temp.path().join("tracks.xml");
  fs::write(&reference, "<Tracks/>").unwrap();
  let candidates = temp.path().join("candidates");
  fs::create_dir(&candidates).unwrap();

  sweep()
    .arg("score")
    .arg("--reference")
    .arg(&reference)
    .arg("--candidates")
    .arg(&candidates)
    .args(["--scorer", "true"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not a recognized ground-truth file"));
}
