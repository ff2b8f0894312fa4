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
use crate::listeners::Listeners;
use serde::Deserialize;
use serde::Serialize;

/// A note shown alongside the parameters of a model. Contributes no values.
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoParam {
  label: String,
  info: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  url: Option<String>,
  #[serde(skip)]
  listeners: Listeners,
}

impl InfoParam {
  pub fn new(label: impl Into<String>, info: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      info: info.into(),
      url: None,
      listeners: Listeners::new(),
    }
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.url = Some(url.into());
    self
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn info(&self) -> &str {
    &self.info
  }

  pub fn url(&self) -> Option<&str> {
    self.url.as_deref()
  }

  pub fn listeners(&self) -> &Listeners {
    &self.listeners
  }

  pub fn set_info(&mut self, info: impl Into<String>) -> &mut Self {
    let info = info.into();
    if self.info != info {
      self.info = info;
      self.listeners.notify();
    }
    self
  }

  pub fn describe(&self) -> String {
    match &self.url {
      Some(url) => format!("{}:\n - info: {}\n - url: {}", self.label, self.info, url),
      None => format!("{}:\n - info: {}", self.label, self.info),
    }
  }
}
