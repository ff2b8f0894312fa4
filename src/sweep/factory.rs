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
use crate::settings::ModuleSettings;
use crate::settings::Settings;
use crate::settings::Value;
use serde::Deserialize;
use serde::Serialize;

/// Describes one detection or tracking algorithm and its default settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmFactory {
  key: String,
  name: String,
  defaults: Settings,
}

impl AlgorithmFactory {
  pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      name: name.into(),
      defaults: Settings::new(),
    }
  }

  pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.defaults.insert(key.into(), value.into());
    self
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// A fresh copy of the default settings.
  pub fn default_settings(&self) -> Settings {
    self.defaults.clone()
  }

  /// An independent factory, so that one sweep cannot alter another's defaults.
  pub fn copy(&self) -> Self {
    self.clone()
  }

  /// The configuration fragment this factory installs before any override.
  pub fn fragment(&self) -> ModuleSettings {
    ModuleSettings {
      key: self.key.clone(),
      name: self.name.clone(),
      settings: self.default_settings(),
    }
  }
}
