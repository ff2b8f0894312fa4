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
//! Cartesian product over restartable sequences.
//!
//! Unlike [`crate::combinations::Combinations`], sources are never indexed:
//! a source that runs dry is restarted from scratch. Each source must yield
//! the same sequence every time it is restarted; this is not checked.
use crate::odometer;
use crate::odometer::Step;

/// A sequence that can be iterated from the start any number of times.
pub trait Restartable {
  type Item;
  type Iter: Iterator<Item = Self::Item>;

  fn restart(&self) -> Self::Iter;
}

impl<S> Restartable for S
where
  S: IntoIterator + Clone,
{
  type Item = S::Item;
  type Iter = S::IntoIter;

  fn restart(&self) -> Self::Iter {
    self.clone().into_iter()
  }
}

/// Yields one `Vec` per tuple of the product, last source varying fastest.
pub struct NestedIterator<S: Restartable> {
  sources: Vec<S>,
  iters: Vec<S::Iter>,
  current: Vec<S::Item>,
  exhausted: bool,
}

impl<S> NestedIterator<S>
where
  S: Restartable,
  S::Item: Clone,
{
  pub fn new(sources: Vec<S>) -> Self {
    let mut iters: Vec<S::Iter> = sources.iter().map(Restartable::restart).collect();
    let current: Option<Vec<S::Item>> = iters.iter_mut().map(Iterator::next).collect();
    let (current, exhausted) = match current {
      Some(current) if !sources.is_empty() => (current, false),
      _ => (Vec::new(), true),
    };
    Self {
      sources,
      iters,
      current,
      exhausted,
    }
  }

  fn step(&mut self) -> bool {
    let Self {
      sources,
      iters,
      current,
      ..
    } = self;
    let mut restart_failed = false;
    let more = odometer::advance(iters.len(), |i| {
      if let Some(value) = iters[i].next() {
        current[i] = value;
        return Step::Advanced;
      }
      let mut fresh = sources[i].restart();
      match fresh.next() {
        Some(first) => current[i] = first,
        None => restart_failed = true,
      }
      iters[i] = fresh;
      Step::Wrapped
    });
    more && !restart_failed
  }
}

impl<S> Iterator for NestedIterator<S>
where
  S: Restartable,
  S::Item: Clone,
{
  type Item = Vec<S::Item>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.exhausted {
      return None;
    }
    let tuple = self.current.clone();
    self.exhausted = !self.step();
    Some(tuple)
  }
}
