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
//! Lazy Cartesian product over named value lists.
use crate::odometer;
use crate::odometer::Step;

/// One value chosen for every key, in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination<T> {
  entries: Vec<(String, T)>,
}

impl<T> Combination<T> {
  pub fn get(&self, key: &str) -> Option<&T> {
    self
      .entries
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, value)| value)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl<T> IntoIterator for Combination<T> {
  type Item = (String, T);
  type IntoIter = std::vec::IntoIter<(String, T)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

/// Odometer over an ordered `key -> values` mapping.
///
/// The first key is the most significant digit and the last key varies
/// fastest. An empty mapping, or one holding an empty list, yields nothing.
/// Single use and forward only.
#[derive(Debug)]
pub struct Combinations<T> {
  keys: Vec<String>,
  values: Vec<Vec<T>>,
  cursors: Vec<usize>,
}

impl<T: Clone> Combinations<T> {
  pub fn new<I, K>(mapping: I) -> Self
  where
    I: IntoIterator<Item = (K, Vec<T>)>,
    K: Into<String>,
  {
    let (keys, values): (Vec<String>, Vec<Vec<T>>) = mapping
      .into_iter()
      .map(|(key, values)| (key.into(), values))
      .unzip();
    let mut cursors = vec![0; keys.len()];
    // Parking the first cursor out of range is what ends the enumeration.
    if values.iter().any(Vec::is_empty) {
      cursors[0] = values[0].len();
    }
    Self {
      keys,
      values,
      cursors,
    }
  }

  pub fn has_next(&self) -> bool {
    match (self.cursors.first(), self.values.first()) {
      (Some(cursor), Some(first)) => *cursor < first.len(),
      _ => false,
    }
  }

  /// Number of combinations a full enumeration yields.
  pub fn total(&self) -> usize {
    if self.values.is_empty() {
      return 0;
    }
    self.values.iter().map(Vec::len).product()
  }

  fn snapshot(&self) -> Combination<T> {
    let entries = self
      .keys
      .iter()
      .zip(&self.values)
      .zip(&self.cursors)
      .map(|((key, values), &cursor)| (key.clone(), values[cursor].clone()))
      .collect();
    Combination { entries }
  }

  fn step(&mut self) {
    let Self {
      values, cursors, ..
    } = self;
    odometer::advance(cursors.len(), |i| {
      cursors[i] += 1;
      if cursors[i] < values[i].len() {
        Step::Advanced
      } else {
        if i > 0 {
          cursors[i] = 0;
        }
        Step::Wrapped
      }
    });
  }
}

impl<T: Clone> Iterator for Combinations<T> {
  type Item = Combination<T>;

  fn next(&mut self) -> Option<Self::Item> {
    if !self.has_next() {
      return None;
    }
    let current = self.snapshot();
    self.step();
    Some(current)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(combinations: Combinations<&'static str>) -> Vec<Vec<&'static str>> {
    combinations
      .map(|c| c.into_iter().map(|(_, v)| v).collect::<Vec<_>>())
      .collect()
  }

  #[test]
  fn first_key_is_most_significant() {
    let combinations = Combinations::new(vec![
      ("A", vec!["a1", "a2"]),
      ("B", vec!["b1", "b2", "b3"]),
    ]);
    assert_eq!(combinations.total(), 6);
    assert_eq!(
      pairs(combinations),
      vec![
        vec!["a1", "b1"],
        vec!["a1", "b2"],
        vec!["a1", "b3"],
        vec!["a2", "b1"],
        vec!["a2", "b2"],
        vec!["a2", "b3"],
      ]
    );
  }

  #[test]
  fn empty_mapping_yields_nothing() {
    let mut combinations = Combinations::<i32>::new(Vec::<(String, Vec<i32>)>::new());
    assert!(!combinations.has_next());
    assert_eq!(combinations.total(), 0);
    assert!(combinations.next().is_none());
  }

  #[test]
  fn any_empty_list_yields_nothing() {
    for mapping in [
      vec![("A", vec![]), ("B", vec![1, 2])],
      vec![("A", vec![1, 2]), ("B", vec![])],
      vec![("A", vec![1]), ("B", vec![2, 3]), ("C", vec![])],
    ] {
      let combinations = Combinations::new(mapping);
      assert!(!combinations.has_next());
      assert_eq!(combinations.count(), 0);
    }
  }

  #[test]
  fn singletons_yield_one_combination() {
    let combinations = Combinations::new(vec![("A", vec![1]), ("B", vec![2])]);
    let all: Vec<_> = combinations.collect();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].get("A"), Some(&1));
    assert_eq!(all[0].get("B"), Some(&2));
  }

  #[test]
  fn every_combination_covers_every_key() {
    let combinations = Combinations::new(vec![
      ("x", vec![1, 2, 3]),
      ("y", vec![4, 5]),
      ("z", vec![6, 7, 8]),
    ]);
    let all: Vec<_> = combinations.collect();
    assert_eq!(all.len(), 18);
    for combination in &all {
      assert_eq!(combination.keys().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }
    let first: Vec<_> = all[0].iter().map(|(_, v)| *v).collect();
    let last: Vec<_> = all[17].iter().map(|(_, v)| *v).collect();
    assert_eq!(first, vec![1, 4, 6]);
    assert_eq!(last, vec![3, 5, 8]);
  }

  #[test]
  fn stays_exhausted() {
    let mut combinations = Combinations::new(vec![("A", vec![1, 2])]);
    assert_eq!(combinations.next().and_then(|c| c.get("A").copied()), Some(1));
    assert_eq!(combinations.next().and_then(|c| c.get("A").copied()), Some(2));
    assert!(combinations.next().is_none());
    assert!(!combinations.has_next());
    assert!(combinations.next().is_none());
  }
}
