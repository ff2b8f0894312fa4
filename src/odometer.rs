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
//! Mixed-radix carry shared by [`crate::combinations`] and [`crate::nested`].
//!
//! Digit 0 is the most significant and the last digit varies fastest. The
//! callers only decide how one digit is bumped: by index for materialized
//! lists, by pulling from (and restarting) an iterator for generated sources.

/// Outcome of bumping a single digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
  /// The digit moved to its next value; no carry.
  Advanced,
  /// The digit overflowed and went back to its first value (or, for digit 0,
  /// ran out of values).
  Wrapped,
}

/// Advances a counter of `digits` digits by one.
///
/// `bump(i)` moves digit `i` and reports whether it wrapped. Digits are bumped
/// right to left, carrying on every wrap. Returns `false` once digit 0 wraps,
/// i.e. the counter is exhausted. A zero-digit counter is always exhausted.
pub(crate) fn advance<F>(digits: usize, mut bump: F) -> bool
where
  F: FnMut(usize) -> Step,
{
  for i in (0..digits).rev() {
    match bump(i) {
      Step::Advanced => return true,
      Step::Wrapped if i == 0 => return false,
      Step::Wrapped => continue,
    }
  }
  false
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Counts every state of a plain index counter with the given radices.
  fn run(radices: &[usize]) -> Vec<Vec<usize>> {
    let mut digits = vec![0; radices.len()];
    let mut seen = Vec::new();
    loop {
      seen.push(digits.clone());
      let more = advance(radices.len(), |i| {
        digits[i] += 1;
        if digits[i] < radices[i] {
          Step::Advanced
        } else {
          digits[i] = 0;
          Step::Wrapped
        }
      });
      if !more {
        break;
      }
    }
    seen
  }

  #[test]
  fn counts_in_mixed_radix_order() {
    let states = run(&[2, 3]);
    assert_eq!(
      states,
      vec![
        vec![0, 0],
        vec![0, 1],
        vec![0, 2],
        vec![1, 0],
        vec![1, 1],
        vec![1, 2],
      ]
    );
  }

  #[test]
  fn visits_product_of_radices() {
    assert_eq!(run(&[3, 2, 3]).len(), 18);
    assert_eq!(run(&[1, 1, 1]).len(), 1);
  }

  #[test]
  fn zero_digits_is_exhausted() {
    assert!(!advance(0, |_| Step::Advanced));
  }

  #[test]
  fn stops_on_most_significant_wrap_only() {
    let mut bumped = Vec::new();
    let more = advance(3, |i| {
      bumped.push(i);
      Step::Wrapped
    });
    assert!(!more);
    assert_eq!(bumped, vec![2, 1, 0]);
  }
}
