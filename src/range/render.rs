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
//! Display helpers for numeric ranges. Never used for comparison or enumeration.

/// Decimal places shown when rendering floating-point ranges.
pub const DISPLAY_PLACES: usize = 6;

/// Rounds `value` to `places` decimals, ties away from zero.
///
/// Rounding works on the shortest decimal representation of `value`, so
/// `0.0000125` rounds to `0.000013` even though its binary value is slightly
/// below the tie.
pub fn round_half_up(value: f64, places: usize) -> f64 {
  if !value.is_finite() {
    return value;
  }
  let text = format!("{}", value.abs());
  let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
  if frac_part.len() <= places {
    return value;
  }

  let mut digits: Vec<u8> = int_part
    .bytes()
    .chain(frac_part.bytes().take(places))
    .map(|b| b - b'0')
    .collect();
  if frac_part.as_bytes()[places] >= b'5' {
    let mut i = digits.len();
    loop {
      if i == 0 {
        digits.insert(0, 1);
        break;
      }
      i -= 1;
      if digits[i] == 9 {
        digits[i] = 0;
      } else {
        digits[i] += 1;
        break;
      }
    }
  }

  let split = digits.len() - places;
  let to_text = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
  let rounded = if places == 0 {
    to_text(&digits)
  } else {
    format!("{}.{}", to_text(&digits[..split]), to_text(&digits[split..]))
  };
  let magnitude: f64 = rounded.parse().unwrap_or(value.abs());
  if value.is_sign_negative() {
    -magnitude
  } else {
    magnitude
  }
}

/// Renders floats as `[ a, b, c ]`, rounded for display.
pub fn render_floats(values: &[f64]) -> String {
  render(values.iter().map(|v| round_half_up(*v, DISPLAY_PLACES)))
}

/// Renders integers as `[ a, b, c ]`.
pub fn render_ints(values: &[i64]) -> String {
  render(values.iter())
}

fn render<I>(values: I) -> String
where
  I: Iterator,
  I::Item: std::fmt::Display,
{
  let items: Vec<String> = values.map(|v| v.to_string()).collect();
  if items.is_empty() {
    return "[]".to_string();
  }
  format!("[ {} ]", items.join(", "))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_ties_up() {
    assert_eq!(round_half_up(0.1234565, 6), 0.123457);
    assert_eq!(round_half_up(2.5, 0), 3.0);
    assert_eq!(round_half_up(0.0000125, 6), 0.000013);
  }

  #[test]
  fn rounds_negative_ties_away_from_zero() {
    assert_eq!(round_half_up(-0.1234565, 6), -0.123457);
    assert_eq!(round_half_up(-2.5, 0), -3.0);
  }

  #[test]
  fn carries_through_nines() {
    assert_eq!(round_half_up(9.9999996, 6), 10.0);
    assert_eq!(round_half_up(0.9999999, 6), 1.0);
  }

  #[test]
  fn short_values_are_untouched() {
    assert_eq!(round_half_up(12.5, 6), 12.5);
    assert_eq!(round_half_up(100.0, 6), 100.0);
    assert!(round_half_up(f64::NAN, 6).is_nan());
  }

  #[test]
  fn renders_lists() {
    assert_eq!(render_floats(&[]), "[]");
    assert_eq!(render_floats(&[10.0, 1.0 / 3.0]), "[ 10, 0.333333 ]");
    assert_eq!(render_ints(&[1, 2, 3]), "[ 1, 2, 3 ]");
  }
}
