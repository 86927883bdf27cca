use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

/// Thousands-separated amount with two decimals, e.g. `1,234,567.89`.
pub fn format_amount(amount: f64) -> String {
  let rendered = format!("{:.2}", amount.abs());
  let (int_part, frac_part) = rendered.split_once('.').unwrap_or((&rendered, "00"));

  let mut grouped = String::new();
  for (i, digit) in int_part.chars().enumerate() {
    if i > 0 && (int_part.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(digit);
  }

  let sign = if amount < 0.0 { "-" } else { "" };
  format!("{sign}{grouped}.{frac_part}")
}

/// First day of the month containing `day`, and the first day of the next
/// month. Used as an inclusive/exclusive window for monthly aggregates.
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
  let start = NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap();
  let end = if day.month() == 12 {
    NaiveDate::from_ymd_opt(day.year() + 1, 1, 1).unwrap()
  } else {
    NaiveDate::from_ymd_opt(day.year(), day.month() + 1, 1).unwrap()
  };
  (start, end)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn month_bounds_mid_year() {
    let (start, end) =
      month_bounds(NaiveDate::from_ymd_opt(2026, 3, 17).unwrap());
    assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
  }

  #[test]
  fn month_bounds_december_rolls_over() {
    let (start, end) =
      month_bounds(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
  }

  #[test]
  fn amounts_group_by_thousands() {
    assert_eq!(format_amount(0.0), "0.00");
    assert_eq!(format_amount(950.5), "950.50");
    assert_eq!(format_amount(1_000_000.0), "1,000,000.00");
    assert_eq!(format_amount(-12_345.678), "-12,345.68");
  }
}
