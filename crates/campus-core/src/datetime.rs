//! Date expressions for command arguments.
//!
//! All instants are naive local wall-clock times; nothing here knows
//! about time zones.

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  NaiveDateTime,
  Timelike,
  Weekday
};
use regex::Regex;

/// Current local wall-clock time, truncated to whole seconds.
pub fn local_now() -> NaiveDateTime {
  let now = Local::now().naive_local();
  now.with_nanosecond(0).unwrap_or(now)
}

#[must_use]
pub fn format_instant(
  dt: NaiveDateTime
) -> String {
  dt.format("%Y-%m-%d %H:%M")
    .to_string()
}

#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date.format("%Y-%m-%d").to_string()
}

fn midnight(
  date: NaiveDate
) -> anyhow::Result<NaiveDateTime> {
  date.and_hms_opt(0, 0, 0).ok_or_else(
    || {
      anyhow!(
        "failed to construct \
         midnight for {date}"
      )
    }
  )
}

#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  now: NaiveDateTime
) -> anyhow::Result<NaiveDateTime> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => {
      return midnight(now.date());
    }
    | "tomorrow" => {
      return Ok(
        midnight(now.date())?
          + Duration::days(1)
      );
    }
    | "yesterday" => {
      return Ok(
        midnight(now.date())?
          - Duration::days(1)
      );
    }
    | _ => {}
  }

  if let Some(target_weekday) =
    parse_weekday_name(&lower)
  {
    let target_date = next_weekday_date(
      now.date(),
      target_weekday
    );
    return midnight(target_date);
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dhm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(token)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let duration = match unit {
      | "d" => Duration::try_days(num),
      | "h" => Duration::try_hours(num),
      | "m" => Duration::try_minutes(num),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    }
    .ok_or_else(|| {
      anyhow!(
        "relative offset out of range: \
         {token}"
      )
    })?;

    let shifted = if sign == "-" {
      now.checked_sub_signed(duration)
    } else {
      now.checked_add_signed(duration)
    };
    return shifted.ok_or_else(|| {
      anyhow!(
        "relative offset out of range: \
         {token}"
      )
    });
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return midnight(date);
  }

  for fmt in [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S"
  ] {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(ndt);
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     now/today/tomorrow/yesterday, \
     weekday names (e.g. monday), \
     +Nd/+Nh/+Nm, YYYY-MM-DD, \
     YYYY-MM-DDTHH:MM, YYYY-MM-DD \
     HH:MM"
  })
}

/// Calendar day of a date expression; time of day is dropped.
pub fn parse_date_arg(
  input: &str,
  now: NaiveDateTime
) -> anyhow::Result<NaiveDate> {
  parse_date_expr(input, now)
    .map(|dt| dt.date())
}

/// `YYYY-MM` month selector.
pub fn parse_month_arg(
  input: &str
) -> anyhow::Result<(i32, u32)> {
  let (year, month) = input
    .trim()
    .split_once('-')
    .ok_or_else(|| {
      anyhow!(
        "expected YYYY-MM, got: \
         {input}"
      )
    })?;
  let year: i32 =
    year.parse().with_context(|| {
      format!("invalid year: {year}")
    })?;
  let month: u32 =
    month.parse().with_context(|| {
      format!("invalid month: {month}")
    })?;
  if !(1..=12).contains(&month) {
    return Err(anyhow!(
      "month out of range: {month}"
    ));
  }
  Ok((year, month))
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_signed(Duration::days(
      delta
    ))
    .unwrap_or(from)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 17)
      .and_then(|d| {
        d.and_hms_opt(12, 30, 0)
      })
      .expect("valid now")
  }

  #[test]
  fn parses_keywords() {
    assert_eq!(
      format_instant(
        parse_date_expr("today", now())
          .expect("parse today")
      ),
      "2026-02-17 00:00"
    );
    assert_eq!(
      format_instant(
        parse_date_expr(
          "tomorrow",
          now()
        )
        .expect("parse tomorrow")
      ),
      "2026-02-18 00:00"
    );
    assert_eq!(
      parse_date_expr("now", now())
        .expect("parse now"),
      now()
    );
  }

  #[test]
  fn parses_weekday_name() {
    let parsed =
      parse_date_expr("wednesday", now())
        .expect("parse weekday");
    assert_eq!(
      format_date(parsed.date()),
      "2026-02-18"
    );
    let same_day =
      parse_date_expr("tue", now())
        .expect("parse weekday");
    assert_eq!(
      format_date(same_day.date()),
      "2026-02-24"
    );
  }

  #[test]
  fn parses_relative_and_absolute() {
    assert_eq!(
      format_instant(
        parse_date_expr("+7d", now())
          .expect("parse relative")
      ),
      "2026-02-24 12:30"
    );
    assert_eq!(
      format_instant(
        parse_date_expr(
          "2025-01-10T23:00",
          now()
        )
        .expect("parse datetime")
      ),
      "2025-01-10 23:00"
    );
    assert!(
      parse_date_expr("someday", now())
        .is_err()
    );
  }

  #[test]
  fn parses_month_selector() {
    assert_eq!(
      parse_month_arg("2025-01")
        .expect("parse month"),
      (2025, 1)
    );
    assert!(
      parse_month_arg("2025-13").is_err()
    );
    assert!(
      parse_month_arg("january").is_err()
    );
  }
}
