//! Fixed period table of the school day.
//!
//! Every period is a same-day `[start, end)` span in minutes after
//! midnight. The table is shared with persisted `startTime`/`endTime`
//! strings, so the values must not drift.

use std::fmt;
use std::str::FromStr;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  NaiveTime,
  Timelike
};
use serde::{
  Deserialize,
  Serialize
};

pub const PERIODS_PER_DAY: usize = 5;

/// `(start, end)` minute-of-day pairs, indexed by `period - 1`.
const PERIOD_TABLE: [(u16, u16);
  PERIODS_PER_DAY] = [
  (8 * 60 + 45, 10 * 60 + 15),
  (10 * 60 + 30, 12 * 60),
  (13 * 60, 14 * 60 + 30),
  (14 * 60 + 45, 16 * 60 + 15),
  (16 * 60 + 30, 18 * 60)
];

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(
  try_from = "u8",
  into = "u8"
)]
pub struct Period(u8);

impl Period {
  pub const FIRST: Period = Period(1);
  pub const LAST: Period = Period(5);

  pub fn new(
    number: u8
  ) -> Option<Self> {
    (1..=PERIODS_PER_DAY as u8)
      .contains(&number)
      .then_some(Self(number))
  }

  pub fn number(self) -> u8 {
    self.0
  }

  /// Zero-based row in the period table.
  pub fn index(self) -> usize {
    usize::from(self.0 - 1)
  }

  pub fn next(self) -> Option<Self> {
    Self::new(self.0 + 1)
  }

  pub fn all()
  -> impl Iterator<Item = Period> {
    (1..=PERIODS_PER_DAY as u8)
      .map(Period)
  }
}

impl TryFrom<u8> for Period {
  type Error = anyhow::Error;

  fn try_from(
    value: u8
  ) -> Result<Self, Self::Error> {
    Self::new(value).ok_or_else(|| {
      anyhow!(
        "period must be between 1 \
         and {PERIODS_PER_DAY}, got \
         {value}"
      )
    })
  }
}

impl From<Period> for u8 {
  fn from(period: Period) -> Self {
    period.0
  }
}

impl FromStr for Period {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let raw = s
      .trim()
      .parse::<u8>()
      .with_context(|| {
        format!("invalid period: {s}")
      })?;
    Self::try_from(raw)
  }
}

impl fmt::Display for Period {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// How many consecutive periods a class occupies.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(
  try_from = "u8",
  into = "u8"
)]
pub enum PeriodCount {
  #[default]
  Single,
  Double
}

impl PeriodCount {
  pub fn periods(self) -> u8 {
    match self {
      | PeriodCount::Single => 1,
      | PeriodCount::Double => 2
    }
  }
}

impl TryFrom<u8> for PeriodCount {
  type Error = anyhow::Error;

  fn try_from(
    value: u8
  ) -> Result<Self, Self::Error> {
    match value {
      | 1 => Ok(PeriodCount::Single),
      | 2 => Ok(PeriodCount::Double),
      | other => {
        Err(anyhow!(
          "period count must be 1 or \
           2, got {other}"
        ))
      }
    }
  }
}

impl From<PeriodCount> for u8 {
  fn from(count: PeriodCount) -> Self {
    count.periods()
  }
}

/// Naive wall-clock time with minute precision.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(
  try_from = "String",
  into = "String"
)]
pub struct ClockTime(u16);

impl ClockTime {
  pub fn from_hm(
    hour: u32,
    minute: u32
  ) -> Option<Self> {
    if hour > 23 || minute > 59 {
      return None;
    }
    Some(Self((hour * 60 + minute) as u16))
  }

  pub fn from_time(
    time: NaiveTime
  ) -> Self {
    Self(
      (time.hour() * 60 + time.minute())
        as u16
    )
  }

  pub fn minutes(self) -> u16 {
    self.0
  }

  pub fn hour(self) -> u16 {
    self.0 / 60
  }

  pub fn minute(self) -> u16 {
    self.0 % 60
  }
}

impl FromStr for ClockTime {
  type Err = anyhow::Error;

  /// Accepts `HH:MM`, `H:MM`, `HH:MM:SS` and the compact `HHMM`.
  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let (hour, minute) =
      if let Some((h, rest)) =
        trimmed.split_once(':')
      {
        let m = rest
          .split(':')
          .next()
          .unwrap_or_default();
        (h, m)
      } else if trimmed.len() == 4
        && trimmed
          .chars()
          .all(|c| c.is_ascii_digit())
      {
        trimmed.split_at(2)
      } else {
        return Err(anyhow!(
          "invalid clock time: {s}"
        ));
      };

    let hour: u32 =
      hour.parse().with_context(|| {
        format!("invalid hour in {s}")
      })?;
    let minute: u32 =
      minute.parse().with_context(
        || {
          format!(
            "invalid minute in {s}"
          )
        }
      )?;

    Self::from_hm(hour, minute)
      .ok_or_else(|| {
        anyhow!(
          "clock time out of range: \
           {s}"
        )
      })
  }
}

impl TryFrom<String> for ClockTime {
  type Error = anyhow::Error;

  fn try_from(
    value: String
  ) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<ClockTime> for String {
  fn from(time: ClockTime) -> Self {
    time.to_string()
  }
}

impl fmt::Display for ClockTime {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:02}:{:02}",
      self.hour(),
      self.minute()
    )
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct PeriodSpan {
  pub start: ClockTime,
  pub end:   ClockTime
}

impl PeriodSpan {
  /// Start inclusive, end exclusive.
  pub fn contains(
    &self,
    time: ClockTime
  ) -> bool {
    time >= self.start
      && time < self.end
  }

  pub fn duration_minutes(
    &self
  ) -> u16 {
    self
      .end
      .minutes()
      .saturating_sub(
        self.start.minutes()
      )
  }
}

impl fmt::Display for PeriodSpan {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}-{}",
      self.start, self.end
    )
  }
}

pub fn time_range_of(
  period: Period
) -> PeriodSpan {
  let (start, end) =
    PERIOD_TABLE[period.index()];
  PeriodSpan {
    start: ClockTime(start),
    end:   ClockTime(end)
  }
}

/// Clock span covered by a class starting at `period`.
///
/// A double period starting at the last period has nowhere to
/// continue and covers that period alone.
pub fn span_for(
  period: Period,
  count: PeriodCount
) -> PeriodSpan {
  let first = time_range_of(period);
  match (count, period.next()) {
    | (
      PeriodCount::Double,
      Some(second)
    ) => {
      PeriodSpan {
        start: first.start,
        end:   time_range_of(second)
          .end
      }
    }
    | _ => first
  }
}
