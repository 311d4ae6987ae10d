use std::fmt;
use std::time::Duration;

use chrono::{
  Datelike,
  NaiveDateTime
};
use tracing::{
  debug,
  info,
  trace
};

use crate::model::DayOfWeek;
use crate::period::{
  ClockTime,
  Period,
  time_range_of
};

/// Where "now" sits relative to the period table.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum PeriodState {
  During {
    period: Period
  },
  Between {
    after:  Period,
    before: Period
  },
  Outside
}

impl fmt::Display for PeriodState {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | PeriodState::During {
        period
      } => {
        write!(
          f,
          "period {period} ({})",
          time_range_of(*period)
        )
      }
      | PeriodState::Between {
        after,
        before
      } => {
        write!(
          f,
          "break between period \
           {after} and {before}"
        )
      }
      | PeriodState::Outside => {
        f.write_str(
          "outside class hours"
        )
      }
    }
  }
}

#[tracing::instrument(level = "trace")]
pub fn resolve_live_period(
  now: NaiveDateTime
) -> PeriodState {
  if today_column(now).is_none() {
    return PeriodState::Outside;
  }

  let clock =
    ClockTime::from_time(now.time());

  if let Some(period) = Period::all()
    .find(|p| {
      time_range_of(*p).contains(clock)
    })
  {
    return PeriodState::During {
      period
    };
  }

  for after in Period::all() {
    let Some(before) = after.next()
    else {
      break;
    };
    if clock >= time_range_of(after).end
      && clock
        < time_range_of(before).start
    {
      return PeriodState::Between {
        after,
        before
      };
    }
  }

  PeriodState::Outside
}

/// Weekday column to highlight, `None` on weekends.
pub fn today_column(
  now: NaiveDateTime
) -> Option<DayOfWeek> {
  let day =
    DayOfWeek::from_chrono(now.weekday());
  day.is_weekday().then_some(day)
}

/// Minutes until the current period ends, or until the next one starts
/// during a break.
pub fn minutes_remaining(
  now: NaiveDateTime,
  state: PeriodState
) -> Option<u16> {
  let clock =
    ClockTime::from_time(now.time());
  let target = match state {
    | PeriodState::During {
      period
    } => time_range_of(period).end,
    | PeriodState::Between {
      before,
      ..
    } => time_range_of(before).start,
    | PeriodState::Outside => {
      return None;
    }
  };
  Some(
    target
      .minutes()
      .saturating_sub(clock.minutes())
  )
}

/// Re-evaluates the live period on a fixed polling interval and reports
/// only transitions.
pub struct LiveTicker<C> {
  clock:    C,
  interval: Duration,
  last:     Option<PeriodState>
}

impl<C> LiveTicker<C>
where
  C: FnMut() -> NaiveDateTime
{
  pub fn new(
    clock: C,
    interval: Duration
  ) -> Self {
    Self {
      clock,
      interval,
      last: None
    }
  }

  /// Returns the state when it differs from the previous poll.
  pub fn poll(
    &mut self
  ) -> Option<(NaiveDateTime, PeriodState)>
  {
    let now = (self.clock)();
    let state = resolve_live_period(now);
    if self.last == Some(state) {
      trace!(%now, "live period unchanged");
      return None;
    }
    debug!(%now, %state, "live period changed");
    self.last = Some(state);
    Some((now, state))
  }

  /// Polls until `max_ticks` evaluations have run, or forever when
  /// `None`.
  #[tracing::instrument(skip(
    self, on_change
  ))]
  pub fn run<F>(
    &mut self,
    max_ticks: Option<u64>,
    mut on_change: F
  ) -> anyhow::Result<()>
  where
    F: FnMut(
      NaiveDateTime,
      PeriodState
    ) -> anyhow::Result<()>
  {
    info!(
      interval_secs =
        self.interval.as_secs(),
      ?max_ticks,
      "starting live period ticker"
    );
    let mut ticks = 0_u64;
    loop {
      if let Some((now, state)) =
        self.poll()
      {
        on_change(now, state)?;
      }
      ticks += 1;
      if max_ticks
        .is_some_and(|max| ticks >= max)
      {
        return Ok(());
      }
      std::thread::sleep(self.interval);
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  // 2025-01-06 is a Monday.
  fn at(
    day: u32,
    hour: u32,
    minute: u32
  ) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
      .and_then(|d| {
        d.and_hms_opt(hour, minute, 0)
      })
      .expect("valid datetime")
  }

  fn period(n: u8) -> Period {
    Period::new(n).expect("valid period")
  }

  #[test]
  fn weekend_is_always_outside() {
    for (hour, minute) in
      [(0, 0), (9, 0), (13, 30), (23, 59)]
    {
      assert_eq!(
        resolve_live_period(at(
          11, hour, minute
        )),
        PeriodState::Outside
      );
      assert_eq!(
        resolve_live_period(at(
          12, hour, minute
        )),
        PeriodState::Outside
      );
    }
  }

  #[test]
  fn period_boundaries() {
    assert_eq!(
      resolve_live_period(at(6, 8, 45)),
      PeriodState::During {
        period: period(1)
      }
    );
    assert_eq!(
      resolve_live_period(at(6, 8, 44)),
      PeriodState::Outside
    );
    assert_eq!(
      resolve_live_period(at(6, 10, 15)),
      PeriodState::Between {
        after:  period(1),
        before: period(2)
      }
    );
    assert_eq!(
      resolve_live_period(at(6, 12, 30)),
      PeriodState::Between {
        after:  period(2),
        before: period(3)
      }
    );
    assert_eq!(
      resolve_live_period(at(10, 17, 59)),
      PeriodState::During {
        period: period(5)
      }
    );
    assert_eq!(
      resolve_live_period(at(10, 18, 0)),
      PeriodState::Outside
    );
  }

  #[test]
  fn remaining_minutes_follow_state() {
    let now = at(7, 9, 0);
    let state = resolve_live_period(now);
    assert_eq!(
      minutes_remaining(now, state),
      Some(75)
    );

    let now = at(7, 10, 20);
    let state = resolve_live_period(now);
    assert_eq!(
      minutes_remaining(now, state),
      Some(10)
    );

    let now = at(7, 19, 0);
    assert_eq!(
      minutes_remaining(
        now,
        resolve_live_period(now)
      ),
      None
    );
  }

  #[test]
  fn today_column_skips_weekend() {
    assert_eq!(
      today_column(at(6, 9, 0)),
      Some(DayOfWeek::Monday)
    );
    assert_eq!(
      today_column(at(12, 9, 0)),
      None
    );
  }

  #[test]
  fn ticker_reports_only_transitions() {
    let times = vec![
      at(6, 8, 40),
      at(6, 8, 44),
      at(6, 8, 45),
      at(6, 9, 30),
      at(6, 10, 15),
    ];
    let mut feed = times.into_iter();
    let fallback = at(6, 10, 15);
    let mut ticker = LiveTicker::new(
      move || {
        feed.next().unwrap_or(fallback)
      },
      Duration::ZERO
    );

    let mut seen = Vec::new();
    ticker
      .run(Some(5), |_, state| {
        seen.push(state);
        Ok(())
      })
      .expect("ticker run");

    assert_eq!(
      seen,
      vec![
        PeriodState::Outside,
        PeriodState::During {
          period: period(1)
        },
        PeriodState::Between {
          after:  period(1),
          before: period(2)
        },
      ]
    );
  }

  #[test]
  fn resolution_is_repeatable() {
    for now in [
      at(6, 8, 44),
      at(6, 9, 30),
      at(6, 10, 15),
      at(11, 9, 30),
    ] {
      assert_eq!(
        resolve_live_period(now),
        resolve_live_period(now)
      );
    }
  }
}
