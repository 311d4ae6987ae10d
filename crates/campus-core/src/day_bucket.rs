use chrono::{
  Datelike,
  Duration,
  NaiveDate
};
use tracing::debug;

use crate::model::{
  Event,
  Exam,
  Task
};

/// Dot indicators for one calendar cell.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct DayMarkers {
  pub has_tasks:  bool,
  pub has_exams:  bool,
  pub has_events: bool
}

impl DayMarkers {
  pub fn any(&self) -> bool {
    self.has_tasks
      || self.has_exams
      || self.has_events
  }
}

/// Everything dated on one local calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket<'a> {
  pub date:   NaiveDate,
  pub tasks:  Vec<&'a Task>,
  pub exams:  Vec<&'a Exam>,
  pub events: Vec<&'a Event>
}

impl DayBucket<'_> {
  pub fn has_tasks(&self) -> bool {
    !self.tasks.is_empty()
  }

  pub fn has_exams(&self) -> bool {
    !self.exams.is_empty()
  }

  pub fn has_events(&self) -> bool {
    !self.events.is_empty()
  }

  pub fn is_empty(&self) -> bool {
    !self.markers().any()
  }

  pub fn markers(&self) -> DayMarkers {
    DayMarkers {
      has_tasks:  self.has_tasks(),
      has_exams:  self.has_exams(),
      has_events: self.has_events()
    }
  }
}

/// Collects the items dated on `date`; time of day is ignored.
pub fn bucket_by_day<'a>(
  date: NaiveDate,
  tasks: &'a [Task],
  exams: &'a [Exam],
  events: &'a [Event]
) -> DayBucket<'a> {
  DayBucket {
    date,
    tasks: tasks
      .iter()
      .filter(|task| {
        task
          .due_date
          .is_some_and(|due| {
            due.date() == date
          })
      })
      .collect(),
    exams: exams
      .iter()
      .filter(|exam| {
        exam.exam_date.date() == date
      })
      .collect(),
    events: events
      .iter()
      .filter(|event| {
        event.start_date.date() == date
      })
      .collect()
  }
}

/// Markers for every day of a month, in date order.
#[tracing::instrument(skip(
  tasks, exams, events
))]
pub fn month_markers(
  year: i32,
  month: u32,
  tasks: &[Task],
  exams: &[Exam],
  events: &[Event]
) -> Vec<(NaiveDate, DayMarkers)> {
  let Some(first) =
    first_day_of_month(year, month)
  else {
    return Vec::new();
  };
  let last =
    last_day_of_month(year, month)
      .unwrap_or(first);

  let markers = first
    .iter_days()
    .take_while(|day| *day <= last)
    .map(|day| {
      (
        day,
        bucket_by_day(
          day, tasks, exams, events
        )
        .markers()
      )
    })
    .collect::<Vec<_>>();

  debug!(
    days = markers.len(),
    marked = markers
      .iter()
      .filter(|(_, m)| m.any())
      .count(),
    "month markers computed"
  );
  markers
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  first_day_of_month(year, month)?;
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  first_day_of_month(
    next_year, next_month
  )?
  .checked_sub_signed(Duration::days(1))
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month)
    .map(|day| day.day())
    .unwrap_or(0)
}
