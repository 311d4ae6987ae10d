//! Unified calendar timeline over events, tasks and exams.

use std::fmt;

use chrono::{
  NaiveDate,
  NaiveDateTime
};
use serde::Serialize;
use tracing::debug;

use crate::model::{
  Event,
  Exam,
  Task
};

const TASK_MARKER: &str = "📋";
const EXAM_MARKER: &str = "📝";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PaletteColor {
  Pink,
  Yellow,
  Blue,
  Green,
  Purple
}

impl PaletteColor {
  pub const ALL: [PaletteColor; 5] = [
    PaletteColor::Pink,
    PaletteColor::Yellow,
    PaletteColor::Blue,
    PaletteColor::Green,
    PaletteColor::Purple
  ];

  pub fn from_tag(
    tag: &str
  ) -> Option<Self> {
    match tag.trim() {
      | "pink" => Some(Self::Pink),
      | "yellow" => Some(Self::Yellow),
      | "blue" => Some(Self::Blue),
      | "green" => Some(Self::Green),
      | "purple" => Some(Self::Purple),
      | _ => None
    }
  }

  /// Resolves a stored color tag, falling back to the caller's default
  /// for missing or unrecognized tags.
  pub fn resolve(
    tag: Option<&str>,
    fallback: PaletteColor
  ) -> Self {
    tag
      .and_then(Self::from_tag)
      .unwrap_or(fallback)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Pink => "pink",
      | Self::Yellow => "yellow",
      | Self::Blue => "blue",
      | Self::Green => "green",
      | Self::Purple => "purple"
    }
  }

  /// 256-color SGR parameter for terminal output.
  pub fn ansi_code(
    self
  ) -> &'static str {
    match self {
      | Self::Pink => "38;5;218",
      | Self::Yellow => "38;5;229",
      | Self::Blue => "38;5;153",
      | Self::Green => "38;5;157",
      | Self::Purple => "38;5;183"
    }
  }

  /// Pastel fill used by the web calendar.
  pub fn css(self) -> &'static str {
    match self {
      | Self::Pink => "oklch(0.85 0.08 0)",
      | Self::Yellow => {
        "oklch(0.88 0.08 90)"
      }
      | Self::Blue => "oklch(0.8 0.08 240)",
      | Self::Green => {
        "oklch(0.85 0.08 145)"
      }
      | Self::Purple => {
        "oklch(0.82 0.08 300)"
      }
    }
  }
}

impl fmt::Display for PaletteColor {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Default color for class slots without a usable tag.
pub const CLASS_FALLBACK_COLOR:
  PaletteColor = PaletteColor::Blue;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  Event,
  Task,
  Exam
}

impl SourceKind {
  pub fn as_str(self) -> &'static str {
    match self {
      | SourceKind::Event => "event",
      | SourceKind::Task => "task",
      | SourceKind::Exam => "exam"
    }
  }

  pub fn fallback_color(
    self
  ) -> PaletteColor {
    match self {
      | SourceKind::Event => {
        PaletteColor::Purple
      }
      | SourceKind::Task => {
        PaletteColor::Yellow
      }
      | SourceKind::Exam => {
        PaletteColor::Pink
      }
    }
  }

  fn item_id(self, id: u64) -> String {
    format!("{}-{id}", self.as_str())
  }
}

#[derive(
  Debug, Clone, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
  /// Unique across source kinds, e.g. `task-3` vs `exam-3`.
  pub id:      String,
  pub title:   String,
  pub start:   NaiveDateTime,
  pub end:     Option<NaiveDateTime>,
  pub all_day: bool,
  pub color:   PaletteColor,
  pub source:  SourceKind
}

fn event_item(
  event: &Event
) -> CalendarItem {
  let kind = SourceKind::Event;
  CalendarItem {
    id:      kind.item_id(event.id),
    title:   event.title.clone(),
    start:   event.start_date,
    end:     event.end_date,
    all_day: event.all_day,
    color:   PaletteColor::resolve(
      event.color.as_deref(),
      kind.fallback_color()
    ),
    source:  kind
  }
}

fn task_item(
  task: &Task
) -> Option<CalendarItem> {
  let due = task.due_date?;
  let kind = SourceKind::Task;
  Some(CalendarItem {
    id:      kind.item_id(task.id),
    title:   format!(
      "{TASK_MARKER} {}",
      task.title
    ),
    start:   due,
    end:     None,
    all_day: false,
    color:   PaletteColor::resolve(
      task.color.as_deref(),
      kind.fallback_color()
    ),
    source:  kind
  })
}

fn exam_item(
  exam: &Exam
) -> CalendarItem {
  let kind = SourceKind::Exam;
  CalendarItem {
    id:      kind.item_id(exam.id),
    title:   format!(
      "{EXAM_MARKER} {}",
      exam.title
    ),
    start:   exam.exam_date,
    end:     None,
    all_day: false,
    color:   PaletteColor::resolve(
      exam.color.as_deref(),
      kind.fallback_color()
    ),
    source:  kind
  }
}

/// Merges all sources into one unordered list of calendar items.
///
/// Tasks without a due date are left out.
pub fn aggregate_calendar(
  events: &[Event],
  tasks: &[Task],
  exams: &[Exam]
) -> Vec<CalendarItem> {
  let mut items = Vec::with_capacity(
    events.len()
      + tasks.len()
      + exams.len()
  );
  items.extend(
    events.iter().map(event_item)
  );
  items.extend(
    tasks.iter().filter_map(task_item)
  );
  items.extend(
    exams.iter().map(exam_item)
  );

  debug!(
    events = events.len(),
    tasks = tasks.len(),
    exams = exams.len(),
    items = items.len(),
    "calendar aggregated"
  );
  items
}

/// Stable sort by start, ties keep source order.
pub fn sort_by_start(
  items: &mut [CalendarItem]
) {
  items.sort_by_key(|item| item.start);
}

/// Items whose start date falls in `[from, to]`.
pub fn items_between(
  items: &[CalendarItem],
  from: NaiveDate,
  to: NaiveDate
) -> Vec<CalendarItem> {
  items
    .iter()
    .filter(|item| {
      let day = item.start.date();
      day >= from && day <= to
    })
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::model::OwnerId;

  fn at(
    day: u32,
    hour: u32
  ) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
      .and_then(|d| {
        d.and_hms_opt(hour, 0, 0)
      })
      .expect("valid datetime")
  }

  fn owner() -> OwnerId {
    OwnerId::new("u1")
  }

  fn task(
    id: u64,
    due: Option<NaiveDateTime>,
    color: Option<&str>
  ) -> Task {
    let mut task = Task::new(
      owner(),
      format!("task {id}"),
      at(1, 0)
    );
    task.id = id;
    task.due_date = due;
    task.color = color.map(str::to_string);
    task
  }

  #[test]
  fn task_without_due_date_is_skipped() {
    let items = aggregate_calendar(
      &[],
      &[task(1, None, None)],
      &[]
    );
    assert!(items.is_empty());
  }

  #[test]
  fn task_color_falls_back_to_yellow() {
    for color in
      [None, Some("teal"), Some("")]
    {
      let items = aggregate_calendar(
        &[],
        &[task(2, Some(at(10, 9)), color)],
        &[]
      );
      assert_eq!(items.len(), 1);
      assert_eq!(
        items[0].color,
        PaletteColor::Yellow
      );
      assert_eq!(items[0].end, None);
      assert_eq!(
        items[0].title,
        "📋 task 2"
      );
    }

    let items = aggregate_calendar(
      &[],
      &[task(
        2,
        Some(at(10, 9)),
        Some("green")
      )],
      &[]
    );
    assert_eq!(
      items[0].color,
      PaletteColor::Green
    );
  }

  #[test]
  fn fallbacks_are_per_kind() {
    let mut exam = Exam::new(
      owner(),
      "Midterm".to_string(),
      at(12, 10),
      at(1, 0)
    );
    exam.id = 3;
    exam.color = Some("magenta".to_string());
    let mut event = Event::new(
      owner(),
      "Club".to_string(),
      at(13, 18),
      at(1, 0)
    );
    event.id = 3;
    event.end_date = Some(at(13, 20));

    let items = aggregate_calendar(
      &[event],
      &[task(3, Some(at(11, 9)), None)],
      &[exam]
    );

    let by_id = |id: &str| {
      items
        .iter()
        .find(|item| item.id == id)
        .expect("item present")
    };
    assert_eq!(
      by_id("event-3").color,
      PaletteColor::Purple
    );
    assert_eq!(
      by_id("event-3").end,
      Some(at(13, 20))
    );
    assert_eq!(
      by_id("task-3").color,
      PaletteColor::Yellow
    );
    assert_eq!(
      by_id("exam-3").color,
      PaletteColor::Pink
    );
    assert_eq!(
      by_id("exam-3").title,
      "📝 Midterm"
    );
  }

  #[test]
  fn range_filter_is_inclusive_by_date() {
    let mut items = aggregate_calendar(
      &[],
      &[
        task(1, Some(at(20, 23)), None),
        task(2, Some(at(10, 0)), None),
        task(3, Some(at(21, 0)), None),
      ],
      &[]
    );
    sort_by_start(&mut items);
    assert_eq!(items[0].id, "task-2");

    let from = NaiveDate::from_ymd_opt(
      2025, 1, 10
    )
    .expect("valid date");
    let to = NaiveDate::from_ymd_opt(
      2025, 1, 20
    )
    .expect("valid date");
    let ids: Vec<String> =
      items_between(&items, from, to)
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec![
      "task-2".to_string(),
      "task-1".to_string()
    ]);
  }

  #[test]
  fn aggregation_is_repeatable() {
    let tasks = vec![
      task(1, Some(at(10, 9)), None),
      task(2, None, None),
    ];
    let exams = vec![Exam::new(
      owner(),
      "Final".to_string(),
      at(12, 9),
      at(1, 0)
    )];
    let events = vec![Event::new(
      owner(),
      "Fair".to_string(),
      at(11, 15),
      at(1, 0)
    )];

    let first = aggregate_calendar(
      &events, &tasks, &exams
    );
    let second = aggregate_calendar(
      &events, &tasks, &exams
    );
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
  }
}
