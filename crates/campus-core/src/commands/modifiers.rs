use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDateTime;
use tracing::{
  debug,
  instrument
};

use crate::datetime::parse_date_expr;
use crate::model::{
  ClassSlot,
  DayOfWeek,
  Event,
  EventType,
  Exam,
  ExamStatus,
  Priority,
  Task,
  TaskStatus
};
use crate::period::{
  Period,
  PeriodCount,
  span_for
};

/// One `key:value` token from an `add` or `modify` command line.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Mod {
  Day(DayOfWeek),
  Period(Period),
  Count(PeriodCount),
  Room(String),
  Instructor(String),
  Color(String),
  Description(String),
  Due(NaiveDateTime),
  Date(NaiveDateTime),
  End(NaiveDateTime),
  Priority(Priority),
  Status(String),
  Duration(u32),
  Type(EventType),
  AllDay(bool),
  Class(u64)
}

impl Mod {
  fn key(&self) -> &'static str {
    match self {
      | Mod::Day(_) => "day",
      | Mod::Period(_) => "period",
      | Mod::Count(_) => "count",
      | Mod::Room(_) => "room",
      | Mod::Instructor(_) => {
        "instructor"
      }
      | Mod::Color(_) => "color",
      | Mod::Description(_) => "desc",
      | Mod::Due(_) => "due",
      | Mod::Date(_) => "date",
      | Mod::End(_) => "end",
      | Mod::Priority(_) => "priority",
      | Mod::Status(_) => "status",
      | Mod::Duration(_) => "duration",
      | Mod::Type(_) => "type",
      | Mod::AllDay(_) => "allday",
      | Mod::Class(_) => "class"
    }
  }
}

/// Splits title words from modifiers; everything after `--` is title.
/// The title may be empty, as when `modify` only changes fields.
#[instrument(skip(args, now))]
pub(super) fn split_title_and_mods(
  args: &[String],
  now: NaiveDateTime
) -> anyhow::Result<(
  Option<String>,
  Vec<Mod>
)> {
  let mut desc_parts = Vec::new();
  let mut mods = Vec::new();

  let mut literal = false;
  for arg in args {
    if arg == "--" {
      literal = true;
      continue;
    }

    if !literal
      && let Some(one_mod) =
        parse_one_mod(arg, now)?
    {
      mods.push(one_mod);
      continue;
    }

    desc_parts.push(arg.clone());
  }

  debug!(
    mods = mods.len(),
    title_words = desc_parts.len(),
    "parsed title and modifiers"
  );
  let title = (!desc_parts.is_empty())
    .then(|| desc_parts.join(" "));
  Ok((title, mods))
}

/// Like [`split_title_and_mods`], but a title is required.
pub(super) fn parse_desc_and_mods(
  args: &[String],
  now: NaiveDateTime
) -> anyhow::Result<(String, Vec<Mod>)>
{
  let (title, mods) =
    split_title_and_mods(args, now)?;
  let title = title.ok_or_else(|| {
    anyhow!("add: a title is required")
  })?;
  Ok((title, mods))
}

pub(super) fn parse_one_mod(
  tok: &str,
  now: NaiveDateTime
) -> anyhow::Result<Option<Mod>> {
  let Some((key, value)) =
    tok.split_once(':')
  else {
    return Ok(None);
  };

  let key = key.to_ascii_lowercase();
  let value = value.trim();
  let parsed = match key.as_str() {
    | "day" => Mod::Day(value.parse()?),
    | "period" => {
      Mod::Period(value.parse()?)
    }
    | "count" => {
      let raw: u8 = value
        .parse()
        .with_context(|| {
          format!(
            "invalid period count: \
             {value}"
          )
        })?;
      Mod::Count(
        PeriodCount::try_from(raw)?
      )
    }
    | "room" => {
      Mod::Room(value.to_string())
    }
    | "instructor" => {
      Mod::Instructor(value.to_string())
    }
    | "color" => {
      Mod::Color(
        value.to_ascii_lowercase()
      )
    }
    | "desc" | "description" => {
      Mod::Description(
        value.to_string()
      )
    }
    | "due" => {
      Mod::Due(parse_date_expr(
        value, now
      )?)
    }
    | "date" | "start" => {
      Mod::Date(parse_date_expr(
        value, now
      )?)
    }
    | "end" => {
      Mod::End(parse_date_expr(
        value, now
      )?)
    }
    | "pri" | "priority" => {
      Mod::Priority(value.parse()?)
    }
    | "status" => {
      Mod::Status(value.to_string())
    }
    | "duration" => {
      Mod::Duration(
        value.parse().with_context(
          || {
            format!(
              "invalid duration \
               minutes: {value}"
            )
          }
        )?
      )
    }
    | "type" => {
      Mod::Type(value.parse()?)
    }
    | "allday" => {
      Mod::AllDay(parse_flag(value)?)
    }
    | "class" => {
      Mod::Class(
        value.parse().with_context(
          || {
            format!(
              "invalid class id: \
               {value}"
            )
          }
        )?
      )
    }
    | _ => return Ok(None)
  };
  Ok(Some(parsed))
}

fn parse_flag(
  value: &str
) -> anyhow::Result<bool> {
  match value
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Ok(true),
    | "0" | "n" | "no" | "off"
    | "false" => Ok(false),
    | other => {
      Err(anyhow!(
        "expected yes/no, got: {other}"
      ))
    }
  }
}

fn not_applicable(
  one_mod: &Mod,
  kind: &str
) -> anyhow::Error {
  anyhow!(
    "modifier {}: does not apply to \
     a {kind}",
    one_mod.key()
  )
}

/// Applies modifiers to a class. Changing the period or count, or a
/// period without explicit times, resets the clock span from the period
/// table.
pub(super) fn apply_to_class(
  slot: &mut ClassSlot,
  mods: &[Mod]
) -> anyhow::Result<()> {
  for one_mod in mods {
    match one_mod {
      | Mod::Day(day) => {
        slot.day_of_week = Some(*day)
      }
      | Mod::Period(period) => {
        slot.period = Some(*period)
      }
      | Mod::Count(count) => {
        slot.period_count = *count
      }
      | Mod::Room(room) => {
        slot.room = Some(room.clone())
      }
      | Mod::Instructor(name) => {
        slot.instructor =
          Some(name.clone())
      }
      | Mod::Color(color) => {
        slot.color = Some(color.clone())
      }
      | other => {
        return Err(not_applicable(
          other, "class"
        ));
      }
    }
  }

  let placement_changed =
    mods.iter().any(|one_mod| {
      matches!(
        one_mod,
        Mod::Period(_) | Mod::Count(_)
      )
    });
  if let Some(period) = slot.period
    && (placement_changed
      || slot.start_time.is_none())
  {
    let span = span_for(
      period,
      slot.period_count
    );
    slot.start_time = Some(span.start);
    slot.end_time = Some(span.end);
  }
  Ok(())
}

pub(super) fn apply_to_task(
  task: &mut Task,
  mods: &[Mod]
) -> anyhow::Result<()> {
  for one_mod in mods {
    match one_mod {
      | Mod::Due(due) => {
        task.due_date = Some(*due)
      }
      | Mod::Priority(priority) => {
        task.priority = *priority
      }
      | Mod::Status(raw) => {
        task.status =
          raw.parse::<TaskStatus>()?
      }
      | Mod::Class(id) => {
        task.class_id = Some(*id)
      }
      | Mod::Color(color) => {
        task.color = Some(color.clone())
      }
      | Mod::Description(text) => {
        task.description =
          Some(text.clone())
      }
      | other => {
        return Err(not_applicable(
          other, "task"
        ));
      }
    }
  }
  Ok(())
}

pub(super) fn apply_to_exam(
  exam: &mut Exam,
  mods: &[Mod]
) -> anyhow::Result<()> {
  for one_mod in mods {
    match one_mod {
      | Mod::Date(date) => {
        exam.exam_date = *date
      }
      | Mod::Duration(minutes) => {
        exam.duration = Some(*minutes)
      }
      | Mod::Room(room) => {
        exam.room = Some(room.clone())
      }
      | Mod::Status(raw) => {
        exam.status =
          raw.parse::<ExamStatus>()?
      }
      | Mod::Class(id) => {
        exam.class_id = Some(*id)
      }
      | Mod::Color(color) => {
        exam.color = Some(color.clone())
      }
      | Mod::Description(text) => {
        exam.description =
          Some(text.clone())
      }
      | other => {
        return Err(not_applicable(
          other, "exam"
        ));
      }
    }
  }
  Ok(())
}

pub(super) fn apply_to_event(
  event: &mut Event,
  mods: &[Mod]
) -> anyhow::Result<()> {
  for one_mod in mods {
    match one_mod {
      | Mod::Date(date) => {
        event.start_date = *date
      }
      | Mod::End(end) => {
        event.end_date = Some(*end)
      }
      | Mod::AllDay(flag) => {
        event.all_day = *flag
      }
      | Mod::Type(kind) => {
        event.event_type = *kind
      }
      | Mod::Color(color) => {
        event.color = Some(color.clone())
      }
      | Mod::Description(text) => {
        event.description =
          Some(text.clone())
      }
      | other => {
        return Err(not_applicable(
          other, "event"
        ));
      }
    }
  }

  if let Some(end) = event.end_date
    && end < event.start_date
  {
    return Err(anyhow!(
      "event ends before it starts"
    ));
  }
  Ok(())
}

/// The `date:` modifier, required for exams and events.
pub(super) fn required_date(
  mods: &[Mod],
  kind: &str
) -> anyhow::Result<NaiveDateTime> {
  mods
    .iter()
    .rev()
    .find_map(|one_mod| match one_mod {
      | Mod::Date(date) => Some(*date),
      | _ => None
    })
    .ok_or_else(|| {
      anyhow!(
        "add {kind}: date:<when> is \
         required"
      )
    })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::model::OwnerId;

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 6)
      .and_then(|d| {
        d.and_hms_opt(9, 0, 0)
      })
      .expect("valid now")
  }

  fn args(
    raw: &[&str]
  ) -> Vec<String> {
    raw
      .iter()
      .map(|s| s.to_string())
      .collect()
  }

  #[test]
  fn separates_title_from_modifiers() {
    let (title, mods) =
      parse_desc_and_mods(
        &args(&[
          "Linear",
          "algebra",
          "day:mon",
          "period:4",
          "count:2",
          "--",
          "room:101"
        ]),
        now()
      )
      .expect("parse");
    assert_eq!(
      title,
      "Linear algebra room:101"
    );
    assert_eq!(mods.len(), 3);
  }

  #[test]
  fn class_period_fills_clock_times() {
    let (_, mods) =
      parse_desc_and_mods(
        &args(&[
          "Lab", "day:tue", "period:4",
          "count:2"
        ]),
        now()
      )
      .expect("parse");
    let mut slot = ClassSlot::new(
      OwnerId::new("u1"),
      "Lab".to_string(),
      now()
    );
    apply_to_class(&mut slot, &mods)
      .expect("apply");
    assert_eq!(
      slot
        .start_time
        .map(|t| t.to_string())
        .as_deref(),
      Some("14:45")
    );
    assert_eq!(
      slot
        .end_time
        .map(|t| t.to_string())
        .as_deref(),
      Some("18:00")
    );
  }

  #[test]
  fn rejects_bad_values_and_foreign_keys()
  {
    assert!(
      parse_one_mod("period:6", now())
        .is_err()
    );
    assert!(
      parse_one_mod("count:3", now())
        .is_err()
    );
    assert_eq!(
      parse_one_mod("note", now())
        .expect("plain word"),
      None
    );

    let mut task = Task::new(
      OwnerId::new("u1"),
      "Essay".to_string(),
      now()
    );
    let mods = vec![Mod::Duration(90)];
    assert!(
      apply_to_task(&mut task, &mods)
        .is_err()
    );
  }

  #[test]
  fn modify_may_omit_title() {
    let (title, mods) =
      split_title_and_mods(
        &args(&["status:confirmed"]),
        now()
      )
      .expect("parse");
    assert_eq!(title, None);
    assert!(
      parse_desc_and_mods(
        &args(&["status:confirmed"]),
        now()
      )
      .is_err()
    );

    let mut exam = Exam::new(
      OwnerId::new("u1"),
      "Final".to_string(),
      now(),
      now()
    );
    apply_to_exam(&mut exam, &mods)
      .expect("apply");
    assert_eq!(
      exam.status,
      ExamStatus::Confirmed
    );
  }

  #[test]
  fn moving_a_class_resets_its_span() {
    let mut slot = ClassSlot::new(
      OwnerId::new("u1"),
      "Lab".to_string(),
      now()
    );
    apply_to_class(
      &mut slot,
      &[Mod::Period(Period::LAST)]
    )
    .expect("place");
    apply_to_class(
      &mut slot,
      &[Mod::Period(Period::FIRST)]
    )
    .expect("move");
    assert_eq!(
      slot
        .start_time
        .map(|t| t.to_string())
        .as_deref(),
      Some("08:45")
    );

    apply_to_class(
      &mut slot,
      &[Mod::Room("B2".to_string())]
    )
    .expect("room only");
    assert_eq!(
      slot
        .end_time
        .map(|t| t.to_string())
        .as_deref(),
      Some("10:15")
    );
  }

  #[test]
  fn exam_requires_date() {
    assert!(
      required_date(&[], "exam").is_err()
    );
    let mods = vec![Mod::Date(now())];
    assert_eq!(
      required_date(&mods, "exam")
        .expect("date"),
      now()
    );
  }
}
