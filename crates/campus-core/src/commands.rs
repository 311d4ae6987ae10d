mod modifiers;

use std::io::{self, Write};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument};

use crate::calendar::{CalendarItem, aggregate_calendar, items_between, sort_by_start};
use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::{DataStore, PlannerSource};
use crate::datetime::{local_now, parse_date_arg, parse_month_arg};
use crate::day_bucket::{bucket_by_day, first_day_of_month, last_day_of_month, month_markers};
use crate::identity::IdentityProvider;
use crate::live::{LiveTicker, resolve_live_period};
use crate::model::{ClassSlot, Event, Exam, OwnerId, Task, TaskFilter};
use crate::render::Renderer;
use crate::timetable::project_timetable;
use crate::upcoming::{
    DASHBOARD_WINDOW_DAYS, EXAM_BADGE_WINDOW_DAYS, compute_upcoming, dashboard_stats,
};

use self::modifiers::{
    Mod, apply_to_class, apply_to_event, apply_to_exam, apply_to_task, parse_desc_and_mods, required_date,
    split_title_and_mods,
};

const DEFAULT_POLL_SECONDS: u64 = 60;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "dashboard",
        "timetable",
        "now",
        "calendar",
        "day",
        "month",
        "upcoming",
        "classes",
        "tasks",
        "exams",
        "events",
        "add",
        "modify",
        "done",
        "delete",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

/// Exact name, or the single command starting with `token`.
pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    Class,
    Task,
    Exam,
    Event,
}

impl EntityKind {
    fn as_str(self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Task => "task",
            EntityKind::Exam => "exam",
            EntityKind::Event => "event",
        }
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "class" | "classes" => Ok(EntityKind::Class),
            "task" | "tasks" => Ok(EntityKind::Task),
            "exam" | "exams" => Ok(EntityKind::Exam),
            "event" | "events" => Ok(EntityKind::Event),
            other => Err(anyhow!("unknown kind: {other} (expected class, task, exam or event)")),
        }
    }
}

#[instrument(skip(store, cfg, renderer, identity, inv))]
pub fn dispatch(
    store: &DataStore,
    cfg: &Config,
    renderer: &Renderer,
    identity: &dyn IdentityProvider,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = local_now();
    let command = inv.command.as_str();
    let args = inv.command_args.as_slice();

    debug!(command, args = ?inv.command_args, %now, "dispatching command");

    match command {
        "now" => return cmd_now(cfg, renderer, args, now),
        "_commands" => return cmd_commands(),
        "_show" => return cmd_show(cfg),
        "help" => return cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let owner = identity.require_owner()?;
    match command {
        "dashboard" => cmd_dashboard(store, cfg, renderer, &owner, now),
        "timetable" => cmd_timetable(store, renderer, &owner, now),
        "calendar" => cmd_calendar(store, renderer, &owner, args, now),
        "day" => cmd_day(store, renderer, &owner, args, now),
        "month" => cmd_month(store, renderer, &owner, args, now),
        "upcoming" => cmd_upcoming(store, cfg, renderer, &owner, args, now),
        "classes" | "tasks" | "exams" | "events" => cmd_list(store, renderer, &owner, command.parse()?, args, now),
        "add" => cmd_add(store, &owner, args, now),
        "modify" => cmd_modify(store, &owner, args, now),
        "done" => cmd_done(store, &owner, args, now),
        "delete" => cmd_delete(store, &owner, args),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn window_days(cfg: &Config, key: &str, default: i64) -> anyhow::Result<i64> {
    Ok(cfg.get_i64(key)?.unwrap_or(default))
}

#[instrument(skip(store, cfg, renderer, now))]
fn cmd_dashboard(
    store: &DataStore,
    cfg: &Config,
    renderer: &Renderer,
    owner: &OwnerId,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command dashboard");

    let days = window_days(cfg, "upcoming.days", DASHBOARD_WINDOW_DAYS)?;
    let badge_days = window_days(cfg, "exams.window_days", EXAM_BADGE_WINDOW_DAYS)?;
    let snapshot = store.snapshot(owner)?;

    let stats = dashboard_stats(now, days, &snapshot.classes, &snapshot.tasks, &snapshot.exams);
    let summary = compute_upcoming(now, days, &snapshot.tasks, &snapshot.exams);
    let badge = compute_upcoming(now, badge_days, &snapshot.tasks, &snapshot.exams).upcoming_exam_count;

    renderer.write_dashboard(io::stdout().lock(), now, &stats, &summary, badge, badge_days)
}

#[instrument(skip(store, renderer, now))]
fn cmd_timetable(store: &DataStore, renderer: &Renderer, owner: &OwnerId, now: NaiveDateTime) -> anyhow::Result<()> {
    info!("command timetable");

    let classes = store.classes(owner)?;
    let grid = project_timetable(&classes);
    renderer.write_timetable(io::stdout().lock(), &grid, now)
}

#[instrument(skip(cfg, renderer, args, now))]
fn cmd_now(cfg: &Config, renderer: &Renderer, args: &[String], now: NaiveDateTime) -> anyhow::Result<()> {
    info!("command now");

    if !args.iter().any(|arg| arg == "--watch" || arg == "-w") {
        return renderer.write_live_state(io::stdout().lock(), now, resolve_live_period(now));
    }

    let poll_seconds = cfg
        .get_u64("live.poll_seconds")?
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_POLL_SECONDS);
    let mut ticker = LiveTicker::new(local_now, StdDuration::from_secs(poll_seconds));
    ticker.run(None, |now, state| {
        let mut out = io::stdout().lock();
        renderer.write_live_state(&mut out, now, state)?;
        out.flush()?;
        Ok(())
    })
}

fn day_start(date: NaiveDate) -> anyhow::Result<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("failed to construct midnight for {date}"))
}

/// `[from] [to]`; defaults to the month containing `from` (or today).
fn resolve_calendar_range(args: &[String], now: NaiveDateTime) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let from = match args.first() {
        Some(raw) => parse_date_arg(raw, now)?,
        None => first_day_of_month(now.year(), now.month())
            .ok_or_else(|| anyhow!("invalid current month"))?,
    };
    let to = match args.get(1) {
        Some(raw) => parse_date_arg(raw, now)?,
        None => last_day_of_month(from.year(), from.month()).unwrap_or(from),
    };
    if to < from {
        return Err(anyhow!("calendar range ends before it starts: {from} > {to}"));
    }
    Ok((from, to))
}

/// Calendar items starting on any day in `[from, to]`.
///
/// Events are fetched up to the following midnight so sub-second start
/// times late on `to` are kept; the date filter then drops that midnight.
pub fn calendar_range<S: PlannerSource>(
    source: &S,
    owner: &OwnerId,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<CalendarItem>> {
    let after_to = to
        .succ_opt()
        .ok_or_else(|| anyhow!("calendar range ends at the last representable date"))?;
    let events = source.events_between(owner, day_start(from)?, day_start(after_to)?)?;
    let tasks = source.tasks(owner)?;
    let exams = source.exams(owner)?;

    let mut items = items_between(&aggregate_calendar(&events, &tasks, &exams), from, to);
    sort_by_start(&mut items);
    debug!(%from, %to, items = items.len(), "calendar range resolved");
    Ok(items)
}

#[instrument(skip(store, renderer, args, now))]
fn cmd_calendar(
    store: &DataStore,
    renderer: &Renderer,
    owner: &OwnerId,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command calendar");

    let json = args.iter().any(|arg| arg == "--json");
    let range_args: Vec<String> = args.iter().filter(|arg| *arg != "--json").cloned().collect();
    let (from, to) = resolve_calendar_range(&range_args, now)?;
    let items = calendar_range(store, owner, from, to)?;

    if json {
        renderer.write_calendar_json(io::stdout().lock(), &items)
    } else {
        renderer.write_calendar_items(io::stdout().lock(), &items)
    }
}

#[instrument(skip(store, renderer, args, now))]
fn cmd_day(
    store: &DataStore,
    renderer: &Renderer,
    owner: &OwnerId,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command day");

    let date = match args.first() {
        Some(raw) => parse_date_arg(raw, now)?,
        None => now.date(),
    };
    let snapshot = store.snapshot(owner)?;
    let bucket = bucket_by_day(date, &snapshot.tasks, &snapshot.exams, &snapshot.events);
    renderer.write_day_bucket(io::stdout().lock(), &bucket)
}

#[instrument(skip(store, renderer, args, now))]
fn cmd_month(
    store: &DataStore,
    renderer: &Renderer,
    owner: &OwnerId,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command month");

    let (year, month) = match args.first() {
        Some(raw) => parse_month_arg(raw)?,
        None => (now.year(), now.month()),
    };
    let snapshot = store.snapshot(owner)?;
    let markers = month_markers(year, month, &snapshot.tasks, &snapshot.exams, &snapshot.events);
    renderer.write_month_markers(io::stdout().lock(), year, month, &markers, now.date())
}

#[instrument(skip(store, cfg, renderer, args, now))]
fn cmd_upcoming(
    store: &DataStore,
    cfg: &Config,
    renderer: &Renderer,
    owner: &OwnerId,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!("command upcoming");

    let days = match args.first() {
        Some(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("upcoming: expected a number of days, got {raw}"))?,
        None => window_days(cfg, "upcoming.days", DASHBOARD_WINDOW_DAYS)?,
    };
    if days < 0 {
        return Err(anyhow!("upcoming: window cannot be negative"));
    }

    let tasks = store.tasks(owner)?;
    let exams = store.exams(owner)?;
    let summary = compute_upcoming(now, days, &tasks, &exams);

    let upcoming_exams: Vec<Exam> = summary.upcoming_exams.iter().map(|exam| (*exam).clone()).collect();
    let upcoming_tasks: Vec<Task> = summary.upcoming_tasks.iter().map(|task| (*task).clone()).collect();

    let mut out = io::stdout().lock();
    writeln!(out, "Pending tasks: {}", summary.pending_task_count)?;
    writeln!(out, "Exams in the next {days} day(s): {}", summary.upcoming_exam_count)?;
    writeln!(out)?;
    renderer.write_exam_table(&mut out, &upcoming_exams)?;
    writeln!(out)?;
    renderer.write_task_table(&mut out, &upcoming_tasks, now)
}

#[instrument(skip(store, renderer, args, now))]
fn cmd_list(
    store: &DataStore,
    renderer: &Renderer,
    owner: &OwnerId,
    kind: EntityKind,
    args: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    info!(kind = kind.as_str(), "command list");

    let filter = match (kind, args.first()) {
        (EntityKind::Task, Some(raw)) => raw.parse::<TaskFilter>()?,
        (_, Some(raw)) => return Err(anyhow!("{}s: unexpected argument {raw}", kind.as_str())),
        (_, None) => TaskFilter::All,
    };

    let out = io::stdout().lock();
    match kind {
        EntityKind::Class => renderer.write_class_table(out, &store.classes(owner)?),
        EntityKind::Task => {
            let tasks: Vec<Task> = store
                .tasks(owner)?
                .into_iter()
                .filter(|task| filter.matches(task))
                .collect();
            renderer.write_task_table(out, &tasks, now)
        }
        EntityKind::Exam => renderer.write_exam_table(out, &store.exams(owner)?),
        EntityKind::Event => renderer.write_event_table(out, &store.events(owner)?),
    }
}

fn ensure_class_exists(store: &DataStore, owner: &OwnerId, class_id: Option<u64>) -> anyhow::Result<()> {
    let Some(id) = class_id else {
        return Ok(());
    };
    if store.get::<ClassSlot>(id, owner)?.is_none() {
        return Err(anyhow!("no class with id {id}"));
    }
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_add(store: &DataStore, owner: &OwnerId, args: &[String], now: NaiveDateTime) -> anyhow::Result<()> {
    info!("command add");

    let (kind_raw, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("add: expected a kind (class, task, exam or event)"))?;
    let kind: EntityKind = kind_raw.parse()?;
    let (title, mods) = parse_desc_and_mods(rest, now)?;

    let id = match kind {
        EntityKind::Class => {
            let mut slot = ClassSlot::new(owner.clone(), title, now);
            apply_to_class(&mut slot, &mods)?;
            store.create(slot, now)?.id
        }
        EntityKind::Task => {
            let mut task = Task::new(owner.clone(), title, now);
            apply_to_task(&mut task, &mods)?;
            ensure_class_exists(store, owner, task.class_id)?;
            store.create(task, now)?.id
        }
        EntityKind::Exam => {
            let mut exam = Exam::new(owner.clone(), title, required_date(&mods, "exam")?, now);
            apply_to_exam(&mut exam, &mods)?;
            ensure_class_exists(store, owner, exam.class_id)?;
            store.create(exam, now)?.id
        }
        EntityKind::Event => {
            let mut event = Event::new(owner.clone(), title, required_date(&mods, "event")?, now);
            apply_to_event(&mut event, &mods)?;
            store.create(event, now)?.id
        }
    };

    println!("Created {} {id}.", kind.as_str());
    Ok(())
}

fn parse_id(raw: Option<&String>, usage: &str) -> anyhow::Result<u64> {
    let raw = raw.ok_or_else(|| anyhow!("usage: {usage}"))?;
    raw.parse::<u64>()
        .with_context(|| format!("invalid id: {raw}"))
}

/// Edits a copy first so invalid modifiers leave the stored record alone.
fn modify_record<R, F>(
    store: &DataStore,
    owner: &OwnerId,
    id: u64,
    now: NaiveDateTime,
    kind: EntityKind,
    edit: F,
) -> anyhow::Result<()>
where
    R: crate::datastore::Record,
    F: FnOnce(&mut R) -> anyhow::Result<()>,
{
    let mut edited = store
        .get::<R>(id, owner)?
        .ok_or_else(|| anyhow!("no {} with id {id}", kind.as_str()))?;
    edit(&mut edited)?;
    let matched = store.update::<R, _>(id, owner, now, |record| *record = edited)?;
    if !matched {
        return Err(anyhow!("no {} with id {id}", kind.as_str()));
    }
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_modify(store: &DataStore, owner: &OwnerId, args: &[String], now: NaiveDateTime) -> anyhow::Result<()> {
    info!("command modify");

    let usage = "campus modify <class|task|exam|event> <id> [title] key:value...";
    let kind: EntityKind = args
        .first()
        .ok_or_else(|| anyhow!("usage: {usage}"))?
        .parse()?;
    let id = parse_id(args.get(1), usage)?;
    let (title, mods) = split_title_and_mods(args.get(2..).unwrap_or_default(), now)?;
    if title.is_none() && mods.is_empty() {
        return Err(anyhow!("modify: nothing to change"));
    }

    apply_modification(store, owner, kind, id, title, &mods, now)?;
    println!("Modified {} {id}.", kind.as_str());
    Ok(())
}

fn apply_modification(
    store: &DataStore,
    owner: &OwnerId,
    kind: EntityKind,
    id: u64,
    title: Option<String>,
    mods: &[Mod],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    match kind {
        EntityKind::Class => modify_record::<ClassSlot, _>(store, owner, id, now, kind, |slot| {
            if let Some(title) = title {
                slot.name = title;
            }
            apply_to_class(slot, mods)
        }),
        EntityKind::Task => modify_record::<Task, _>(store, owner, id, now, kind, |task| {
            if let Some(title) = title {
                task.title = title;
            }
            apply_to_task(task, mods)?;
            ensure_class_exists(store, owner, task.class_id)
        }),
        EntityKind::Exam => modify_record::<Exam, _>(store, owner, id, now, kind, |exam| {
            if let Some(title) = title {
                exam.title = title;
            }
            apply_to_exam(exam, mods)?;
            ensure_class_exists(store, owner, exam.class_id)
        }),
        EntityKind::Event => modify_record::<Event, _>(store, owner, id, now, kind, |event| {
            if let Some(title) = title {
                event.title = title;
            }
            apply_to_event(event, mods)
        }),
    }
}

/// Toggles a task between completed and pending.
#[instrument(skip(store, args, now))]
fn cmd_done(store: &DataStore, owner: &OwnerId, args: &[String], now: NaiveDateTime) -> anyhow::Result<()> {
    info!("command done");

    let id = parse_id(args.first(), "campus done <task-id>")?;
    let task = toggle_task(store, owner, id, now)?;
    if task.is_completed() {
        println!("Completed task {id}.");
    } else {
        println!("Reopened task {id}.");
    }
    Ok(())
}

fn toggle_task(store: &DataStore, owner: &OwnerId, id: u64, now: NaiveDateTime) -> anyhow::Result<Task> {
    modify_record::<Task, _>(store, owner, id, now, EntityKind::Task, |task| {
        task.toggle_status();
        Ok(())
    })?;
    store
        .get::<Task>(id, owner)?
        .ok_or_else(|| anyhow!("no task with id {id}"))
}

#[instrument(skip(store, args))]
fn cmd_delete(store: &DataStore, owner: &OwnerId, args: &[String]) -> anyhow::Result<()> {
    info!("command delete");

    let usage = "campus delete <class|task|exam|event> <id>";
    let kind: EntityKind = args
        .first()
        .ok_or_else(|| anyhow!("usage: {usage}"))?
        .parse()?;
    let id = parse_id(args.get(1), usage)?;

    let deleted = match kind {
        EntityKind::Class => store.delete::<ClassSlot>(id, owner)?,
        EntityKind::Task => store.delete::<Task>(id, owner)?,
        EntityKind::Exam => store.delete::<Exam>(id, owner)?,
        EntityKind::Event => store.delete::<Event>(id, owner)?,
    };
    if !deleted {
        return Err(anyhow!("no {} with id {id}", kind.as_str()));
    }

    println!("Deleted {} {id}.", kind.as_str());
    Ok(())
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
    entries.sort();
    for (k, v) in entries {
        println!("{k}={v}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "\
usage: campus [-v|-q] [--rc KEY=VALUE] [--campusrc PATH] [--data DIR] <command> [args]

  dashboard                 counts, live period and upcoming lists
  timetable                 weekly grid of classes by period
  now [--watch]             current period; --watch keeps polling
  calendar [from] [to] [--json]
                            tasks, exams and events in a date range
  day [date]                everything on one day
  month [YYYY-MM]           month grid with task/exam/event markers
  upcoming [days]           exams and pending tasks in the window
  classes|exams|events
  tasks [all|pending|completed]
  add <kind> <title> key:value...
  modify <kind> <id> [title] key:value...
  done <task-id>            toggle completed / pending
  delete <kind> <id>"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::model::{ExamStatus, TaskStatus};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn abbreviations_must_be_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("time", &known), Some("timetable"));
        assert_eq!(expand_command_abbrev("up", &known), Some("upcoming"));
        assert_eq!(expand_command_abbrev("da", &known), None);
        assert_eq!(expand_command_abbrev("day", &known), Some("day"));
        assert_eq!(expand_command_abbrev("mo", &known), None);
        assert_eq!(expand_command_abbrev("mod", &known), Some("modify"));
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }

    #[test]
    fn parses_entity_kinds() {
        assert_eq!("Exams".parse::<EntityKind>().expect("kind"), EntityKind::Exam);
        assert!("homework".parse::<EntityKind>().is_err());
    }

    #[test]
    fn calendar_range_defaults_to_current_month() {
        let now = NaiveDate::from_ymd_opt(2025, 2, 10)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid now");
        let (from, to) = resolve_calendar_range(&[], now).expect("range");
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 2, 1).expect("date"));
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 2, 28).expect("date"));

        let args = vec!["2025-03-05".to_string(), "2025-03-01".to_string()];
        assert!(resolve_calendar_range(&args, now).is_err());
    }

    #[test]
    fn calendar_range_keeps_sub_second_events_at_end_of_day() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        let owner = OwnerId::new("alice");

        let late = NaiveDate::from_ymd_opt(2025, 1, 10)
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 500))
            .expect("valid datetime");
        store
            .create(Event::new(owner.clone(), "Stargazing".to_string(), late, at(6, 8, 0)), at(6, 8, 0))
            .expect("create late event");
        store
            .create(Event::new(owner.clone(), "Brunch".to_string(), at(11, 0, 0), at(6, 8, 0)), at(6, 8, 0))
            .expect("create next-day event");

        let from = NaiveDate::from_ymd_opt(2025, 1, 10).expect("date");
        let items = calendar_range(&store, &owner, from, from).expect("calendar range");
        let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Stargazing"]);
    }

    #[test]
    fn modify_edits_in_place_and_keeps_id() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        let owner = OwnerId::new("alice");
        let exam = store
            .create(Exam::new(owner.clone(), "Midterm".to_string(), at(20, 9, 0), at(6, 8, 0)), at(6, 8, 0))
            .expect("create exam");

        cmd_modify(&store, &owner, &words(&["exam", "1", "Final", "status:confirmed", "room:B2"]), at(7, 8, 0))
            .expect("modify exam");

        let stored = store.get::<Exam>(exam.id, &owner).expect("get").expect("present");
        assert_eq!(stored.title, "Final");
        assert_eq!(stored.status, ExamStatus::Confirmed);
        assert_eq!(stored.room.as_deref(), Some("B2"));
        assert_eq!(stored.exam_date, at(20, 9, 0));
        assert_eq!(stored.updated_at, at(7, 8, 0));
    }

    #[test]
    fn modify_rejects_bad_input_without_writing() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        let owner = OwnerId::new("alice");
        let task = store
            .create(Task::new(owner.clone(), "Essay".to_string(), at(6, 8, 0)), at(6, 8, 0))
            .expect("create task");

        assert!(cmd_modify(&store, &owner, &words(&["task", "1"]), at(7, 8, 0)).is_err());
        assert!(cmd_modify(&store, &owner, &words(&["task", "9", "priority:high"]), at(7, 8, 0)).is_err());
        assert!(cmd_modify(&store, &OwnerId::new("bob"), &words(&["task", "1", "priority:high"]), at(7, 8, 0)).is_err());
        assert!(cmd_modify(&store, &owner, &words(&["task", "1", "class:42"]), at(7, 8, 0)).is_err());

        let stored = store.get::<Task>(task.id, &owner).expect("get").expect("present");
        assert_eq!(stored, task);
    }

    #[test]
    fn done_toggles_between_completed_and_pending() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        let owner = OwnerId::new("alice");
        let task = store
            .create(Task::new(owner.clone(), "Essay".to_string(), at(6, 8, 0)), at(6, 8, 0))
            .expect("create task");

        let toggled = toggle_task(&store, &owner, task.id, at(7, 8, 0)).expect("complete");
        assert_eq!(toggled.status, TaskStatus::Completed);
        let toggled = toggle_task(&store, &owner, task.id, at(7, 9, 0)).expect("reopen");
        assert_eq!(toggled.status, TaskStatus::Pending);
        assert!(toggle_task(&store, &owner, 99, at(7, 9, 0)).is_err());
    }
}
