use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{CLASS_FALLBACK_COLOR, CalendarItem, PaletteColor, SourceKind};
use crate::config::Config;
use crate::datetime::{format_date, format_instant};
use crate::day_bucket::{DayBucket, DayMarkers};
use crate::live::{PeriodState, minutes_remaining, today_column};
use crate::model::{ClassSlot, DayOfWeek, Event, Exam, Task};
use crate::period::{PeriodSpan, span_for, time_range_of};
use crate::timetable::TimetableGrid;
use crate::upcoming::{DashboardStats, UpcomingSummary};

const HIGHLIGHT: &str = "1;7";
const OVERDUE: &str = "31";
const ID: &str = "33";
const DIM: &str = "2";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Weekly grid; double periods print their name once and a `|` marker
    /// in the continuation cell.
    #[tracing::instrument(skip(self, out, grid))]
    pub fn write_timetable<W: Write>(
        &self,
        mut out: W,
        grid: &TimetableGrid<'_>,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        let today = today_column(now);
        let live = crate::live::resolve_live_period(now);

        let mut headers = vec!["Period".to_string()];
        headers.extend(DayOfWeek::WEEKDAYS.iter().map(|day| {
            if Some(*day) == today {
                self.paint(day.short_label(), HIGHLIGHT)
            } else {
                day.short_label().to_string()
            }
        }));

        let mut rows = Vec::new();
        for (period, row) in grid.rows() {
            let mut cells = vec![format!("{period} {}", time_range_of(period))];
            for (day, slot) in DayOfWeek::WEEKDAYS.iter().zip(row) {
                let text = match slot {
                    Some(_) if grid.is_continuation(*day, period) => "|".to_string(),
                    Some(slot) => self.class_label(slot),
                    None => String::new(),
                };
                let is_live = Some(*day) == today && live == PeriodState::During { period };
                cells.push(if is_live && !text.is_empty() {
                    self.paint(&text, HIGHLIGHT)
                } else {
                    text
                });
            }
            rows.push(cells);
        }

        write_table(&mut out, headers, rows)?;

        let unplaced = grid.unplaced();
        if !unplaced.is_empty() {
            writeln!(out)?;
            writeln!(out, "Not on the weekly grid:")?;
            for slot in unplaced {
                writeln!(
                    out,
                    "  {} {} ({})",
                    self.paint(&slot.id.to_string(), ID),
                    slot.name,
                    unplaced_reason(slot)
                )?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, items))]
    pub fn write_calendar_items<W: Write>(&self, mut out: W, items: &[CalendarItem]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Kind".to_string(),
            "Title".to_string(),
        ];

        let rows = items
            .iter()
            .map(|item| {
                let start = if item.all_day {
                    format_date(item.start.date())
                } else {
                    format_instant(item.start)
                };
                vec![
                    self.paint(&item.id, ID),
                    start,
                    item.end.map(format_instant).unwrap_or_default(),
                    item.source.as_str().to_string(),
                    self.paint_palette(&item.title, item.color),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)
    }

    /// One JSON object per line, with the pastel fill a web view would use.
    pub fn write_calendar_json<W: Write>(&self, mut out: W, items: &[CalendarItem]) -> anyhow::Result<()> {
        for item in items {
            let mut value = serde_json::to_value(item)?;
            value["background"] = serde_json::Value::from(item.color.css());
            writeln!(out, "{value}")?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, stats, summary, exam_badge))]
    pub fn write_dashboard<W: Write>(
        &self,
        mut out: W,
        now: NaiveDateTime,
        stats: &DashboardStats,
        summary: &UpcomingSummary<'_>,
        exam_badge: usize,
        badge_days: i64,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", format_instant(now))?;
        self.write_live_state(&mut out, now, crate::live::resolve_live_period(now))?;
        writeln!(out)?;
        writeln!(out, "Classes        {}", stats.total_classes)?;
        writeln!(out, "Pending tasks  {}", stats.pending_tasks)?;
        writeln!(out, "Upcoming exams {}", stats.upcoming_exams)?;
        if exam_badge > 0 {
            writeln!(
                out,
                "{}",
                self.paint_palette(
                    &format!("{exam_badge} exam(s) in the next {badge_days} day(s)"),
                    SourceKind::Exam.fallback_color()
                )
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Upcoming exams (until {})", format_instant(summary.window.end))?;
        if summary.upcoming_exams.is_empty() {
            writeln!(out, "  {}", self.paint("none", DIM))?;
        }
        for exam in &summary.upcoming_exams {
            let room = exam.room.as_deref().map(|room| format!(" @ {room}")).unwrap_or_default();
            writeln!(out, "  {}  {}{room}", format_instant(exam.exam_date), exam.title)?;
        }

        writeln!(out)?;
        writeln!(out, "Upcoming tasks")?;
        if summary.upcoming_tasks.is_empty() {
            writeln!(out, "  {}", self.paint("none", DIM))?;
        }
        for task in &summary.upcoming_tasks {
            let due = task.due_date.map(format_instant).unwrap_or_default();
            writeln!(out, "  {due}  {} [{}]", task.title, token(&task.priority))?;
        }
        Ok(())
    }

    pub fn write_live_state<W: Write>(&self, mut out: W, now: NaiveDateTime, state: PeriodState) -> anyhow::Result<()> {
        match minutes_remaining(now, state) {
            Some(minutes) => {
                let verb = match state {
                    PeriodState::During { .. } => "ends",
                    _ => "starts",
                };
                let next = match state {
                    PeriodState::Between { before, .. } => format!("period {before} "),
                    _ => String::new(),
                };
                writeln!(
                    out,
                    "Now: {}, {next}{verb} in {minutes} min",
                    self.paint(&state.to_string(), HIGHLIGHT)
                )?;
            }
            None => writeln!(out, "Now: {state}")?,
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, bucket), fields(date = %bucket.date))]
    pub fn write_day_bucket<W: Write>(&self, mut out: W, bucket: &DayBucket<'_>) -> anyhow::Result<()> {
        writeln!(out, "{} ({})", format_date(bucket.date), bucket.date.weekday())?;
        if bucket.is_empty() {
            writeln!(out, "  {}", self.paint("nothing scheduled", DIM))?;
            return Ok(());
        }

        for event in &bucket.events {
            let when = if event.all_day {
                "all day".to_string()
            } else {
                event.start_date.format("%H:%M").to_string()
            };
            let color = PaletteColor::resolve(event.color.as_deref(), SourceKind::Event.fallback_color());
            writeln!(out, "  event {when:>7}  {}", self.paint_palette(&event.title, color))?;
        }
        for task in &bucket.tasks {
            let when = task.due_date.map(|due| due.format("%H:%M").to_string()).unwrap_or_default();
            let color = PaletteColor::resolve(task.color.as_deref(), SourceKind::Task.fallback_color());
            writeln!(
                out,
                "  task  {when:>7}  {} [{}]",
                self.paint_palette(&task.title, color),
                token(&task.status)
            )?;
        }
        for exam in &bucket.exams {
            let color = PaletteColor::resolve(exam.color.as_deref(), SourceKind::Exam.fallback_color());
            writeln!(
                out,
                "  exam  {:>7}  {}",
                exam.exam_date.format("%H:%M").to_string(),
                self.paint_palette(&exam.title, color)
            )?;
        }
        Ok(())
    }

    /// Month grid starting on Monday; `T`, `X` and `E` mark tasks, exams
    /// and events.
    #[tracing::instrument(skip(self, out, markers))]
    pub fn write_month_markers<W: Write>(
        &self,
        mut out: W,
        year: i32,
        month: u32,
        markers: &[(NaiveDate, DayMarkers)],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{year}-{month:02}")?;
        writeln!(out, "{}", ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"].map(|d| format!("{d:<7}")).join(""))?;

        let Some((first, _)) = markers.first() else {
            return Ok(());
        };
        let mut line = " ".repeat(7 * first.weekday().num_days_from_monday() as usize);
        for (date, day) in markers {
            let mut cell = format!("{:>2}", date.day());
            cell.push(if day.has_tasks { 'T' } else { ' ' });
            cell.push(if day.has_exams { 'X' } else { ' ' });
            cell.push(if day.has_events { 'E' } else { ' ' });
            let cell = if *date == today {
                self.paint(&cell, HIGHLIGHT)
            } else {
                cell
            };
            line.push_str(&cell);
            line.push_str("  ");

            if date.weekday().num_days_from_monday() == 6 {
                writeln!(out, "{}", line.trim_end())?;
                line.clear();
            }
        }
        if !line.trim().is_empty() {
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }

    pub fn write_class_table<W: Write>(&self, mut out: W, classes: &[ClassSlot]) -> anyhow::Result<()> {
        let headers = ["ID", "Day", "Period", "Time", "Name", "Room", "Instructor"]
            .map(str::to_string)
            .to_vec();
        let rows = classes
            .iter()
            .map(|slot| {
                let period = match slot.period {
                    Some(period) if slot.period_count.periods() > 1 => format!("{period}x{}", slot.period_count.periods()),
                    Some(period) => period.to_string(),
                    None => String::new(),
                };
                vec![
                    self.paint(&slot.id.to_string(), ID),
                    slot.day_of_week.map(DayOfWeek::short_label).unwrap_or_default().to_string(),
                    period,
                    class_span(slot).map(|span| span.to_string()).unwrap_or_default(),
                    self.paint_palette(&slot.name, PaletteColor::resolve(slot.color.as_deref(), CLASS_FALLBACK_COLOR)),
                    slot.room.clone().unwrap_or_default(),
                    slot.instructor.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    pub fn write_task_table<W: Write>(&self, mut out: W, tasks: &[Task], now: NaiveDateTime) -> anyhow::Result<()> {
        let headers = ["ID", "Due", "Priority", "Status", "Title"].map(str::to_string).to_vec();
        let rows = tasks
            .iter()
            .map(|task| {
                let due = task.due_date.map(format_instant).unwrap_or_default();
                let due = match task.due_date {
                    Some(task_due) if task_due < now && !task.is_completed() => self.paint(&due, OVERDUE),
                    _ => due,
                };
                vec![
                    self.paint(&task.id.to_string(), ID),
                    due,
                    token(&task.priority),
                    token(&task.status),
                    task.title.clone(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    pub fn write_exam_table<W: Write>(&self, mut out: W, exams: &[Exam]) -> anyhow::Result<()> {
        let headers = ["ID", "Date", "Minutes", "Room", "Status", "Title"].map(str::to_string).to_vec();
        let rows = exams
            .iter()
            .map(|exam| {
                vec![
                    self.paint(&exam.id.to_string(), ID),
                    format_instant(exam.exam_date),
                    exam.duration.map(|d| d.to_string()).unwrap_or_default(),
                    exam.room.clone().unwrap_or_default(),
                    token(&exam.status),
                    exam.title.clone(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    pub fn write_event_table<W: Write>(&self, mut out: W, events: &[Event]) -> anyhow::Result<()> {
        let headers = ["ID", "Start", "End", "Type", "Title"].map(str::to_string).to_vec();
        let rows = events
            .iter()
            .map(|event| {
                let start = if event.all_day {
                    format_date(event.start_date.date())
                } else {
                    format_instant(event.start_date)
                };
                vec![
                    self.paint(&event.id.to_string(), ID),
                    start,
                    event.end_date.map(format_instant).unwrap_or_default(),
                    token(&event.event_type),
                    event.title.clone(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    fn class_label(&self, slot: &ClassSlot) -> String {
        let label = match slot.room.as_deref() {
            Some(room) if !room.is_empty() => format!("{} ({room})", slot.name),
            _ => slot.name.clone(),
        };
        self.paint_palette(&label, PaletteColor::resolve(slot.color.as_deref(), CLASS_FALLBACK_COLOR))
    }

    fn paint_palette(&self, text: &str, color: PaletteColor) -> String {
        self.paint(text, color.ansi_code())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn unplaced_reason(slot: &ClassSlot) -> String {
    match slot.day_of_week {
        _ if !slot.is_scheduled() => "unscheduled".to_string(),
        Some(day) if !day.is_weekday() => day.short_label().to_string(),
        _ => "overlapped".to_string(),
    }
}

/// Explicit start/end times win; otherwise the span implied by the period.
pub fn class_span(slot: &ClassSlot) -> Option<PeriodSpan> {
    match (slot.start_time, slot.end_time) {
        (Some(start), Some(end)) => Some(PeriodSpan { start, end }),
        _ => slot.period.map(|period| span_for(period, slot.period_count)),
    }
}

fn token<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn write_table<W: Write>(mut writer: W, headers: Vec<String>, rows: Vec<Vec<String>>) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(header).as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        let visible_width = UnicodeWidthStr::width(strip_ansi(header).as_str());
        let padding = widths[idx].saturating_sub(visible_width);
        write!(writer, "{header}{} ", " ".repeat(padding))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
