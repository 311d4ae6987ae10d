use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::model::{ClassSlot, Exam, Task, TaskStatus};

/// Dashboard "upcoming" window.
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;
/// Window used for exam count badges.
pub const EXAM_BADGE_WINDOW_DAYS: i64 = 14;
/// Maximum rows in the upcoming lists.
pub const UPCOMING_LIST_LIMIT: usize = 5;

/// Forward window `[start, end]`, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl UpcomingWindow {
    pub fn new(now: NaiveDateTime, days: i64) -> Self {
        let end = Duration::try_days(days)
            .and_then(|span| now.checked_add_signed(span))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start: now, end }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingSummary<'a> {
    pub window: UpcomingWindow,
    /// Every task not yet completed, regardless of due date.
    pub pending_task_count: usize,
    pub upcoming_exam_count: usize,
    pub upcoming_exams: Vec<&'a Exam>,
    pub upcoming_tasks: Vec<&'a Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_classes: usize,
    pub pending_tasks: usize,
    pub upcoming_exams: usize,
}

#[tracing::instrument(skip(tasks, exams))]
pub fn compute_upcoming<'a>(
    now: NaiveDateTime,
    window_days: i64,
    tasks: &'a [Task],
    exams: &'a [Exam],
) -> UpcomingSummary<'a> {
    let window = UpcomingWindow::new(now, window_days);

    let pending_task_count = tasks.iter().filter(|task| !task.is_completed()).count();

    let mut upcoming_exams: Vec<&Exam> = exams.iter().filter(|exam| window.contains(exam.exam_date)).collect();
    upcoming_exams.sort_by_key(|exam| exam.exam_date);
    let upcoming_exam_count = upcoming_exams.len();
    upcoming_exams.truncate(UPCOMING_LIST_LIMIT);

    let mut upcoming_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Pending)
        .filter(|task| task.due_date.is_some_and(|due| window.contains(due)))
        .collect();
    upcoming_tasks.sort_by_key(|task| task.due_date);
    upcoming_tasks.truncate(UPCOMING_LIST_LIMIT);

    debug!(
        pending_task_count,
        upcoming_exam_count,
        listed_tasks = upcoming_tasks.len(),
        "computed upcoming summary"
    );

    UpcomingSummary {
        window,
        pending_task_count,
        upcoming_exam_count,
        upcoming_exams,
        upcoming_tasks,
    }
}

pub fn dashboard_stats(
    now: NaiveDateTime,
    window_days: i64,
    classes: &[ClassSlot],
    tasks: &[Task],
    exams: &[Exam],
) -> DashboardStats {
    let summary = compute_upcoming(now, window_days, tasks, exams);
    DashboardStats {
        total_classes: classes.len(),
        pending_tasks: summary.pending_task_count,
        upcoming_exams: summary.upcoming_exam_count,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::OwnerId;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn exam(id: u64, date: NaiveDateTime) -> Exam {
        let mut exam = Exam::new(OwnerId::new("u1"), format!("exam {id}"), date, at(1, 0, 0));
        exam.id = id;
        exam
    }

    fn task(id: u64, due: Option<NaiveDateTime>, status: TaskStatus) -> Task {
        let mut task = Task::new(OwnerId::new("u1"), format!("task {id}"), at(1, 0, 0));
        task.id = id;
        task.due_date = due;
        task.status = status;
        task
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = at(10, 0, 0);
        let exams = vec![
            exam(1, at(17, 0, 0)),
            exam(2, now),
            exam(3, at(17, 0, 0) + Duration::seconds(1)),
            exam(4, at(9, 23, 59)),
        ];
        let summary = compute_upcoming(now, DASHBOARD_WINDOW_DAYS, &[], &exams);

        let ids: Vec<u64> = summary.upcoming_exams.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(summary.upcoming_exam_count, 2);
        assert_eq!(summary.window.end, at(17, 0, 0));
    }

    #[test]
    fn pending_count_ignores_window_but_not_status() {
        let now = at(10, 0, 0);
        let tasks = vec![
            task(1, None, TaskStatus::Pending),
            task(2, Some(at(28, 0, 0)), TaskStatus::InProgress),
            task(3, Some(at(11, 0, 0)), TaskStatus::Completed),
            task(4, Some(at(12, 0, 0)), TaskStatus::Pending),
        ];
        let summary = compute_upcoming(now, DASHBOARD_WINDOW_DAYS, &tasks, &[]);

        assert_eq!(summary.pending_task_count, 3);
        let ids: Vec<u64> = summary.upcoming_tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn upcoming_tasks_are_sorted_and_capped() {
        let now = at(10, 0, 0);
        let tasks: Vec<Task> = (1..=7)
            .map(|id| task(id, Some(at(17 - id as u32, 8, 0)), TaskStatus::Pending))
            .collect();
        let summary = compute_upcoming(now, DASHBOARD_WINDOW_DAYS, &tasks, &[]);

        let ids: Vec<u64> = summary.upcoming_tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn exam_badge_window_counts_beyond_cap() {
        let now = at(1, 0, 0);
        let exams: Vec<Exam> = (1..=8).map(|id| exam(id, at(1 + id as u32, 9, 0))).collect();

        let badge = compute_upcoming(now, EXAM_BADGE_WINDOW_DAYS, &[], &exams);
        assert_eq!(badge.upcoming_exam_count, 8);
        assert_eq!(badge.upcoming_exams.len(), UPCOMING_LIST_LIMIT);

        let week = compute_upcoming(now, DASHBOARD_WINDOW_DAYS, &[], &exams);
        assert_eq!(week.upcoming_exam_count, 6);
    }

    #[test]
    fn stats_and_summary_are_idempotent() {
        let now = at(10, 0, 0);
        let tasks = vec![task(1, Some(at(11, 0, 0)), TaskStatus::Pending)];
        let exams = vec![exam(1, at(12, 0, 0))];

        let first = compute_upcoming(now, DASHBOARD_WINDOW_DAYS, &tasks, &exams);
        let second = compute_upcoming(now, DASHBOARD_WINDOW_DAYS, &tasks, &exams);
        assert_eq!(first, second);

        let stats = dashboard_stats(now, DASHBOARD_WINDOW_DAYS, &[], &tasks, &exams);
        assert_eq!(
            stats,
            DashboardStats {
                total_classes: 0,
                pending_tasks: 1,
                upcoming_exams: 1,
            }
        );
    }
}
