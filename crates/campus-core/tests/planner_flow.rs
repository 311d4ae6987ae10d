use campus_core::calendar::{SourceKind, sort_by_start};
use campus_core::datastore::{DataStore, PlannerSource};
use campus_core::model::{ClassSlot, DayOfWeek, Event, Exam, OwnerId, Task, TaskStatus};
use campus_core::period::{Period, PeriodCount};
use campus_core::{
    PaletteColor, PeriodState, aggregate_calendar, bucket_by_day, compute_upcoming, project_timetable,
    resolve_live_period,
};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::tempdir;

// 2025-01-06 is a Monday.
fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid datetime")
}

#[test]
fn datastore_roundtrip_is_owner_scoped() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let alice = OwnerId::new("alice");
    let bob = OwnerId::new("bob");

    let essay = store
        .create(Task::new(alice.clone(), "Essay".to_string(), at(6, 8, 0)), at(6, 8, 0))
        .expect("create alice task");
    let lab = store
        .create(Task::new(bob.clone(), "Lab report".to_string(), at(6, 8, 0)), at(6, 8, 0))
        .expect("create bob task");
    assert_eq!(essay.id, 1);
    assert_eq!(lab.id, 2);

    assert_eq!(store.tasks(&alice).expect("alice tasks").len(), 1);
    assert!(store.get::<Task>(lab.id, &alice).expect("get").is_none());

    let matched = store
        .update::<Task, _>(lab.id, &alice, at(6, 9, 0), |task| task.status = TaskStatus::Completed)
        .expect("update");
    assert!(!matched);
    assert!(!store.delete::<Task>(lab.id, &alice).expect("delete"));

    let matched = store
        .update::<Task, _>(essay.id, &alice, at(6, 9, 0), |task| task.status = TaskStatus::Completed)
        .expect("update");
    assert!(matched);
    let stored = store.get::<Task>(essay.id, &alice).expect("get").expect("present");
    assert!(stored.is_completed());
    assert_eq!(stored.updated_at, at(6, 9, 0));
    assert_eq!(stored.created_at, at(6, 8, 0));

    let reopened = DataStore::open(temp.path()).expect("reopen datastore");
    assert_eq!(reopened.tasks(&bob).expect("bob tasks"), vec![lab]);
}

#[test]
fn malformed_line_reports_file_and_line() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    std::fs::write(temp.path().join("exams.data"), "\n{not json}\n").expect("corrupt file");

    let err = store.exams(&OwnerId::new("alice")).expect_err("parse failure");
    let message = format!("{err:#}");
    assert!(message.contains("exams.data"));
    assert!(message.contains("line 2"));
}

#[test]
fn events_between_is_inclusive_and_sorted() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let owner = OwnerId::new("alice");

    for (title, start) in [("late", at(12, 0, 0)), ("early", at(6, 0, 0)), ("outside", at(13, 0, 0))] {
        store
            .create(Event::new(owner.clone(), title.to_string(), start, at(1, 0, 0)), at(1, 0, 0))
            .expect("create event");
    }

    let events = store
        .events_between(&owner, at(6, 0, 0), at(12, 0, 0))
        .expect("events between");
    let titles: Vec<&str> = events.iter().map(|event| event.title.as_str()).collect();
    assert_eq!(titles, vec!["early", "late"]);
}

#[test]
fn snapshot_feeds_every_view() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");
    let owner = OwnerId::new("alice");
    let now = at(6, 9, 0);

    let mut algebra = ClassSlot::new(owner.clone(), "Algebra".to_string(), now);
    algebra.day_of_week = Some(DayOfWeek::Monday);
    algebra.period = Period::new(1);
    algebra.period_count = PeriodCount::Double;
    store.create(algebra, now).expect("create class");

    let mut task = Task::new(owner.clone(), "Problem set".to_string(), now);
    task.due_date = Some(at(10, 23, 0));
    task.color = Some("teal".to_string());
    store.create(task, now).expect("create task");

    let mut exam = Exam::new(owner.clone(), "Midterm".to_string(), at(13, 9, 0), now);
    exam.color = Some("green".to_string());
    store.create(exam, now).expect("create exam");

    let snapshot = store.snapshot(&owner).expect("snapshot");

    let grid = project_timetable(&snapshot.classes);
    assert_eq!(grid.occupied_cells(), 2);
    assert!(grid.is_continuation(DayOfWeek::Monday, Period::new(2).expect("period")));
    assert_eq!(
        resolve_live_period(now),
        PeriodState::During {
            period: Period::FIRST
        }
    );

    let mut items = aggregate_calendar(&snapshot.events, &snapshot.tasks, &snapshot.exams);
    sort_by_start(&mut items);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].source, SourceKind::Task);
    assert_eq!(items[0].color, PaletteColor::Yellow);
    assert_eq!(items[1].color, PaletteColor::Green);

    let summary = compute_upcoming(now, 7, &snapshot.tasks, &snapshot.exams);
    assert_eq!(summary.pending_task_count, 1);
    assert_eq!(summary.upcoming_exam_count, 1);
    assert_eq!(summary.upcoming_tasks.len(), 1);

    let day = NaiveDate::from_ymd_opt(2025, 1, 10).expect("date");
    let bucket = bucket_by_day(day, &snapshot.tasks, &snapshot.exams, &snapshot.events);
    assert!(bucket.has_tasks());
    assert!(!bucket.has_exams());
}
