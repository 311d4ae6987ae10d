use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::model::{ClassSlot, Event, Exam, OwnerId, Task};

/// A persisted entity keyed by `(id, owner)`.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const FILE_NAME: &'static str;
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
    fn owner(&self) -> &OwnerId;
    fn touch(&mut self, now: NaiveDateTime);
}

macro_rules! impl_record {
    ($ty:ty, $file:literal, $kind:literal) => {
        impl Record for $ty {
            const FILE_NAME: &'static str = $file;
            const KIND: &'static str = $kind;

            fn id(&self) -> u64 {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = id;
            }

            fn owner(&self) -> &OwnerId {
                &self.owner
            }

            fn touch(&mut self, now: NaiveDateTime) {
                self.updated_at = now;
            }
        }
    };
}

impl_record!(ClassSlot, "classes.data", "class");
impl_record!(Task, "tasks.data", "task");
impl_record!(Exam, "exams.data", "exam");
impl_record!(Event, "events.data", "event");

/// One owner's entities, read once per command.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub classes: Vec<ClassSlot>,
    pub tasks: Vec<Task>,
    pub exams: Vec<Exam>,
    pub events: Vec<Event>,
}

/// Read side consumed by the planner views.
pub trait PlannerSource {
    fn classes(&self, owner: &OwnerId) -> anyhow::Result<Vec<ClassSlot>>;
    fn tasks(&self, owner: &OwnerId) -> anyhow::Result<Vec<Task>>;
    fn exams(&self, owner: &OwnerId) -> anyhow::Result<Vec<Exam>>;
    fn events(&self, owner: &OwnerId) -> anyhow::Result<Vec<Event>>;

    /// Events starting within `[start, end]`, ascending by start.
    fn events_between(
        &self,
        owner: &OwnerId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events(owner)?
            .into_iter()
            .filter(|event| event.start_date >= start && event.start_date <= end)
            .collect();
        events.sort_by_key(|event| event.start_date);
        Ok(events)
    }

    fn snapshot(&self, owner: &OwnerId) -> anyhow::Result<Snapshot> {
        Ok(Snapshot {
            classes: self.classes(owner)?,
            tasks: self.tasks(owner)?,
            exams: self.exams(owner)?,
            events: self.events(owner)?,
        })
    }
}

#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub classes_path: PathBuf,
    pub tasks_path: PathBuf,
    pub exams_path: PathBuf,
    pub events_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let classes_path = data_dir.join(ClassSlot::FILE_NAME);
        let tasks_path = data_dir.join(Task::FILE_NAME);
        let exams_path = data_dir.join(Exam::FILE_NAME);
        let events_path = data_dir.join(Event::FILE_NAME);

        for path in [&classes_path, &tasks_path, &exams_path, &events_path] {
            if !path.exists() {
                fs::write(path, "").with_context(|| format!("failed to create {}", path.display()))?;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            classes = %classes_path.display(),
            tasks = %tasks_path.display(),
            exams = %exams_path.display(),
            events = %events_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            classes_path,
            tasks_path,
            exams_path,
            events_path,
        })
    }

    fn path_for<R: Record>(&self) -> PathBuf {
        self.data_dir.join(R::FILE_NAME)
    }

    fn load_all<R: Record>(&self) -> anyhow::Result<Vec<R>> {
        load_jsonl(&self.path_for::<R>()).with_context(|| format!("failed to load {}", R::FILE_NAME))
    }

    fn save_all<R: Record>(&self, records: &[R]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.path_for::<R>(), records).with_context(|| format!("failed to save {}", R::FILE_NAME))
    }

    #[tracing::instrument(skip(self), fields(kind = R::KIND))]
    pub fn list<R: Record>(&self, owner: &OwnerId) -> anyhow::Result<Vec<R>> {
        let mut records: Vec<R> = self
            .load_all::<R>()?
            .into_iter()
            .filter(|record| record.owner() == owner)
            .collect();
        records.sort_by_key(|record| record.id());
        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(kind = R::KIND))]
    pub fn get<R: Record>(&self, id: u64, owner: &OwnerId) -> anyhow::Result<Option<R>> {
        Ok(self
            .load_all::<R>()?
            .into_iter()
            .find(|record| record.id() == id && record.owner() == owner))
    }

    /// Ids come from one sequence per entity kind, shared by all owners.
    pub fn next_id<R: Record>(records: &[R]) -> u64 {
        records.iter().map(Record::id).max().unwrap_or(0) + 1
    }

    #[tracing::instrument(skip(self, record, now), fields(kind = R::KIND, owner = %record.owner()))]
    pub fn create<R: Record>(&self, mut record: R, now: NaiveDateTime) -> anyhow::Result<R> {
        let mut records = self.load_all::<R>()?;
        record.set_id(Self::next_id(&records));
        record.touch(now);
        records.push(record.clone());
        self.save_all(&records)?;
        debug!(id = record.id(), count = records.len(), "record created");
        Ok(record)
    }

    /// Applies `edit` to the matching record; `false` when nothing matched.
    #[tracing::instrument(skip(self, now, edit), fields(kind = R::KIND))]
    pub fn update<R, F>(&self, id: u64, owner: &OwnerId, now: NaiveDateTime, edit: F) -> anyhow::Result<bool>
    where
        R: Record,
        F: FnOnce(&mut R),
    {
        let mut records = self.load_all::<R>()?;
        let Some(record) = records
            .iter_mut()
            .find(|record| record.id() == id && record.owner() == owner)
        else {
            return Ok(false);
        };
        edit(record);
        record.set_id(id);
        record.touch(now);
        self.save_all(&records)?;
        Ok(true)
    }

    #[tracing::instrument(skip(self), fields(kind = R::KIND))]
    pub fn delete<R: Record>(&self, id: u64, owner: &OwnerId) -> anyhow::Result<bool> {
        let records = self.load_all::<R>()?;
        let before = records.len();
        let kept: Vec<R> = records
            .into_iter()
            .filter(|record| !(record.id() == id && record.owner() == owner))
            .collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.save_all(&kept)?;
        info!(id, "record deleted");
        Ok(true)
    }
}

impl PlannerSource for DataStore {
    fn classes(&self, owner: &OwnerId) -> anyhow::Result<Vec<ClassSlot>> {
        self.list(owner)
    }

    fn tasks(&self, owner: &OwnerId) -> anyhow::Result<Vec<Task>> {
        self.list(owner)
    }

    fn exams(&self, owner: &OwnerId) -> anyhow::Result<Vec<Exam>> {
        self.list(owner)
    }

    fn events(&self, owner: &OwnerId) -> anyhow::Result<Vec<Event>> {
        self.list(owner)
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<R: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<R>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: R = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<R: Serialize>(path: &Path, records: &[R]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
