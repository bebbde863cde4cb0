//! Task storage.
//!
//! `TaskStore` is the contract the rest of the application depends on:
//! create, partial update, soft delete, owner-scoped listing and change
//! subscriptions. `Database` implements it over a single JSON file that is
//! rewritten atomically after every mutation.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TodoError};
use crate::task::{Task, TaskDraft, TaskPatch};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Receives the owner's full live task list after each change.
pub type Listener = Box<dyn FnMut(&[Task])>;

/// Document store holding every owner's tasks.
///
/// Soft-deleted records are invisible to every read: `get` reports them as
/// not found and `list` skips them.
pub trait TaskStore {
    /// Store a new task and return its id.
    fn create(&mut self, draft: TaskDraft, owner: &str, now: DateTime<Utc>) -> Result<String>;

    fn get(&self, id: &str) -> Result<Task>;

    /// Apply a partial update and return the updated record.
    fn update(&mut self, id: &str, patch: TaskPatch, now: DateTime<Utc>) -> Result<Task>;

    fn soft_delete(&mut self, id: &str, now: DateTime<Utc>) -> Result<()>;

    /// Live tasks of `owner`, most recently modified first.
    fn list(&self, owner: &str) -> Vec<Task>;

    /// Call `listener` now and after every change to `owner`'s tasks.
    fn subscribe(&mut self, owner: &str, listener: Listener) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Live task of `owner` imported from `source_task_id` in `source_app`.
    fn find_by_source(&self, owner: &str, source_app: &str, source_task_id: &str) -> Option<Task> {
        self.list(owner).into_iter().find(|t| {
            t.provenance.source_app.as_deref() == Some(source_app)
                && t.provenance.source_task_id.as_deref() == Some(source_task_id)
        })
    }
}

#[derive(Debug, Deserialize)]
struct StoreFile {
    tasks: Vec<Task>,
}

struct Subscriber {
    id: SubscriptionId,
    owner: String,
    listener: Listener,
}

/// JSON-file task store. `in_memory` stores are never written to disk.
pub struct Database {
    path: Option<PathBuf>,
    tasks: Vec<Task>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl Database {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let mut db = Database::in_memory();
        db.path = Some(path.to_path_buf());
        if !path.exists() {
            debug!(path = %path.display(), "no store file yet, starting empty");
            return Ok(db);
        }
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|source| TodoError::Io { path: path.to_path_buf(), source })?;
        let file: StoreFile = serde_json::from_str(&buf)
            .map_err(|source| TodoError::Json { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), tasks = file.tasks.len(), "loaded store");
        db.tasks = file.tasks;
        Ok(db)
    }

    pub fn in_memory() -> Self {
        Database {
            path: None,
            tasks: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Write the store using temp file + rename.
    fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let io_err = |source| TodoError::Io { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(&StoreFileRef { tasks: &self.tasks })
            .map_err(|source| TodoError::Json { path: path.to_path_buf(), source })?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    fn position_live(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id && !t.is_deleted())
            .ok_or_else(|| TodoError::not_found(id))
    }

    fn commit(&mut self, owner: &str) -> Result<()> {
        self.save()?;
        self.notify(owner);
        Ok(())
    }

    fn notify(&mut self, owner: &str) {
        if !self.subscribers.iter().any(|s| s.owner == owner) {
            return;
        }
        let snapshot = self.list(owner);
        for sub in self.subscribers.iter_mut().filter(|s| s.owner == owner) {
            (sub.listener)(&snapshot);
        }
    }
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    tasks: &'a [Task],
}

impl TaskStore for Database {
    fn create(&mut self, draft: TaskDraft, owner: &str, now: DateTime<Utc>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.tasks.push(draft.into_task(id.clone(), owner, now));
        info!(task = %id, "created task");
        self.commit(owner)?;
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Task> {
        let idx = self.position_live(id)?;
        Ok(self.tasks[idx].clone())
    }

    fn update(&mut self, id: &str, patch: TaskPatch, now: DateTime<Utc>) -> Result<Task> {
        let idx = self.position_live(id)?;
        let task = &mut self.tasks[idx];
        patch.apply(task);
        task.updated_at = now;
        let updated = task.clone();
        debug!(task = %id, "updated task");
        self.commit(&updated.owner_id)?;
        Ok(updated)
    }

    fn soft_delete(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let idx = self.position_live(id)?;
        let task = &mut self.tasks[idx];
        task.deleted_at = Some(now);
        task.updated_at = now;
        let owner = task.owner_id.clone();
        info!(task = %id, "deleted task");
        self.commit(&owner)
    }

    fn list(&self, owner: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner && !t.is_deleted())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        tasks
    }

    fn subscribe(&mut self, owner: &str, mut listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.list(owner));
        self.subscribers.push(Subscriber { id, owner: owner.to_string(), listener });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_list_is_owner_scoped_and_newest_first() {
        let mut db = Database::in_memory();
        let a = db.create(TaskDraft::new("a"), "me", t0()).unwrap();
        let b = db.create(TaskDraft::new("b"), "me", t0() + Duration::minutes(1)).unwrap();
        db.create(TaskDraft::new("other"), "you", t0()).unwrap();

        let ids: Vec<String> = db.list("me").into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.clone(), a.clone()]);

        db.update(&a, TaskPatch { priority: Some(2), ..Default::default() }, t0() + Duration::minutes(5))
            .unwrap();
        let ids: Vec<String> = db.list("me").into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_soft_delete_hides_everywhere() {
        let mut db = Database::in_memory();
        let id = db.create(TaskDraft::new("gone"), "me", t0()).unwrap();
        db.soft_delete(&id, t0()).unwrap();
        assert!(db.list("me").is_empty());
        assert!(matches!(db.get(&id), Err(TodoError::NotFound { .. })));
        assert!(matches!(
            db.update(&id, TaskPatch::default(), t0()),
            Err(TodoError::NotFound { .. })
        ));
        assert!(matches!(db.soft_delete(&id, t0()), Err(TodoError::NotFound { .. })));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut db = Database::in_memory();
        let err = db.update("missing", TaskPatch::default(), t0()).unwrap_err();
        assert_eq!(err.to_string(), "task 'missing' not found");
    }

    #[test]
    fn test_subscribers_see_each_change() {
        let mut db = Database::in_memory();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let sub = db.subscribe("me", Box::new(move |tasks| sink.borrow_mut().push(tasks.len())));

        let id = db.create(TaskDraft::new("one"), "me", t0()).unwrap();
        db.create(TaskDraft::new("not mine"), "you", t0()).unwrap();
        db.create(TaskDraft::new("two"), "me", t0()).unwrap();
        db.soft_delete(&id, t0()).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 1]);

        assert!(db.unsubscribe(sub));
        db.create(TaskDraft::new("three"), "me", t0()).unwrap();
        assert_eq!(seen.borrow().len(), 4);
        assert!(!db.unsubscribe(sub));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        let id = {
            let mut db = Database::open(&path).unwrap();
            let id = db.create(TaskDraft::new("persist me"), "me", t0()).unwrap();
            let dead = db.create(TaskDraft::new("drop me"), "me", t0()).unwrap();
            db.soft_delete(&dead, t0()).unwrap();
            id
        };
        let db = Database::open(&path).unwrap();
        let tasks = db.list("me");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert_eq!(tasks[0].description, "persist me");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Database::open(&path), Err(TodoError::Json { .. })));
    }
}
