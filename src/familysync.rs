//! Import of FamilySync task records.
//!
//! Records arrive as a JSON array exported from FamilySync. Each one maps to a
//! task tagged with `sourceApp = "familysync"` and the record id; importing the
//! same record again only syncs its completion status.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::TaskStore;
use crate::error::{Result, TodoError};
use crate::service::TaskService;
use crate::task::{Provenance, TaskDraft, FAMILYSYNC_SOURCE};

/// `status` value of a finished FamilySync task. Anything else is pending.
pub const STATUS_DONE: &str = "DONE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySyncRecord {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl FamilySyncRecord {
    pub fn is_done(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_DONE)
    }

    /// First non-blank of content, title and description.
    pub fn text(&self) -> Option<&str> {
        [&self.content, &self.title, &self.description]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    fn provenance(&self) -> Provenance {
        Provenance {
            source_app: Some(FAMILYSYNC_SOURCE.to_string()),
            source_task_id: Some(self.id.clone()),
            source_group_id: self.group_id.clone(),
            assignee_id: self.assignee_id.clone(),
            creator_id: self.creator_id.clone(),
        }
    }
}

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub created: usize,
    pub synced: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Read a JSON array of records from `path`.
pub fn load_records(path: &Path) -> Result<Vec<FamilySyncRecord>> {
    let data = fs::read_to_string(path)
        .map_err(|source| TodoError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&data).map_err(|source| TodoError::Json { path: path.to_path_buf(), source })
}

pub fn import_records<S: TaskStore>(
    service: &mut TaskService<S>,
    records: &[FamilySyncRecord],
    now: DateTime<Local>,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for record in records {
        if record.id.trim().is_empty() {
            warn!("skipping FamilySync record without id");
            report.skipped += 1;
            continue;
        }

        let existing = service
            .store()
            .find_by_source(service.owner(), FAMILYSYNC_SOURCE, &record.id);
        if let Some(task) = existing {
            if task.is_completed == record.is_done() {
                report.unchanged += 1;
            } else {
                service.sync_completion(&task.id, record.is_done(), now)?;
                debug!(task = %task.id, source = %record.id, done = record.is_done(), "synced status");
                report.synced += 1;
            }
            continue;
        }

        let Some(text) = record.text() else {
            warn!(source = %record.id, "skipping FamilySync record without text");
            report.skipped += 1;
            continue;
        };
        let mut draft = TaskDraft::new(text);
        draft.due_date = record.due_date;
        draft.provenance = record.provenance();
        let id = service.add(draft, now)?;
        if record.is_done() {
            service.sync_completion(&id, true, now)?;
        }
        debug!(task = %id, source = %record.id, "imported FamilySync task");
        report.created += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::db::Database;
    use crate::fields::Recurrence;
    use crate::task::TaskPatch;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap()
    }

    fn parse(json: &str) -> Vec<FamilySyncRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_record_text_fallbacks() {
        let records = parse(
            r#"[
                {"id": "a", "content": "Buy milk", "title": "ignored"},
                {"id": "b", "content": "  ", "title": "Walk dog"},
                {"id": "c", "description": "Pay rent", "status": "DONE"},
                {"id": "d"}
            ]"#,
        );
        let texts: Vec<Option<&str>> = records.iter().map(FamilySyncRecord::text).collect();
        assert_eq!(texts, vec![Some("Buy milk"), Some("Walk dog"), Some("Pay rent"), None]);
        assert!(records[2].is_done());
        assert!(!records[0].is_done());
    }

    #[test]
    fn test_import_creates_tagged_tasks() {
        let mut svc = TaskService::new(Database::in_memory(), "me");
        let records = parse(
            r#"[
                {"id": "fs-1", "content": "Buy milk", "status": "PENDING", "groupId": "home",
                 "assigneeId": "kid", "creatorId": "parent", "dueDate": "2026-10-21"},
                {"id": "fs-2", "title": "Fix bike", "status": "DONE"},
                {"id": "fs-3"},
                {"id": "", "content": "orphan"}
            ]"#,
        );
        let report = import_records(&mut svc, &records, now()).unwrap();
        assert_eq!(report, ImportReport { created: 2, synced: 0, unchanged: 0, skipped: 2 });

        let milk = svc.store().find_by_source("me", FAMILYSYNC_SOURCE, "fs-1").unwrap();
        assert!(milk.is_externally_sourced());
        assert_eq!(milk.provenance.source_group_id.as_deref(), Some("home"));
        assert_eq!(milk.provenance.assignee_id.as_deref(), Some("kid"));
        assert_eq!(milk.due_date, NaiveDate::from_ymd_opt(2026, 10, 21));
        assert!(!milk.is_completed);

        let bike = svc.store().find_by_source("me", FAMILYSYNC_SOURCE, "fs-2").unwrap();
        assert!(bike.is_completed);
    }

    #[test]
    fn test_reimport_is_idempotent_and_syncs_status() {
        let mut svc = TaskService::new(Database::in_memory(), "me");
        let first = parse(r#"[{"id": "fs-1", "content": "Buy milk", "status": "PENDING"}]"#);
        import_records(&mut svc, &first, now()).unwrap();

        let again = import_records(&mut svc, &first, now()).unwrap();
        assert_eq!(again, ImportReport { unchanged: 1, ..Default::default() });

        let done = parse(r#"[{"id": "fs-1", "content": "", "status": "DONE"}]"#);
        let report = import_records(&mut svc, &done, now()).unwrap();
        assert_eq!(report, ImportReport { synced: 1, ..Default::default() });

        let tasks = svc.tasks();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_completed);
        assert_eq!(tasks[0].description, "Buy milk");
    }

    #[test]
    fn test_reimporting_done_record_keeps_recurring_task_in_place() {
        let mut svc = TaskService::new(Database::in_memory(), "me");
        let pending = parse(r#"[{"id": "fs-1", "content": "Bins", "status": "PENDING"}]"#);
        import_records(&mut svc, &pending, now()).unwrap();

        let id = svc.store().find_by_source("me", FAMILYSYNC_SOURCE, "fs-1").unwrap().id;
        let due = NaiveDate::from_ymd_opt(2026, 10, 20);
        let patch = TaskPatch {
            is_recurring: Some(true),
            recurrence_type: Some(Some(Recurrence::Weekly)),
            due_date: Some(due),
            ..Default::default()
        };
        svc.edit(&id, patch, now()).unwrap();

        let done = parse(r#"[{"id": "fs-1", "content": "Bins", "status": "DONE"}]"#);
        let first = import_records(&mut svc, &done, now()).unwrap();
        assert_eq!(first, ImportReport { synced: 1, ..Default::default() });
        for _ in 0..2 {
            let report = import_records(&mut svc, &done, now()).unwrap();
            assert_eq!(report, ImportReport { unchanged: 1, ..Default::default() });
        }

        let task = svc.get(&id).unwrap();
        assert!(task.is_completed);
        assert_eq!(task.due_date, due);
    }

    #[test]
    fn test_load_records_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        fs::write(&path, r#"[{"id": "fs-1", "content": "Buy milk"}]"#).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 1);

        fs::write(&path, "{").unwrap();
        assert!(matches!(load_records(&path), Err(TodoError::Json { .. })));
        assert!(matches!(
            load_records(&dir.path().join("missing.json")),
            Err(TodoError::Io { .. })
        ));
    }
}
