use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, params, params_from_iter, types::Value};

use super::branch;
use super::models::*;

/// Gap between consecutive task positions in one scope.
pub const POSITION_STEP: f64 = 1000.0;

/// Async-safe handle to the sync database.
///
/// Wraps `SyncDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, keeping synchronous SQLite I/O
/// off the async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<SyncDb>>,
}

impl DbHandle {
    pub fn new(db: SyncDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&SyncDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct SyncDb {
    conn: Connection,
}

impl SyncDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .context("Failed to configure connection")?;
        self.register_functions()
            .context("Failed to register SQL functions")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    /// `branch_norm(x)` applies `branch::normalize` inside SQL, so stored hints
    /// and incoming branch names are folded by the same code.
    fn register_functions(&self) -> Result<()> {
        self.conn.create_scalar_function(
            "branch_norm",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|v| branch::normalize(&v)))
            },
        )?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS webhook_deliveries (
                    delivery_id TEXT PRIMARY KEY NOT NULL,
                    event_type TEXT NOT NULL,
                    raw_payload BLOB NOT NULL,
                    received_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'todo'
                        CHECK (status IN ('todo', 'in_progress', 'done')),
                    position REAL NOT NULL DEFAULT 1000,
                    creator_id INTEGER NOT NULL,
                    project_id INTEGER,
                    repo_full_name TEXT,
                    branch_hint TEXT,
                    started_at TEXT,
                    completed_at TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_repo_status ON tasks(repo_full_name, status);
                CREATE INDEX IF NOT EXISTS idx_tasks_position ON tasks(creator_id, status, position);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    /// Cheap liveness probe used by the health endpoint.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Database ping failed")?;
        Ok(())
    }

    // ── Delivery log ──────────────────────────────────────────────────

    /// Append a delivery to the log. Returns `false` when `delivery_id` was
    /// already recorded, in which case nothing is written.
    pub fn record_delivery(
        &self,
        delivery_id: &str,
        event_type: &str,
        raw_payload: &[u8],
        received_at: &str,
    ) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO webhook_deliveries (delivery_id, event_type, raw_payload, received_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(delivery_id) DO NOTHING",
                params![delivery_id, event_type, raw_payload, received_at],
            )
            .context("Failed to record webhook delivery")?;
        Ok(inserted == 1)
    }

    pub fn get_delivery(&self, delivery_id: &str) -> Result<Option<WebhookDelivery>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT delivery_id, event_type, raw_payload, received_at
                 FROM webhook_deliveries WHERE delivery_id = ?1",
            )
            .context("Failed to prepare get_delivery")?;
        let mut rows = stmt
            .query_map(params![delivery_id], |row| {
                Ok(WebhookDelivery {
                    delivery_id: row.get(0)?,
                    event_type: row.get(1)?,
                    raw_payload: row.get(2)?,
                    received_at: row.get(3)?,
                })
            })
            .context("Failed to query delivery")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read delivery row")?)),
            None => Ok(None),
        }
    }

    pub fn count_deliveries(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM webhook_deliveries", [], |row| row.get(0))
            .context("Failed to count deliveries")
    }

    // ── Transitions ───────────────────────────────────────────────────

    /// Apply one guarded, set-based status update and return the number of
    /// rows it changed.
    ///
    /// Only rows of `selector`'s repository whose current status is one of
    /// `transition.from` are touched, so re-applying a pass is a no-op.
    pub fn apply_transition(
        &self,
        selector: &TaskSelector,
        transition: &Transition,
        now: &str,
    ) -> Result<usize> {
        if selector.is_empty() || transition.from.is_empty() {
            return Ok(0);
        }

        let mut args: Vec<Value> = vec![
            Value::Text(transition.to.as_str().to_string()),
            Value::Text(now.to_string()),
            Value::Text(selector.repo().to_string()),
        ];

        let mut set = vec!["status = ?1".to_string(), "updated_at = ?2".to_string()];
        if transition.started_at == TimestampPolicy::SetIfNull {
            set.push("started_at = COALESCE(started_at, ?2)".to_string());
        }
        if transition.completed_at == TimestampPolicy::SetIfNull {
            set.push("completed_at = COALESCE(completed_at, ?2)".to_string());
        }

        let from = placeholders(
            &mut args,
            transition
                .from
                .iter()
                .map(|s| Value::Text(s.as_str().to_string())),
        );
        let target = match selector {
            TaskSelector::Ids { ids, .. } => {
                let list = placeholders(&mut args, ids.iter().map(|id| Value::Integer(*id)));
                format!("id IN ({})", list)
            }
            TaskSelector::BranchHints { hints, .. } => {
                let list = placeholders(&mut args, hints.iter().map(|h| Value::Text(h.clone())));
                format!(
                    "branch_norm(branch_hint) <> '' AND branch_norm(branch_hint) IN ({})",
                    list
                )
            }
        };

        let sql = format!(
            "UPDATE tasks SET {} WHERE repo_full_name = ?3 AND status IN ({}) AND {}",
            set.join(", "),
            from,
            target
        );
        let changed = self
            .conn
            .execute(&sql, params_from_iter(args))
            .with_context(|| format!("Failed to move tasks to {}", transition.to.as_str()))?;
        Ok(changed)
    }

    // ── Task rows ─────────────────────────────────────────────────────

    /// Insert a task, placing it `POSITION_STEP` after the current maximum
    /// position in its scope (status + creator, and project when set) unless
    /// an explicit position is given.
    pub fn create_task(&self, task: &NewTask, now: &str) -> Result<Task> {
        let position = match task.position {
            Some(p) => p,
            None => {
                let max_pos: f64 = self
                    .conn
                    .query_row(
                        "SELECT COALESCE(MAX(position), 0) FROM tasks
                         WHERE status = ?1 AND creator_id = ?2
                           AND (?3 IS NULL OR project_id = ?3)",
                        params![task.status.as_str(), task.creator_id, task.project_id],
                        |row| row.get(0),
                    )
                    .context("Failed to get max position")?;
                max_pos + POSITION_STEP
            }
        };
        let started_at = (task.status == TaskStatus::InProgress).then_some(now);
        let completed_at = (task.status == TaskStatus::Done).then_some(now);

        self.conn
            .execute(
                "INSERT INTO tasks (title, status, position, creator_id, project_id, repo_full_name,
                                    branch_hint, started_at, completed_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    task.title,
                    task.status.as_str(),
                    position,
                    task.creator_id,
                    task.project_id,
                    task.repo_full_name,
                    task.branch_hint,
                    started_at,
                    completed_at,
                    now,
                ],
            )
            .context("Failed to insert task")?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.context("Task not found after insert")
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare get_task")?;
        let mut rows = stmt
            .query_map(params![id], TaskRow::from_row)
            .context("Failed to query task")?;
        match rows.next() {
            Some(row) => {
                let r = row.context("Failed to read task row")?;
                Ok(Some(r.into_task()?))
            }
            None => Ok(None),
        }
    }

    /// All tasks, optionally restricted to one repository, in board order.
    pub fn list_tasks(&self, repo: Option<&str>) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE (?1 IS NULL OR repo_full_name = ?1)
             ORDER BY status, position, id",
            TASK_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_tasks")?;
        let rows = stmt
            .query_map(params![repo], TaskRow::from_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            let r = row.context("Failed to read task row")?;
            tasks.push(r.into_task()?);
        }
        Ok(tasks)
    }

    #[cfg(test)]
    pub(crate) fn insert_task_with_id(&self, id: i64, task: &NewTask, now: &str) -> Result<Task> {
        let created = self.create_task(task, now)?;
        self.conn
            .execute(
                "UPDATE tasks SET id = ?1 WHERE id = ?2",
                params![id, created.id],
            )
            .context("Failed to renumber task")?;
        self.get_task(id)?.context("Task not found after renumber")
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Append `values` to `args` and return their `?N` placeholders.
fn placeholders(args: &mut Vec<Value>, values: impl Iterator<Item = Value>) -> String {
    let mut marks = Vec::new();
    for value in values {
        args.push(value);
        marks.push(format!("?{}", args.len()));
    }
    marks.join(", ")
}

const TASK_COLUMNS: &str = "id, title, status, position, creator_id, project_id, repo_full_name, \
     branch_hint, started_at, completed_at, created_at, updated_at";

/// Intermediate row struct for tasks.
struct TaskRow {
    id: i64,
    title: String,
    status: String,
    position: f64,
    creator_id: i64,
    project_id: Option<i64>,
    repo_full_name: Option<String>,
    branch_hint: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            status: row.get(2)?,
            position: row.get(3)?,
            creator_id: row.get(4)?,
            project_id: row.get(5)?,
            repo_full_name: row.get(6)?,
            branch_hint: row.get(7)?,
            started_at: row.get(8)?,
            completed_at: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_task(self) -> Result<Task> {
        let status = TaskStatus::from_str(&self.status)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to parse task status")?;
        Ok(Task {
            id: self.id,
            title: self.title,
            status,
            position: self.position,
            creator_id: self.creator_id,
            project_id: self.project_id,
            repo_full_name: self.repo_full_name,
            branch_hint: self.branch_hint,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const T0: &str = "2026-01-01T00:00:00+00:00";
    const T1: &str = "2026-01-02T00:00:00+00:00";

    fn hints(repo: &str, list: &[&str]) -> TaskSelector {
        TaskSelector::BranchHints {
            repo: repo.to_string(),
            hints: list.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[test]
    fn test_create_database_and_run_migrations() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let table_count: i32 = db.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('tasks', 'webhook_deliveries')",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(table_count, 2, "Expected 2 tables to exist");
        db.ping()?;
        Ok(())
    }

    #[test]
    fn test_migrations_are_rerunnable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sync.db");
        {
            let db = SyncDb::new(&path)?;
            db.record_delivery("d-1", "push", b"{}", T0)?;
        }
        let db = SyncDb::new(&path)?;
        assert_eq!(db.count_deliveries()?, 1);
        Ok(())
    }

    #[test]
    fn test_record_delivery_is_insert_once() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        assert!(db.record_delivery("abc", "push", br#"{"a":1}"#, T0)?);
        assert!(!db.record_delivery("abc", "push", br#"{"a":2}"#, T1)?);
        assert_eq!(db.count_deliveries()?, 1);

        let stored = db.get_delivery("abc")?.expect("delivery should exist");
        assert_eq!(stored.raw_payload, br#"{"a":1}"#.to_vec());
        assert_eq!(stored.received_at, T0);
        assert!(db.get_delivery("missing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_create_task_positions_step_by_scope() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let a = db.create_task(&NewTask::new("a", 1), T0)?;
        let b = db.create_task(&NewTask::new("b", 1), T0)?;
        let other_creator = db.create_task(&NewTask::new("c", 2), T0)?;
        let other_status =
            db.create_task(&NewTask::new("d", 1).with_status(TaskStatus::InProgress), T0)?;

        assert_eq!(a.position, 1000.0);
        assert_eq!(b.position, 2000.0);
        assert_eq!(other_creator.position, 1000.0);
        assert_eq!(other_status.position, 1000.0);
        Ok(())
    }

    #[test]
    fn test_create_task_respects_project_scope_and_explicit_position() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        db.create_task(&NewTask::new("loose", 1), T0)?;
        let mut in_project = NewTask::new("p", 1);
        in_project.project_id = Some(7);
        let first = db.create_task(&in_project, T0)?;
        assert_eq!(first.position, 1000.0);

        let mut pinned = NewTask::new("pinned", 1);
        pinned.position = Some(1500.5);
        assert_eq!(db.create_task(&pinned, T0)?.position, 1500.5);
        Ok(())
    }

    #[test]
    fn test_create_task_stamps_initial_timestamps() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let todo = db.create_task(&NewTask::new("t", 1), T0)?;
        assert!(todo.started_at.is_none() && todo.completed_at.is_none());

        let started =
            db.create_task(&NewTask::new("s", 1).with_status(TaskStatus::InProgress), T0)?;
        assert_eq!(started.started_at.as_deref(), Some(T0));
        assert!(started.completed_at.is_none());

        let done = db.create_task(&NewTask::new("d", 1).with_status(TaskStatus::Done), T0)?;
        assert_eq!(done.completed_at.as_deref(), Some(T0));
        Ok(())
    }

    #[test]
    fn test_start_transition_only_moves_todo() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let todo = db.create_task(&NewTask::new("a", 1).in_repo("o/r", "feature"), T0)?;
        let done = db.create_task(
            &NewTask::new("b", 1)
                .in_repo("o/r", "feature")
                .with_status(TaskStatus::Done),
            T0,
        )?;

        let changed = db.apply_transition(&hints("o/r", &["feature"]), &Transition::start(), T1)?;
        assert_eq!(changed, 1);

        let todo = db.get_task(todo.id)?.unwrap();
        assert_eq!(todo.status, TaskStatus::InProgress);
        assert_eq!(todo.started_at.as_deref(), Some(T1));
        assert_eq!(todo.updated_at, T1);

        let done = db.get_task(done.id)?.unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(done.updated_at, T0);
        Ok(())
    }

    #[test]
    fn test_started_at_is_never_reset() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let task = db.create_task(&NewTask::new("a", 1).in_repo("o/r", "feature"), T0)?;
        db.apply_transition(&hints("o/r", &["feature"]), &Transition::start(), T0)?;
        // Simulate an external move back to todo.
        db.conn.execute(
            "UPDATE tasks SET status = 'todo' WHERE id = ?1",
            params![task.id],
        )?;
        db.apply_transition(&hints("o/r", &["feature"]), &Transition::start(), T1)?;
        let task = db.get_task(task.id)?.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.started_at.as_deref(), Some(T0));
        Ok(())
    }

    #[test]
    fn test_hint_matching_is_case_and_whitespace_insensitive() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let task = db.create_task(&NewTask::new("a", 1).in_repo("o/r", "  Feature "), T0)?;
        let blank = db.create_task(&NewTask::new("b", 1).in_repo("o/r", "   "), T0)?;
        let changed = db.apply_transition(&hints("o/r", &["feature", ""]), &Transition::start(), T1)?;
        assert_eq!(changed, 1);
        assert_eq!(db.get_task(task.id)?.unwrap().status, TaskStatus::InProgress);
        assert_eq!(db.get_task(blank.id)?.unwrap().status, TaskStatus::Todo);
        Ok(())
    }

    #[test]
    fn test_hint_matching_folds_tabs_and_unicode_case() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let tabbed = db.create_task(&NewTask::new("a", 1).in_repo("o/r", "feature\t"), T0)?;
        let umlaut = db.create_task(&NewTask::new("b", 1).in_repo("o/r", "\u{a0}Überfix\n"), T0)?;
        let changed = db.apply_transition(
            &hints("o/r", &["feature", "überfix"]),
            &Transition::start(),
            T1,
        )?;
        assert_eq!(changed, 2);
        assert_eq!(db.get_task(tabbed.id)?.unwrap().status, TaskStatus::InProgress);
        assert_eq!(db.get_task(umlaut.id)?.unwrap().status, TaskStatus::InProgress);
        Ok(())
    }

    #[test]
    fn test_branch_norm_matches_rust_normalize() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        for raw in ["  Feature\t", "ÜBERFIX/X", "\u{3000}main\r\n"] {
            let folded: String =
                db.conn
                    .query_row("SELECT branch_norm(?1)", params![raw], |row| row.get(0))?;
            assert_eq!(folded, branch::normalize(raw));
        }
        let null: Option<String> =
            db.conn
                .query_row("SELECT branch_norm(NULL)", [], |row| row.get(0))?;
        assert!(null.is_none());
        Ok(())
    }

    #[test]
    fn test_raw_payload_is_stored_byte_exact() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let body = [0xff, 0xfe, b'{', b'}', 0x80];
        db.record_delivery("bin", "star", &body, T0)?;
        let stored = db.get_delivery("bin")?.expect("delivery should exist");
        assert_eq!(stored.raw_payload, body.to_vec());
        Ok(())
    }

    #[test]
    fn test_complete_transition_is_first_write_wins() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let task = db.create_task(&NewTask::new("a", 1).in_repo("o/r", "x"), T0)?;
        let selector = TaskSelector::Ids {
            repo: "o/r".into(),
            ids: vec![task.id],
        };

        assert_eq!(db.apply_transition(&selector, &Transition::complete(), T0)?, 1);
        assert_eq!(db.apply_transition(&selector, &Transition::complete(), T1)?, 0);

        let task = db.get_task(task.id)?.unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at.as_deref(), Some(T0));
        assert_eq!(task.updated_at, T0);
        Ok(())
    }

    #[test]
    fn test_complete_preserves_existing_completed_at() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let task = db.create_task(&NewTask::new("a", 1).in_repo("o/r", "x"), T0)?;
        // A stale value left behind by an external writer wins over `now`.
        db.conn.execute(
            "UPDATE tasks SET completed_at = ?1 WHERE id = ?2",
            params!["2025-06-01T00:00:00+00:00", task.id],
        )?;
        let selector = TaskSelector::Ids {
            repo: "o/r".into(),
            ids: vec![task.id],
        };
        db.apply_transition(&selector, &Transition::complete(), T1)?;
        let task = db.get_task(task.id)?.unwrap();
        assert_eq!(task.completed_at.as_deref(), Some("2025-06-01T00:00:00+00:00"));
        Ok(())
    }

    #[test]
    fn test_ids_selector_is_scoped_to_repo() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let mine = db.insert_task_with_id(42, &NewTask::new("a", 1).in_repo("o/r", ""), T0)?;
        let theirs = db.insert_task_with_id(43, &NewTask::new("b", 1).in_repo("x/y", ""), T0)?;
        let selector = TaskSelector::Ids {
            repo: "o/r".into(),
            ids: vec![42, 43],
        };
        assert_eq!(db.apply_transition(&selector, &Transition::complete(), T1)?, 1);
        assert_eq!(db.get_task(mine.id)?.unwrap().status, TaskStatus::Done);
        assert_eq!(db.get_task(theirs.id)?.unwrap().status, TaskStatus::Todo);
        Ok(())
    }

    #[test]
    fn test_empty_selector_touches_nothing() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        db.create_task(&NewTask::new("a", 1).in_repo("o/r", "x"), T0)?;
        let selector = TaskSelector::Ids {
            repo: "o/r".into(),
            ids: vec![],
        };
        assert_eq!(db.apply_transition(&selector, &Transition::complete(), T1)?, 0);
        Ok(())
    }

    #[test]
    fn test_list_tasks_filters_by_repo() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        db.create_task(&NewTask::new("a", 1).in_repo("o/r", "x"), T0)?;
        db.create_task(&NewTask::new("b", 1).in_repo("o/r", "y"), T0)?;
        db.create_task(&NewTask::new("c", 1).in_repo("x/y", "z"), T0)?;
        assert_eq!(db.list_tasks(Some("o/r"))?.len(), 2);
        assert_eq!(db.list_tasks(None)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_unknown_status_in_row_is_error() -> Result<()> {
        let db = SyncDb::new_in_memory()?;
        let task = db.create_task(&NewTask::new("a", 1), T0)?;
        // Bypass the CHECK constraint to simulate a foreign writer.
        db.conn.execute_batch("PRAGMA ignore_check_constraints = ON;")?;
        db.conn.execute(
            "UPDATE tasks SET status = 'archived' WHERE id = ?1",
            params![task.id],
        )?;
        assert!(db.get_task(task.id).is_err());
        Ok(())
    }
}
