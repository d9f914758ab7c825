use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    /// Accepts the legacy `completed` spelling as an alias for `done`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" | "completed" => Ok(Self::Done),
            other => Err(format!("Invalid task status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub position: f64,
    pub creator_id: i64,
    pub project_id: Option<i64>,
    pub repo_full_name: Option<String>,
    pub branch_hint: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a task. Position is computed when not given.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub position: Option<f64>,
    pub creator_id: i64,
    pub project_id: Option<i64>,
    pub repo_full_name: Option<String>,
    pub branch_hint: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, creator_id: i64) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Todo,
            position: None,
            creator_id,
            project_id: None,
            repo_full_name: None,
            branch_hint: None,
        }
    }

    pub fn in_repo(mut self, repo: impl Into<String>, branch_hint: impl Into<String>) -> Self {
        self.repo_full_name = Some(repo.into());
        self.branch_hint = Some(branch_hint.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// One row of the append-only delivery log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub delivery_id: String,
    pub event_type: String,
    /// Request body exactly as received.
    pub raw_payload: Vec<u8>,
    pub received_at: String,
}

// ── Transitions ───────────────────────────────────────────────────────

/// How a transition treats a nullable timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Leave the column untouched.
    Keep,
    /// `COALESCE(column, now)`: the first write wins.
    SetIfNull,
}

/// A guarded status change: rows whose current status is in `from` move to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: TaskStatus,
    pub from: &'static [TaskStatus],
    pub started_at: TimestampPolicy,
    pub completed_at: TimestampPolicy,
}

impl Transition {
    /// todo → in_progress, stamping `started_at` the first time.
    pub fn start() -> Self {
        Self {
            to: TaskStatus::InProgress,
            from: &[TaskStatus::Todo],
            started_at: TimestampPolicy::SetIfNull,
            completed_at: TimestampPolicy::Keep,
        }
    }

    /// todo | in_progress → done, stamping `completed_at` the first time.
    pub fn complete() -> Self {
        Self {
            to: TaskStatus::Done,
            from: &[TaskStatus::Todo, TaskStatus::InProgress],
            started_at: TimestampPolicy::Keep,
            completed_at: TimestampPolicy::SetIfNull,
        }
    }
}

/// Which rows of one repository a pass targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSelector {
    /// Explicit task ids referenced from commit messages.
    Ids { repo: String, ids: Vec<i64> },
    /// Tasks whose normalized branch hint equals one of `hints`.
    /// Hints must already be lowercased and trimmed.
    BranchHints { repo: String, hints: Vec<String> },
}

impl TaskSelector {
    pub fn repo(&self) -> &str {
        match self {
            Self::Ids { repo, .. } | Self::BranchHints { repo, .. } => repo,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Ids { ids, .. } => ids.is_empty(),
            Self::BranchHints { hints, .. } => hints.is_empty(),
        }
    }
}

/// One set-based update issued against the task table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePass {
    pub selector: TaskSelector,
    pub transition: Transition,
}

/// Success payload returned inside the `{"data": ...}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WebhookOutcome {
    Applied { updated: i64, event: String },
    Ignored { ignored_event: String },
    Duplicate { duplicate: bool },
}
