//! Turns parsed deliveries into guarded task updates.
//!
//! Planning is pure: `plan_push` and `plan_pull_request` map an event to a
//! list of [`UpdatePass`]es. Execution runs each pass as one `UPDATE`
//! statement and sums the affected rows. Passes are not wrapped in a shared
//! transaction; a failure stops the remaining passes while earlier ones stay
//! committed. Every pass is guarded by prior status, so a redelivered event
//! that slips past deduplication changes nothing a second time.
//!
//! Rules:
//!
//! | Event                          | Pass                                        | Transition          |
//! |--------------------------------|---------------------------------------------|---------------------|
//! | push, non-default branch       | hints containing the branch                 | todo → in_progress  |
//! | push, default branch           | `#N` / `task:N` ids from commit messages    | → done              |
//! | push, default branch           | hints equal to a merged branch or ancestor  | → done              |
//! | push, default branch           | hints containing the pushed branch          | → done              |
//! | pull_request closed + merged   | hints containing the head branch            | → done              |

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::branch;
use super::db::SyncDb;
use super::events::{PullRequestEvent, PushEvent, WebhookEvent};
use super::models::{TaskSelector, Transition, UpdatePass, WebhookOutcome};
use super::refs::{extract_merge_branches, extract_task_refs};
use crate::errors::SyncError;

/// An authenticated delivery, ready for deduplication.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: String,
    pub event_type: String,
    pub body: Vec<u8>,
}

/// Record, parse, and apply one delivery.
///
/// The delivery id is logged before the payload is decoded, so a delivery
/// that fails to parse is still remembered and a redelivery under the same
/// id reports `duplicate`.
pub fn process_delivery(
    db: &SyncDb,
    delivery: &Delivery,
    now: DateTime<Utc>,
) -> Result<WebhookOutcome, SyncError> {
    let now = now.to_rfc3339();
    let inserted = db
        .record_delivery(&delivery.id, &delivery.event_type, &delivery.body, &now)
        .map_err(SyncError::DeliveryLog)?;
    if !inserted {
        debug!(delivery_id = %delivery.id, "Duplicate delivery");
        return Ok(WebhookOutcome::Duplicate { duplicate: true });
    }

    let event = WebhookEvent::parse(&delivery.event_type, &delivery.body).map_err(|source| {
        SyncError::InvalidPayload {
            event: delivery.event_type.clone(),
            source,
        }
    })?;

    let passes = match &event {
        WebhookEvent::Push(push) => plan_push(push),
        WebhookEvent::PullRequest(pr) => plan_pull_request(pr),
        WebhookEvent::Other(name) => {
            return Ok(WebhookOutcome::Ignored {
                ignored_event: name.clone(),
            });
        }
    };

    let updated = apply_passes(db, &passes, &now)?;
    Ok(WebhookOutcome::Applied {
        updated,
        event: event.name().to_string(),
    })
}

/// Execute passes in order and return the summed affected-row count.
///
/// Counts are not deduplicated across passes.
pub fn apply_passes(db: &SyncDb, passes: &[UpdatePass], now: &str) -> Result<i64, SyncError> {
    let mut total: i64 = 0;
    for pass in passes {
        match db.apply_transition(&pass.selector, &pass.transition, now) {
            Ok(changed) => {
                debug!(
                    repo = pass.selector.repo(),
                    to = pass.transition.to.as_str(),
                    changed,
                    "Applied update pass"
                );
                total += changed as i64;
            }
            Err(source) => {
                warn!(committed = total, error = %source, "Update pass failed");
                return Err(SyncError::Transition {
                    committed: total,
                    source,
                });
            }
        }
    }
    Ok(total)
}

pub fn plan_push(event: &PushEvent) -> Vec<UpdatePass> {
    let repo = event.repository.full_name.trim();
    let Some(pushed) = branch::branch_from_ref(&event.git_ref) else {
        return Vec::new();
    };
    if repo.is_empty() {
        return Vec::new();
    }
    let containing_hints = branch::ancestor_prefixes(pushed);

    if !branch::is_default_branch(pushed, &event.repository.default_branch) {
        return vec![UpdatePass {
            selector: TaskSelector::BranchHints {
                repo: repo.to_string(),
                hints: containing_hints,
            },
            transition: Transition::start(),
        }];
    }

    let mut passes = Vec::with_capacity(3);

    let mut ids: Vec<i64> = Vec::new();
    for commit in &event.commits {
        for id in extract_task_refs(&commit.message) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    if !ids.is_empty() {
        passes.push(UpdatePass {
            selector: TaskSelector::Ids {
                repo: repo.to_string(),
                ids,
            },
            transition: Transition::complete(),
        });
    }

    let merged_prefixes = branch::unique_normalized(
        event
            .commits
            .iter()
            .flat_map(|c| extract_merge_branches(&c.message))
            .flat_map(|b| branch::ancestor_prefixes(&b)),
    );
    if !merged_prefixes.is_empty() {
        passes.push(UpdatePass {
            selector: TaskSelector::BranchHints {
                repo: repo.to_string(),
                hints: merged_prefixes,
            },
            transition: Transition::complete(),
        });
    }

    passes.push(UpdatePass {
        selector: TaskSelector::BranchHints {
            repo: repo.to_string(),
            hints: containing_hints,
        },
        transition: Transition::complete(),
    });
    passes
}

pub fn plan_pull_request(event: &PullRequestEvent) -> Vec<UpdatePass> {
    if !event.is_merged_close() {
        return Vec::new();
    }
    let repo = event.repository.full_name.trim();
    let base = event.pull_request.base.name.trim();
    let head = event.pull_request.head.name.trim();
    if repo.is_empty() || base.is_empty() || head.is_empty() {
        return Vec::new();
    }
    // Without a known default branch any base counts.
    let default_branch = event.repository.default_branch.trim();
    if !default_branch.is_empty() && !branch::is_default_branch(base, default_branch) {
        return Vec::new();
    }

    vec![UpdatePass {
        selector: TaskSelector::BranchHints {
            repo: repo.to_string(),
            hints: branch::ancestor_prefixes(head),
        },
        transition: Transition::complete(),
    }]
}
