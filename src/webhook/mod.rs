//! GitHub webhook ingestion and task-state synchronization.
//!
//! ## Overview
//!
//! GitHub posts `push` and `pull_request` deliveries to the server. Each
//! delivery is authenticated against the shared secret, logged once by its
//! delivery id, and then turned into a short list of guarded status updates
//! on the `tasks` table.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐  POST   ┌──────────────────────────────────────────────────┐
//! │  GitHub  │ ──────> │  server.rs  (axum Router, layers, shutdown)      │
//! └──────────┘         │    └─ api.rs  (handlers, AppState, ApiError)     │
//!                      │         │                                        │
//!                      │         │ SignatureVerifier::verify()            │
//!                      │         v                                        │
//!                      │  engine.rs  (process_delivery, plan_*)           │
//!                      │         │                                        │
//!                      │         │ SyncDb::apply_transition()             │
//!                      │         v                                        │
//!                      │  db.rs  (SyncDb, DbHandle)                       │
//!                      └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module      | Responsibility                                           |
//! |-------------|----------------------------------------------------------|
//! | `signature` | HMAC-SHA256 check of `X-Hub-Signature-256`               |
//! | `events`    | Serde views of the push and pull_request payloads        |
//! | `refs`      | Task ids and merged branch names from commit messages    |
//! | `branch`    | Branch normalization and ancestor-prefix matching        |
//! | `models`    | `Task`, `TaskStatus`, `Transition`, `WebhookOutcome`     |
//!
//! ## Delivery Flow
//!
//! 1. `POST /webhooks/github` → `api::github_webhook()`
//! 2. Headers are required, the body is capped and its signature verified.
//! 3. `engine::process_delivery()` records the delivery id; a repeat id
//!    returns `{"duplicate": true}` without touching tasks.
//! 4. The payload is decoded and planned into `UpdatePass` values, which
//!    run in order against the store. The summed row count is returned.

pub mod api;
pub mod branch;
pub mod db;
pub mod engine;
pub mod events;
pub mod models;
pub mod refs;
pub mod server;
pub mod signature;
