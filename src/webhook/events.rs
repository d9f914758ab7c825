//! Typed views of the GitHub webhook payloads the engine acts on.
//!
//! Only the fields the transition rules need are decoded. Missing fields
//! default to empty values so partial payloads still parse.

use serde::Deserialize;

pub const EVENT_PUSH: &str = "push";
pub const EVENT_PULL_REQUEST: &str = "pull_request";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Repository {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub default_branch: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Commit {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PushEvent {
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GitRef {
    #[serde(rename = "ref", default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PullRequest {
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub base: GitRef,
    #[serde(default)]
    pub head: GitRef,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PullRequestEvent {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub repository: Repository,
    #[serde(default)]
    pub pull_request: PullRequest,
}

impl PullRequestEvent {
    pub fn is_merged_close(&self) -> bool {
        self.action == "closed" && self.pull_request.merged
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
    /// Any other event type, passed through by name.
    Other(String),
}

impl WebhookEvent {
    /// Decode `body` according to the `X-GitHub-Event` type.
    ///
    /// Unrecognized types never fail; their body is not inspected.
    pub fn parse(event_type: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        match event_type {
            EVENT_PUSH => Ok(Self::Push(serde_json::from_slice(body)?)),
            EVENT_PULL_REQUEST => Ok(Self::PullRequest(serde_json::from_slice(body)?)),
            other => Ok(Self::Other(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Push(_) => EVENT_PUSH,
            Self::PullRequest(_) => EVENT_PULL_REQUEST,
            Self::Other(name) => name,
        }
    }
}
