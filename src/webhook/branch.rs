//! Hierarchical branch-name matching.
//!
//! A branch hint `H` contains a branch `B` when `B == H` or `B` starts with
//! `H + "/"`, so the hint `feature` covers `feature/login` and
//! `feature/login/v2`. Every comparison lowercases and trims both sides.

use std::collections::HashSet;

/// Lowercase and trim a branch name or hint.
pub fn normalize(branch: &str) -> String {
    branch.trim().to_lowercase()
}

/// Every ancestor path of `branch`, shortest first, ending with the branch
/// itself: `feature/x/y` → `feature`, `feature/x`, `feature/x/y`.
///
/// These are exactly the hints that contain `branch`. Leading and trailing
/// slashes are ignored; the result is normalized.
pub fn ancestor_prefixes(branch: &str) -> Vec<String> {
    let branch = normalize(branch);
    let branch = branch.trim_matches('/');
    if branch.is_empty() {
        return Vec::new();
    }
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for segment in branch.split('/') {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Normalize, drop blanks, and deduplicate while keeping first-seen order.
pub fn unique_normalized<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let name = normalize(name.as_ref());
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

/// Branch name carried by a push `ref`.
///
/// `refs/heads/<name>` yields `<name>`; a bare name is returned as-is; tags
/// and other `refs/` namespaces yield `None`.
pub fn branch_from_ref(git_ref: &str) -> Option<&str> {
    let git_ref = git_ref.trim();
    let branch = match git_ref.strip_prefix("refs/heads/") {
        Some(name) => name,
        None if git_ref.starts_with("refs/") => return None,
        None => git_ref,
    };
    (!branch.is_empty()).then_some(branch)
}

/// Whether `branch` is the repository's default branch.
///
/// An unknown (empty) default branch matches nothing.
pub fn is_default_branch(branch: &str, default_branch: &str) -> bool {
    let default_branch = normalize(default_branch);
    !default_branch.is_empty() && normalize(branch) == default_branch
}
