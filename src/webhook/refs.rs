//! Commit-message scanning for task references and merge-commit branches.

use std::sync::LazyLock;

use regex::Regex;

/// `#42`, `task:42`, `Task: 42`.
static TASK_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:#|task:)\s*(\d+)").expect("valid task ref regex"));

/// `Merge pull request #12 from owner/feature/login` captures `feature/login`.
static MERGE_PR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Merge pull request #\d+ from [^/\s]+/(\S+)").expect("valid merge PR regex")
});

/// `Merge branch 'feature/x'` and `Merge remote-tracking branch "origin/x"`.
static MERGE_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Merge (?:remote-tracking )?branch ['"]([^'"]+)['"]"#)
        .expect("valid merge branch regex")
});

/// Task ids explicitly referenced in one commit message, in order of
/// appearance. Digit runs that do not fit an `i64` are skipped.
pub fn extract_task_refs(message: &str) -> Vec<i64> {
    TASK_REF
        .captures_iter(message)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .collect()
}

/// Branch names mentioned by a merge commit message.
///
/// At most one name per pattern: the pull-request form first, then the
/// `Merge branch '…'` form.
pub fn extract_merge_branches(message: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(2);
    for pattern in [&*MERGE_PR, &*MERGE_BRANCH] {
        if let Some(branch) = pattern.captures(message).and_then(|caps| caps.get(1)) {
            out.push(branch.as_str().to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_reference() {
        assert_eq!(extract_task_refs("fixes #42"), vec![42]);
    }

    #[test]
    fn test_task_prefix_is_case_insensitive() {
        assert_eq!(extract_task_refs("TASK:7 and Task: 8"), vec![7, 8]);
    }

    #[test]
    fn test_multiple_references_in_order() {
        assert_eq!(
            extract_task_refs("closes #3, #1 and task:2"),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_no_references() {
        assert!(extract_task_refs("refactor parser").is_empty());
        assert!(extract_task_refs("# heading without digits").is_empty());
    }

    #[test]
    fn test_overflowing_reference_skipped() {
        assert_eq!(
            extract_task_refs("#99999999999999999999999 and #5"),
            vec![5]
        );
    }

    #[test]
    fn test_merge_pull_request_branch() {
        assert_eq!(
            extract_merge_branches("Merge pull request #12 from octo/feature/login\n\nAdd login"),
            vec!["feature/login"]
        );
    }

    #[test]
    fn test_merge_branch_quoted() {
        assert_eq!(
            extract_merge_branches("Merge branch 'feature/x'"),
            vec!["feature/x"]
        );
        assert_eq!(
            extract_merge_branches("merge remote-tracking branch \"origin/hotfix\""),
            vec!["origin/hotfix"]
        );
    }

    #[test]
    fn test_plain_commit_mentions_no_branch() {
        assert!(extract_merge_branches("Fix the merge logic").is_empty());
    }

    #[test]
    fn test_merge_pr_message_also_yields_task_ref() {
        // The PR number itself reads as a task reference.
        let msg = "Merge pull request #12 from octo/feature/login";
        assert_eq!(extract_task_refs(msg), vec![12]);
        assert_eq!(extract_merge_branches(msg), vec!["feature/login"]);
    }
}
