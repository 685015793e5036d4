// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue discovery: reading, parsing and grouping the input Markdown.

use crate::planner::safe_file_name;
use herd_core::{CoreError, Issue, Mode, TaskMeta, UNKNOWN_FILE_PREFIX};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)] // compile-time constant patterns
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap()
}

/// Task files: `_task_<N>.md`.
static TASK_FILE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^_task_(\d+)\.md$"));

/// Review-issue header: `**File:** \`path/to/file.rs:42\``.
static FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| pattern(r"\*\*File:\*\*\s*`([^`]+)`"));

/// `RESOLVED ✓` marker anywhere in the body.
static RESOLVED_MARKER: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)resolved ✓"));

/// `Status: resolved` / `State: resolved` line.
static RESOLVED_STATUS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?im)^\s*(?:status|state)\s*:\s*resolved\b"));

/// Checked `- [x] resolved` list item.
static RESOLVED_CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?m)^\s*-\s*\[[xX]\]\s*resolved\b"));

/// `Status: <value>` line outside a `<task_context>` block. Tolerates the
/// Markdown-bold forms `**Status:** x` and `**Status**: x`.
static STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?im)^\s*(?:\*\*)?status(?:\*\*)?\s*:\s*(?:\*\*)?\s*(\S+)"));

/// Read the input directory and build one [`Issue`] per accepted file.
///
/// Tasks mode accepts `_task_<N>.md` files in ascending `N`, skipping tasks
/// whose status marks them complete unless `include_completed`. Review mode
/// accepts `*.md` except `_summary.md` in lexicographic order.
pub fn read_entries(
    dir: &Path,
    mode: Mode,
    include_completed: bool,
) -> Result<Vec<Issue>, CoreError> {
    if !dir.is_dir() {
        return Err(CoreError::NotFound(format!(
            "issues directory {}",
            dir.display()
        )));
    }

    let mut names = Vec::new();
    let entries =
        fs::read_dir(dir).map_err(|e| CoreError::io(dir.display().to_string(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::io(dir.display().to_string(), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| CoreError::io(dir.display().to_string(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let accepted = match mode {
            Mode::PrdTasks => TASK_FILE.is_match(&name),
            Mode::PrReview => name.ends_with(".md") && name != "_summary.md",
        };
        if accepted {
            names.push(name);
        }
    }

    match mode {
        // Numeric-aware: _task_2 before _task_10.
        Mode::PrdTasks => names.sort_by_key(|n| (task_number(n), n.clone())),
        Mode::PrReview => names.sort(),
    }

    let mut issues = Vec::new();
    for name in names {
        let path = dir.join(&name);
        let content =
            fs::read_to_string(&path).map_err(|e| CoreError::io(path.display().to_string(), e))?;
        let abs_path = absolutize(&path);

        let code_file = match mode {
            Mode::PrdTasks => {
                let meta = parse_task_meta(&content);
                if meta.is_complete() && !include_completed {
                    tracing::debug!(name = %name, "skipping completed task");
                    continue;
                }
                name.strip_suffix(".md").unwrap_or(&name).to_string()
            }
            Mode::PrReview => extract_code_file(&content)
                .unwrap_or_else(|| format!("{UNKNOWN_FILE_PREFIX}{name}")),
        };

        issues.push(Issue {
            name,
            abs_path,
            content,
            code_file,
        });
    }
    Ok(issues)
}

/// The `<N>` of a `_task_<N>.md` filename.
pub fn task_number(name: &str) -> Option<u64> {
    TASK_FILE
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Drop issues whose content already marks them resolved.
///
/// Idempotent: filtering a filtered list changes nothing.
pub fn filter_unresolved(issues: Vec<Issue>) -> Vec<Issue> {
    issues
        .into_iter()
        .filter(|issue| !is_resolved(&issue.content))
        .collect()
}

/// Whether a review issue's body marks it as already resolved.
pub fn is_resolved(content: &str) -> bool {
    RESOLVED_MARKER.is_match(content)
        || RESOLVED_STATUS.is_match(content)
        || RESOLVED_CHECKBOX.is_match(content)
}

/// Bucket issues by grouping key.
pub fn group_by_code_file(issues: Vec<Issue>) -> BTreeMap<String, Vec<Issue>> {
    let mut groups: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
    for issue in issues {
        groups.entry(issue.code_file.clone()).or_default().push(issue);
    }
    groups
}

/// Parse the `<task_context>` metadata block of a task file.
///
/// Falls back to a bare `Status:` line when the block carries no status tag.
pub fn parse_task_meta(content: &str) -> TaskMeta {
    let block = content
        .split_once("<task_context>")
        .and_then(|(_, rest)| rest.split_once("</task_context>"))
        .map(|(block, _)| block)
        .unwrap_or(content);

    let status = extract_tag(block, "status").or_else(|| {
        STATUS_LINE
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });

    let dependencies = extract_tag(block, "dependencies")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    TaskMeta {
        status,
        domain: extract_tag(block, "domain"),
        task_type: extract_tag(block, "type"),
        scope: extract_tag(block, "scope"),
        complexity: extract_tag(block, "complexity"),
        dependencies,
    }
}

/// Write one summary file per grouping key under `<issues_dir>/grouped/`.
pub fn write_grouped_summaries(
    issues_dir: &Path,
    groups: &BTreeMap<String, Vec<Issue>>,
) -> Result<(), CoreError> {
    let dir = issues_dir.join("grouped");
    fs::create_dir_all(&dir).map_err(|e| CoreError::io(dir.display().to_string(), e))?;

    for (code_file, issues) in groups {
        let path = dir.join(format!("{}.md", safe_file_name(code_file)));
        let mut body = format!("# {}\n\n{} issue(s)\n", code_file, issues.len());
        for issue in issues {
            body.push_str(&format!(
                "\n---\n\n_{}_\n\n{}\n",
                issue.name,
                issue.content.trim_end()
            ));
        }
        fs::write(&path, body).map_err(|e| CoreError::io(path.display().to_string(), e))?;
    }
    Ok(())
}

fn extract_code_file(content: &str) -> Option<String> {
    let raw = FILE_HEADER.captures(content)?.get(1)?.as_str().trim();
    Some(strip_line_suffix(raw))
}

/// Strip a trailing `:<digits>` line reference from a header path.
fn strip_line_suffix(path: &str) -> String {
    if let Some((head, tail)) = path.rsplit_once(':') {
        if !head.is_empty() && !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return head.to_string();
        }
    }
    path.to_string()
}

fn absolutize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
