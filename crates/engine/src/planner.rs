// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch planning: ordering, batching and per-job artifact layout.

use crate::discovery::task_number;
use crate::prompt;
use herd_core::{CoreError, Issue, Job, Mode, Settings, UNKNOWN_FILE_PREFIX};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Filesystem-safe, collision-resistant identifier for a grouping key.
///
/// Backslashes normalise to `/`; anything outside `[A-Za-z0-9._-]` becomes
/// `_`; a 6-hex-char SHA-256 prefix of the normalised path keeps distinct
/// paths distinct. The `__unknown__:` sentinel collapses to the stem
/// `unknown` (the digest still covers the full sentinel).
pub fn safe_file_name(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let digest = Sha256::digest(normalized.as_bytes());
    let hash = format!("{:x}", digest);

    let stem = if normalized.starts_with(UNKNOWN_FILE_PREFIX) {
        "unknown".to_string()
    } else {
        let sanitized: String = normalized
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
                _ => '_',
            })
            .collect();
        if sanitized.is_empty() {
            "unknown".to_string()
        } else {
            sanitized
        }
    };

    format!("{}-{}", stem, &hash[..6])
}

/// Flatten groups into a single work order.
///
/// Tasks mode sorts numerically on the `_task_<N>` index so `_task_2`
/// precedes `_task_10`; review mode sorts lexicographically by filename.
pub fn flatten_and_sort(groups: &BTreeMap<String, Vec<Issue>>, mode: Mode) -> Vec<Issue> {
    let mut all: Vec<Issue> = groups.values().flatten().cloned().collect();
    match mode {
        Mode::PrdTasks => {
            all.sort_by(|a, b| match (task_number(&a.name), task_number(&b.name)) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
                _ => a.name.cmp(&b.name),
            });
        }
        Mode::PrReview => all.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    all
}

/// Partition the sorted issues into jobs and write each job's prompt file.
///
/// Log paths are computed but not created; the supervisor opens them
/// append-create on first run.
pub fn plan_jobs(
    settings: &Settings,
    groups: &BTreeMap<String, Vec<Issue>>,
    prompt_root: &Path,
) -> Result<Vec<Job>, CoreError> {
    let all = flatten_and_sort(groups, settings.mode);
    let mut jobs = Vec::new();

    for (batch_idx, chunk) in all.chunks(settings.batch_size.max(1)).enumerate() {
        let mut batch_groups: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
        for issue in chunk {
            batch_groups
                .entry(issue.code_file.clone())
                .or_default()
                .push(issue.clone());
        }
        let code_files: Vec<String> = batch_groups.keys().cloned().collect();

        let safe_name = match (settings.mode, code_files.as_slice()) {
            (Mode::PrdTasks, [single]) => safe_file_name(single),
            (Mode::PrdTasks, _) => format!("task_{:03}", batch_idx + 1),
            (Mode::PrReview, [single]) => safe_file_name(single),
            (Mode::PrReview, _) => format!("batch_{:03}", batch_idx + 1),
        };

        let prompt = prompt::render(&settings.pr, &batch_groups, settings.grouped, settings.mode)
            .into_bytes();
        let prompt_path = prompt_root.join(format!("{safe_name}.prompt.md"));
        write_private(&prompt_path, &prompt)?;

        jobs.push(Job {
            code_files,
            groups: batch_groups,
            safe_name: safe_name.clone(),
            prompt,
            prompt_path,
            out_log: prompt_root.join(format!("{safe_name}.out.log")),
            err_log: prompt_root.join(format!("{safe_name}.err.log")),
        });
    }
    Ok(jobs)
}

/// Write a file readable only by the owner (mode 0600 on Unix).
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|e| CoreError::io(path.display().to_string(), e))?;
    file.write_all(bytes)
        .map_err(|e| CoreError::io(path.display().to_string(), e))
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
