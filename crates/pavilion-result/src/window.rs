// crates/pavilion-result/src/window.rs
// ============================================================================
// Module: Per-Parser Line Window Selection
// Description: Phase A of the result pipeline: resolves a parser's file
//              globs and finds the candidate lines it should hand to the
//              parser, honoring `for_lines_matching` and `preceded_by`.
// Purpose: Decide *where* a parser runs before Phase B decides *what* it
//          returns.
// Dependencies: pavilion-core, glob, regex
// ============================================================================

//! ## Overview
//! A glob that matches nothing contributes a sentinel `_unmatched_glob`
//! entry so later aggregation (`all`/`any`) can still see it; sentinel
//! names are dropped before the final result is assembled. Matching is a
//! sliding window: once a candidate line and its `preceded_by` chain
//! succeed, the scan resumes on the line after the candidate, so two
//! matches never share a line.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use pavilion_core::ParseError;
use regex::Regex;

/// The glob sentinel name for a pattern that matched no files. Dropped from
/// the final result but counted by `all`/`any` aggregation.
pub const UNMATCHED_GLOB: &str = "_unmatched_glob";

/// One parser's file-selection and line-window configuration.
#[derive(Debug, Clone, Default)]
pub struct WindowConfig {
    /// Filename globs, resolved relative to the run's working directory.
    /// Empty means the default: the primary run log, `../run.log`.
    pub files: Vec<String>,
    /// Regex the candidate line must match. `None` matches every line.
    pub for_lines_matching: Option<String>,
    /// Ordered regexes the immediately preceding lines must match.
    pub preceded_by: Vec<String>,
}

impl WindowConfig {
    /// Returns the effective file glob list, substituting the default
    /// primary-log glob when none is configured.
    #[must_use]
    pub fn effective_files(&self) -> Vec<String> {
        if self.files.is_empty() { vec!["../run.log".to_string()] } else { self.files.clone() }
    }
}

/// One resolved file's candidate line numbers (0-indexed), or the
/// [`UNMATCHED_GLOB`] sentinel if its glob matched nothing.
#[derive(Debug, Clone)]
pub struct FileWindow {
    /// The file's base name (sentinel name for an unmatched glob).
    pub file_name: String,
    /// Absolute path to the file, `None` for the sentinel.
    pub path: Option<PathBuf>,
    /// Line contents, split on `\n`, empty for the sentinel.
    pub lines: Vec<String>,
    /// 0-indexed candidate line numbers within `lines`.
    pub matched_lines: Vec<usize>,
}

/// Resolves `config`'s globs against `working_dir` and finds each matched
/// file's candidate lines.
///
/// # Errors
///
/// Returns [`ParseError::InvalidRegex`] if any configured regex fails to
/// compile, or [`ParseError::UnreadableFile`] if a matched file cannot be
/// read as UTF-8 text.
pub fn select(config: &WindowConfig, working_dir: &Path) -> Result<Vec<FileWindow>, ParseError> {
    let candidate_re = config
        .for_lines_matching
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|err| ParseError::InvalidRegex(err.to_string()))?;
    let preceded_res = config
        .preceded_by
        .iter()
        .map(|pattern| Regex::new(pattern))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ParseError::InvalidRegex(err.to_string()))?;

    let mut windows = Vec::new();
    for pattern in config.effective_files() {
        let paths = resolve_glob(working_dir, &pattern);
        if paths.is_empty() {
            windows.push(FileWindow {
                file_name: UNMATCHED_GLOB.to_string(),
                path: None,
                lines: Vec::new(),
                matched_lines: Vec::new(),
            });
            continue;
        }
        for path in paths {
            let contents = fs::read_to_string(&path)
                .map_err(|err| ParseError::UnreadableFile(path.display().to_string(), err.to_string()))?;
            let lines: Vec<String> = contents.lines().map(ToString::to_string).collect();
            let matched_lines = find_matched_lines(&lines, candidate_re.as_ref(), &preceded_res);
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            windows.push(FileWindow { file_name, path: Some(path), lines, matched_lines });
        }
    }
    Ok(windows)
}

fn resolve_glob(working_dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let absolute = working_dir.join(pattern);
    let Some(pattern_str) = absolute.to_str() else { return Vec::new() };
    glob::glob(pattern_str)
        .map(|paths| paths.filter_map(Result::ok).filter(|p| p.is_file()).collect())
        .unwrap_or_default()
}

/// Sliding-window scan: finds every line matching `candidate_re` whose `K`
/// immediately preceding lines match `preceded_by` in order, resuming the
/// scan just after each successful candidate.
fn find_matched_lines(lines: &[String], candidate_re: Option<&Regex>, preceded_by: &[Regex]) -> Vec<usize> {
    let mut matched = Vec::new();
    let k = preceded_by.len();
    let mut i = 0;
    while i < lines.len() {
        let candidate_ok = candidate_re.is_none_or(|re| re.is_match(&lines[i]));
        let preceded_ok = i >= k
            && preceded_by.iter().enumerate().all(|(offset, re)| re.is_match(&lines[i - k + offset]));
        if candidate_ok && (k == 0 || preceded_ok) {
            matched.push(i);
        }
        i += 1;
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_files_is_primary_run_log() {
        let config = WindowConfig::default();
        assert_eq!(config.effective_files(), vec!["../run.log".to_string()]);
    }

    #[test]
    fn unmatched_glob_yields_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let config = WindowConfig { files: vec!["nope-*.log".to_string()], ..Default::default() };
        let windows = select(&config, dir.path()).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].file_name, UNMATCHED_GLOB);
    }

    #[test]
    fn for_lines_matching_filters_candidates() {
        let lines = vec!["start".to_string(), "RESULT: 1".to_string(), "end".to_string()];
        let re = Regex::new("^RESULT").unwrap();
        let matched = find_matched_lines(&lines, Some(&re), &[]);
        assert_eq!(matched, vec![1]);
    }

    #[test]
    fn preceded_by_requires_chain_in_preceding_lines() {
        let lines = vec!["setup".to_string(), "ready".to_string(), "GO".to_string(), "done".to_string()];
        let preceded = vec![Regex::new("setup").unwrap(), Regex::new("ready").unwrap()];
        let candidate = Regex::new("GO").unwrap();
        let matched = find_matched_lines(&lines, Some(&candidate), &preceded);
        assert_eq!(matched, vec![2]);
    }

    #[test]
    fn sliding_window_resumes_after_candidate() {
        let lines = vec!["A".to_string(), "A".to_string(), "A".to_string()];
        let preceded = vec![Regex::new("A").unwrap()];
        let matched = find_matched_lines(&lines, None, &preceded);
        assert_eq!(matched, vec![1, 2]);
    }
}
