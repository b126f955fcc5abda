//! Hygiene: enforces coding standards at test time
//!
//! These tests scan the engine's `src/` tree for antipatterns. Each has a
//! budget (ideally zero). If you must add one, you have to fix an existing one
//! first; the budget never grows.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

// Panics: the engine runs inside an interactive host.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss: discards errors without inspecting.
const MAX_SILENT_DISCARD: usize = 0;
const MAX_DOT_OK: usize = 0;

// Output goes through `tracing`, never straight to stdio.
const MAX_PRINT: usize = 0;

// Style / structure.
const MAX_ALLOW_DEAD_CODE: usize = 0;

/// Only the config module reads the process environment.
const ENV_READER: &str = "config.rs";

struct SourceFile {
    path: String,
    content: String,
}

impl SourceFile {
    fn name(&self) -> &str {
        Path::new(&self.path).file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }
}

/// Production `.rs` files under `src/`; sibling `*_test.rs` files are excluded.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

/// Per-file counts of lines containing `pattern`. Line comments are skipped
/// so docs can name the patterns they forbid.
fn count_in_source(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file
                .content
                .lines()
                .filter(|line| !line.trim_start().starts_with("//"))
                .filter(|line| line.contains(pattern))
                .count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn total(hits: &[(String, usize)]) -> usize {
    hits.iter().map(|(_, c)| c).sum()
}

fn format_hits(hits: &[(String, usize)]) -> String {
    hits.iter().map(|(path, count)| format!("  {path}: {count}")).collect::<Vec<_>>().join("\n")
}

fn assert_budget(pattern: &str, max: usize) {
    let files = source_files();
    assert!(!files.is_empty(), "no source files found; run from the crate root");
    let hits = count_in_source(&files, pattern);
    let count = total(&hits);
    assert!(count <= max, "{pattern} budget exceeded: found {count}, max {max}.\n{}", format_hits(&hits));
}

// =============================================================
// Budgets
// =============================================================

#[test]
fn unwrap_budget() {
    assert_budget(".unwrap()", MAX_UNWRAP);
}

#[test]
fn expect_budget() {
    assert_budget(".expect(", MAX_EXPECT);
}

#[test]
fn panic_budget() {
    assert_budget("panic!(", MAX_PANIC);
}

#[test]
fn unreachable_budget() {
    assert_budget("unreachable!(", MAX_UNREACHABLE);
}

#[test]
fn todo_budget() {
    assert_budget("todo!(", MAX_TODO);
}

#[test]
fn unimplemented_budget() {
    assert_budget("unimplemented!(", MAX_UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    assert_budget("let _ =", MAX_SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    assert_budget(".ok()", MAX_DOT_OK);
}

#[test]
fn print_budget() {
    assert_budget("println!(", MAX_PRINT);
    assert_budget("eprintln!(", MAX_PRINT);
    assert_budget("dbg!(", MAX_PRINT);
}

#[test]
fn allow_dead_code_budget() {
    assert_budget("#[allow(dead_code)]", MAX_ALLOW_DEAD_CODE);
}

// =============================================================
// Structure
// =============================================================

#[test]
fn env_reads_stay_in_config() {
    let offenders: Vec<String> = source_files()
        .into_iter()
        .filter(|f| f.name() != ENV_READER && f.content.contains("env::var"))
        .map(|f| f.path)
        .collect();
    assert!(offenders.is_empty(), "environment read outside {ENV_READER}:\n  {}", offenders.join("\n  "));
}

#[test]
fn every_module_has_sibling_tests() {
    let files = source_files();
    let missing: Vec<&str> = files
        .iter()
        .filter(|f| !matches!(f.name(), "lib.rs" | "consts.rs"))
        .filter(|f| !f.content.contains("#[cfg(test)]"))
        .map(|f| f.path.as_str())
        .collect();
    assert!(missing.is_empty(), "modules without a test module:\n  {}", missing.join("\n  "));
}
