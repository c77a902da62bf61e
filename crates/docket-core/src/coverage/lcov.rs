//! LCOV tracefile reading and writing.
//!
//! Only the records that carry line, function and branch data are
//! understood: `SF`, `DA`, `FN`, `FNDA`, `BRDA` and `end_of_record`.
//! Everything else is skipped, and numbers that fail to parse count as 0.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::model::{BranchCoverage, BranchId, FileCoverage, FunctionCoverage};

/// Parse a tracefile into per-file records, keyed by path.
///
/// Records appearing before the first `SF:` line have no file to attach to
/// and are dropped. Only `SF:` switches files: `end_of_record` is a no-op,
/// so records after it still belong to the last `SF:`. A second `SF:` for
/// the same path starts over.
pub fn parse_lcov(content: &str) -> BTreeMap<String, FileCoverage> {
    let mut files = BTreeMap::new();
    let mut current: Option<FileCoverage> = None;

    for raw in content.lines() {
        let line = raw.trim_end_matches('\r');

        if let Some(path) = line.strip_prefix("SF:") {
            if let Some(done) = current.take() {
                files.insert(done.path.clone(), done);
            }
            current = Some(FileCoverage::new(path));
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if let Some(rest) = line.strip_prefix("DA:") {
            let mut parts = rest.split(',');
            let line_no = number(parts.next());
            let hits = number(parts.next());
            file.lines.insert(line_no as u32, hits);
        } else if let Some(rest) = line.strip_prefix("FNDA:") {
            if let Some((hits, name)) = rest.split_once(',') {
                let hits = number(Some(hits));
                let entry = file.functions.entry(name.to_string()).or_default();
                entry.hits = hits;
                entry.executed = hits > 0;
            }
        } else if let Some(rest) = line.strip_prefix("FN:") {
            if let Some((line_no, name)) = rest.split_once(',') {
                file.functions
                    .entry(name.to_string())
                    .or_insert(FunctionCoverage {
                        line: number(Some(line_no)) as u32,
                        ..Default::default()
                    });
            }
        } else if let Some(rest) = line.strip_prefix("BRDA:") {
            let mut parts = rest.split(',');
            let id = BranchId::new(
                number(parts.next()) as u32,
                number(parts.next()) as u32,
                number(parts.next()) as u32,
            );
            // "-" means the branch was never reached.
            let taken = number(parts.next());
            file.branches.insert(id, BranchCoverage { taken, total: 1 });
        }
    }

    if let Some(done) = current.take() {
        files.insert(done.path.clone(), done);
    }

    files
}

fn number(field: Option<&str>) -> u64 {
    field
        .map(str::trim)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Render records as a tracefile, one block per file.
pub fn write_lcov<'a>(files: impl IntoIterator<Item = &'a FileCoverage>) -> String {
    let mut out = String::new();

    for file in files {
        let _ = writeln!(out, "SF:{}", file.path);
        for (name, func) in &file.functions {
            let _ = writeln!(out, "FN:{},{}", func.line, name);
            let _ = writeln!(out, "FNDA:{},{}", func.hits, name);
        }
        for (line, hits) in &file.lines {
            let _ = writeln!(out, "DA:{},{}", line, hits);
        }
        for (id, branch) in &file.branches {
            let _ = writeln!(
                out,
                "BRDA:{},{},{},{}",
                id.line, id.block, id.branch, branch.taken
            );
        }
        out.push_str("end_of_record\n");
    }

    out
}
