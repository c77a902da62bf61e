//! Terminal output for the `docket` commands.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use docket_core::coverage::{CoverageSummary, ThresholdReport};
use docket_core::suite::{NodeKind, TestStatus, TestTree};
use docket_core::{RunSummary, ScanResult};

/// Spinner shown while tests run. Hidden when `quiet`.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_scan(scan: &ScanResult) {
    println!("{}", scan.source_file);
    for decl in &scan.declarations {
        println!("  {:<18} {} ({})", decl.kind.to_string(), decl.name, decl.location);
    }
    for example in &scan.examples {
        let parent = scan
            .parent_of(example)
            .map(|d| d.name.as_str())
            .unwrap_or("-");
        println!("  >>> {} [{}] @ {}", example.code.replace('\n', " ; "), parent, example.location);
        if let Some(expected) = &example.expected_output {
            println!("      = {}", expected.replace('\n', " ; "));
        }
    }
}

/// Indented outline of the tree: groups, suites and leaves with status.
pub fn print_tree(tree: &TestTree) {
    for id in tree.preorder(tree.root()) {
        let Some(node) = tree.node(id) else {
            continue;
        };
        let depth = tree.path(id).len() - 1;
        let indent = "  ".repeat(depth);
        match &node.kind {
            NodeKind::Group => println!("{}{}", indent, node.name),
            NodeKind::Suite(case) => {
                println!("{}{} ({} tests)", indent, node.name, case.test_count())
            }
            NodeKind::Leaf { .. } => {
                let status = tree
                    .leaf_test(id)
                    .map(|t| t.status())
                    .unwrap_or_default();
                println!("{}{} {} [{}]", indent, status.symbol(), node.name, node.key);
            }
        }
    }
}

pub fn print_results(tree: &TestTree, summary: &RunSummary, verbose: bool) {
    for (id, result) in &summary.results {
        if result.status == TestStatus::Passed && !verbose {
            continue;
        }
        let name = tree.test(id).map(|t| t.name.as_str()).unwrap_or(id.as_str());
        let duration = result
            .duration
            .map(|d| format!(" ({}ms)", d.as_millis()))
            .unwrap_or_default();
        println!("{} {}{}", result.status.symbol(), name, duration);
        if let Some(error) = &result.error {
            println!("    {}", error);
        }
        if verbose {
            if let Some(output) = &result.output {
                println!("    Output: {}", output);
            }
        }
    }

    println!();
    println!(
        "{} tests: {} passed, {} failed, {} errors, {} skipped ({}ms)",
        summary.total_tests,
        summary.passed,
        summary.failed,
        summary.errors,
        summary.skipped,
        summary.duration.as_millis()
    );
}

pub fn print_coverage(summary: &CoverageSummary, report: &ThresholdReport) {
    let row = |label: &str, m: &docket_core::coverage::CoverageMetric| {
        println!("{:<11} {}/{} ({}%)", label, m.covered, m.total, m.percentage);
    };
    println!("Coverage:");
    row("Lines:", &summary.lines);
    row("Branches:", &summary.branches);
    row("Functions:", &summary.functions);
    row("Statements:", &summary.statements);

    if report.passed {
        println!("✓ All coverage thresholds met");
    } else {
        for failure in &report.failures {
            println!("✗ {}", failure);
        }
    }
}
