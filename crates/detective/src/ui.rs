//! UI helpers for the diagnostic CLI.
//!
//! Provides consistent formatting for console output during a run.

use colored::Colorize;

use crate::validation::{Outcome, OutcomeStatus, Report, RunObserver};

/// Print the tool banner.
pub fn print_banner() {
    println!();
    println!(
        "{}",
        r"
   ___  ____  _
  / _ \/ ___|| |_ ___  _ __ ___
 | | | \___ \| __/ _ \| '__/ _ \
 | |_| |___) | || (_) | | |  __/
  \___/|____/ \__\___/|_|  \___|  detective
"
        .cyan()
    );
    println!("  {}", "Object Store Cluster Diagnostics".bright_black());
    println!();
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", "═".repeat(70).bright_black());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(70).bright_black());
    println!();
}

/// Print a progress step with step number.
pub fn print_progress_step(current: usize, total: usize, message: &str) {
    println!(
        "{} {} {}",
        format!("[{current}/{total}]").bright_black(),
        "▶".cyan(),
        message.bold()
    );
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a key-value pair.
pub fn print_kv(key: &str, value: &str) {
    println!("  {} {}", format!("{key}:").bright_black(), value.green());
}

/// Print a list item.
pub fn print_list_item(item: &str) {
    println!("  {} {item}", "•".bright_black());
}

/// Print the result of one check.
pub fn print_check_result(name: &str, outcome: &Outcome) {
    let status = match outcome.status() {
        OutcomeStatus::Success => "✓".green(),
        OutcomeStatus::Warning => "⚠".yellow(),
        OutcomeStatus::Failure => "✗".red(),
    };

    let text = if let Some(msg) = outcome.message() {
        format!("{name} - {msg}")
    } else {
        name.to_string()
    };

    println!("  {status} {text}");
}

/// Print the final summary of a run.
pub fn print_report(report: &Report) {
    print_section("Diagnosis Summary");

    print_kv("Started", &report.started_at().to_rfc3339());
    print_kv("Checks", &report.total_checks().to_string());
    print_kv("Passed", &report.count(OutcomeStatus::Success).to_string());
    print_kv("Warnings", &report.count(OutcomeStatus::Warning).to_string());
    print_kv("Failed", &report.count(OutcomeStatus::Failure).to_string());
    println!();

    if !report.notes().is_empty() {
        print_warning(&format!("Notes ({}):", report.notes().len()));
        for note in report.notes() {
            print_list_item(note);
        }
        println!();
    }

    if report.overall_success() {
        print_success("Overall check successful");
    } else {
        print_error(&format!("Issues found ({}):", report.issues().len()));
        for issue in report.issues() {
            print_list_item(issue);
        }
    }

    println!();
    print_info(&format!(
        "Total time: {:.1}s",
        report.elapsed().as_secs_f64()
    ));
}

/// Renders a run as numbered steps with a result line per check.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn check_started(&self, index: usize, total: usize, name: &str) {
        print_progress_step(index, total, name);
    }

    fn check_finished(&self, _index: usize, name: &str, outcome: &Outcome) {
        print_check_result(name, outcome);
    }
}
