//! Progress bars, colored output, and summary formatting.
//!
//! This module provides visual feedback while mirrors are synced and pruned,
//! the prune confirmation prompt, and the final summary.

use crate::config::{Config, Verbosity};
use crate::constants::PROGRESS_TICK_MS;
use crate::github::RemoteRepository;
use crate::mirror::{
    PruneOutcome, PruneResult, ReconcileCallbacks, ReconcileReport, SyncOutcome, SyncResult,
    SyncStep,
};
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
/// Prunes without asking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl ReconcileCallbacks for NoOpCallbacks {}

/// Terminal reporting for a whole run.
///
/// Normal mode shows a progress bar with the current repository and step,
/// verbose mode prints every step (and git prints its commands), quiet mode
/// prints nothing until the summary.
pub struct RunProgress {
    bar: ProgressBar,
    verbosity: Verbosity,
    interactive: bool,
    current: RefCell<String>,
}

impl RunProgress {
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn line(&self, message: String) {
        match self.verbosity {
            Verbosity::Quiet => {}
            Verbosity::Normal => self.bar.println(message),
            Verbosity::Verbose => eprintln!("{}", message),
        }
    }
}

impl ReconcileCallbacks for RunProgress {
    fn on_sync_start(&self, repo: &RemoteRepository) {
        if self.verbosity == Verbosity::Verbose {
            eprintln!("\n{}", format!("[{}]", repo.full_name).white().bold());
        }
        *self.current.borrow_mut() = repo.full_name.clone();
        self.bar.set_message(repo.full_name.clone());
    }

    fn on_step(&self, step: &SyncStep) {
        match self.verbosity {
            Verbosity::Verbose => eprintln!("  {}...", step.to_string().dimmed()),
            Verbosity::Normal => self.bar.set_message(format!(
                "{} {}",
                self.current.borrow(),
                format_step_message(step).dimmed()
            )),
            Verbosity::Quiet => {}
        }
    }

    fn on_sync_complete(&self, result: &SyncResult) {
        self.bar.inc(1);
        match &result.outcome {
            SyncOutcome::Failed(failure) => self.line(format!(
                "{} {} failed while {}: {}",
                "✗".red(),
                result.full_name,
                failure.step,
                failure.error
            )),
            _ if self.verbosity == Verbosity::Verbose => self.line(format!(
                "  {} {}",
                "✓".green(),
                describe_success(&result.outcome)
            )),
            _ => {}
        }
    }

    fn confirm_prune(&self, name: &str, path: &Path) -> bool {
        if !self.interactive {
            return true;
        }
        self.bar.suspend(|| {
            Confirm::new()
                .with_prompt(format!(
                    "Remove stale mirror '{}' ({})?",
                    name,
                    path.display()
                ))
                .default(false)
                .interact()
                .unwrap_or(false)
        })
    }

    fn on_pruned(&self, result: &PruneResult) {
        let message = match &result.outcome {
            PruneOutcome::Removed => format!("{} Removed dir {}", "-".yellow(), result.name),
            PruneOutcome::Kept => format!("{} Kept dir {}", "·".dimmed(), result.name),
            PruneOutcome::Failed(error) => format!(
                "{} Failed to remove dir {}: {}",
                "✗".red(),
                result.name,
                error
            ),
        };
        self.line(message);
    }
}

/// Creates the run progress tracker. The bar is hidden in quiet or verbose mode.
#[must_use]
pub fn create_run_progress(total: usize, config: &Config) -> RunProgress {
    let bar = if config.is_quiet() || config.is_verbose() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░"),
        );
        bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        bar
    };

    RunProgress {
        bar,
        verbosity: config.verbosity,
        interactive: config.interactive_prune,
        current: RefCell::new(String::new()),
    }
}

pub fn print_start(count: usize, config: &Config) {
    if config.is_quiet() {
        return;
    }
    if count == 0 {
        println!(
            "{}",
            format!("No repositories found for {}", config.organization)
                .yellow()
                .bold()
        );
    } else {
        println!(
            "{} {} repositories of {} into {}",
            "Mirroring".cyan(),
            count,
            config.organization.white().bold(),
            config.output_dir.display().to_string().white().bold()
        );
    }
}

pub fn print_summary(report: &ReconcileReport, duration: Duration, config: &Config) {
    if config.is_quiet() {
        print_quiet_summary(report);
    } else {
        print_normal_summary(report, duration);
    }
}

fn print_quiet_summary(report: &ReconcileReport) {
    let succeeded = report.synced.len() - report.failures().count();

    // Always print counts to stdout
    println!(
        "{}/{} repositories mirrored, {} removed",
        succeeded,
        report.synced.len(),
        report.removed()
    );

    // Print failures to stderr
    for result in report.failures() {
        if let SyncOutcome::Failed(failure) = &result.outcome {
            eprintln!("error: {}: {}", result.full_name, failure.error);
        }
    }
    for result in &report.pruned {
        if let PruneOutcome::Failed(error) = &result.outcome {
            eprintln!("error: removing {}: {}", result.path.display(), error);
        }
    }
}

fn print_normal_summary(report: &ReconcileReport, duration: Duration) {
    print_section("Summary");

    println!(
        "{} {}   {} {}   {} {}",
        "Cloned:".green().bold(),
        report.cloned(),
        "Updated:".green().bold(),
        report.updated(),
        "Up to date:".dimmed(),
        report.unchanged()
    );

    print_failures(report);
    print_pruned(&report.pruned);

    let succeeded = report.synced.len() - report.failures().count();
    println!(
        "{}: {}/{} repos in {}",
        "Total".white().bold(),
        succeeded,
        report.synced.len(),
        format_duration(duration)
    );
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = 50usize.saturating_sub(title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}

fn print_failures(report: &ReconcileReport) {
    let failures: Vec<&SyncResult> = report.failures().collect();
    if failures.is_empty() {
        return;
    }

    println!();
    println!("{}", format!("Failed ({}):", failures.len()).red().bold());
    for result in failures {
        if let SyncOutcome::Failed(failure) = &result.outcome {
            println!(
                "  {} {} {} in {}",
                "FAIL".red().bold(),
                result.full_name.white(),
                format!("while {}: {}", failure.step, failure.error).red(),
                format_duration(result.duration).dimmed(),
            );
        }
    }
}

fn print_pruned(pruned: &[PruneResult]) {
    if pruned.is_empty() {
        return;
    }

    println!();
    println!("{}", format!("Stale ({}):", pruned.len()).yellow().bold());
    for result in pruned {
        let status = match &result.outcome {
            PruneOutcome::Removed => "REMOVED".yellow().bold(),
            PruneOutcome::Kept => "KEPT".dimmed(),
            PruneOutcome::Failed(_) => "FAIL".red().bold(),
        };
        let detail = match &result.outcome {
            PruneOutcome::Failed(error) => format!(": {}", error).red().to_string(),
            _ => String::new(),
        };
        println!(
            "  {} {}{}",
            status,
            result.path.display().to_string().white(),
            detail
        );
    }
    println!();
}

fn describe_success(outcome: &SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Cloned => "cloned",
        SyncOutcome::Updated { changed: true } => "updated",
        SyncOutcome::Updated { changed: false } => "already up to date",
        SyncOutcome::Failed(_) => "failed",
    }
}

fn format_step_message(step: &SyncStep) -> &'static str {
    match step {
        SyncStep::Started => "Starting...",
        SyncStep::Cloning => "Cloning mirror...",
        SyncStep::StrippingCredentials => "Removing credentials...",
        SyncStep::Opening => "Opening mirror...",
        SyncStep::InjectingCredentials => "Setting credentials...",
        SyncStep::Fetching => "Fetching all refs...",
        SyncStep::RestoringUrl => "Restoring remote URL...",
        SyncStep::Compacting => "Compacting...",
        SyncStep::Completed => "Completed",
    }
}
