// Output formatting and display for the CLI

use crate::config::SupervisorConfig;
use crate::process::{SessionReport, StopReason};
use chrono::{DateTime, Local};
use colored::*;
use std::time::Duration;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print the startup banner
pub fn print_banner(config: &SupervisorConfig, started: DateTime<Local>) {
    println!("{}", "relaunch - restart manager".bold());
    println!("{}", "=".repeat(50));
    println!("  {:<15} {}", "Script:".bold(), config.script_name().cyan());
    println!("  {:<15} {}", "Max Restarts:".bold(), config.max_restarts);
    println!("  {:<15} {}s", "Restart Delay:".bold(), config.restart_delay_secs);
    println!("  {:<15} {}", "Backoff:".bold(), config.backoff);
    println!("  {:<15} {}", "Log File:".bold(), config.log_file.display());
    println!(
        "  {:<15} {}",
        "Started:".bold(),
        started.format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", "Press Ctrl+C to stop".dimmed());
    println!();
}

/// Print the final statistics table
pub fn print_summary(report: &SessionReport, config: &SupervisorConfig) {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Metric")]
        metric: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows = vec![
        SummaryRow {
            metric: "Stopped",
            value: format_stop_reason(report.stop_reason),
        },
        SummaryRow {
            metric: "Launches",
            value: report.launches.to_string(),
        },
        SummaryRow {
            metric: "Total Restarts",
            value: report.restarts.to_string(),
        },
        SummaryRow {
            metric: "Total Runtime",
            value: format_duration(&report.runtime),
        },
        SummaryRow {
            metric: "Average Uptime",
            value: format_duration(&report.average_uptime),
        },
        SummaryRow {
            metric: "Log File",
            value: config.log_file.display().to_string(),
        },
        SummaryRow {
            metric: "Stats File",
            value: config.stats_file.display().to_string(),
        },
    ];

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}", "Final Statistics".bold().underline());
    println!("{}\n", table);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Format a stop reason with color coding
fn format_stop_reason(reason: StopReason) -> String {
    match reason {
        StopReason::Graceful => reason.to_string().green().to_string(),
        StopReason::OperatorRequested => reason.to_string().yellow().to_string(),
        StopReason::BudgetExhausted => reason.to_string().red().bold().to_string(),
    }
}

/// Format a duration in human-readable format
pub fn format_duration(duration: &Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else if secs < 86400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    } else {
        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        }
    }
}
