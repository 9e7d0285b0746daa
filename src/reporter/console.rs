//! Console reporter with colored output

use crate::check::{CheckReport, Diagnostic, Severity};
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report check diagnostics with summary
    pub fn report(&self, report: &CheckReport) {
        println!();
        println!("{}", format!("Content check: {}", report.content).bold());
        println!();

        if report.diagnostics.is_empty() {
            println!("   {} No problems found", "✓".green());
            println!();
            return;
        }

        let mut sorted: Vec<&Diagnostic> = report.diagnostics.iter().collect();
        sorted.sort_by_key(|d| d.severity);

        let infos = report.count(Severity::Info);
        for diagnostic in sorted {
            // Only show info diagnostics in verbose mode or if there are few in total
            if diagnostic.severity == Severity::Info
                && !self.verbose
                && report.diagnostics.len() > 5
            {
                continue;
            }
            self.print_diagnostic(diagnostic);
        }
        if infos > 0 && !self.verbose && report.diagnostics.len() > 5 {
            println!(
                "   {} {} additional notes (use --verbose to show)",
                "ℹ".blue(),
                infos
            );
        }

        self.print_summary(report);
    }

    fn print_diagnostic(&self, diagnostic: &Diagnostic) {
        let icon = match diagnostic.severity {
            Severity::Error => "✗".red(),
            Severity::Warning => "⚠".yellow(),
            Severity::Info => "ℹ".blue(),
        };

        println!(
            "   {} {} [{}] {}",
            icon,
            diagnostic.location.dimmed(),
            diagnostic.kind.to_string().dimmed(),
            diagnostic.message
        );
    }

    fn print_summary(&self, report: &CheckReport) {
        println!();
        let errors = report.count(Severity::Error);
        let warnings = report.count(Severity::Warning);
        let errors = if errors > 0 {
            format!("{errors} error(s)").red().bold()
        } else {
            format!("{errors} error(s)").normal()
        };
        let warnings = if warnings > 0 {
            format!("{warnings} warning(s)").yellow()
        } else {
            format!("{warnings} warning(s)").normal()
        };
        println!(
            "   {}, {}, {} note(s)",
            errors,
            warnings,
            report.count(Severity::Info)
        );
        println!();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
