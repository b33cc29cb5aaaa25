//! Command-line arguments

use cdr_core::config::Verbosity;
use chrono::{Days, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

/// Normalize and validate provider CDR files
#[derive(Parser, Debug, Clone)]
#[command(name = "cdr-ingest", version)]
pub struct Cli {
    /// Feed date to process (YYYY-MM-DD, default: yesterday)
    #[arg(long, conflicts_with_all = ["from", "files"])]
    pub date: Option<NaiveDate>,

    /// First date of a range (inclusive)
    #[arg(long, requires = "to", conflicts_with = "files")]
    pub from: Option<NaiveDate>,

    /// Last date of a range (inclusive)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Process these files instead of discovering them
    #[arg(long = "file", value_name = "PATH", num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Override processing.verbosity (quiet, normal, detailed)
    #[arg(long)]
    pub verbosity: Option<Verbosity>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Process and report without storing or archiving
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (default: config/default and config/$RUN_MODE)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,
}

/// What the run should process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Files(Vec<PathBuf>),
    Dates(Vec<NaiveDate>),
}

impl Cli {
    /// Resolve the arguments against `today`
    pub fn selection(&self, today: NaiveDate) -> Result<Selection, String> {
        if !self.files.is_empty() {
            return Ok(Selection::Files(self.files.clone()));
        }

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(format!("--from {} is after --to {}", from, to));
            }
            let dates = from.iter_days().take_while(|d| *d <= to).collect();
            return Ok(Selection::Dates(dates));
        }

        let date = match self.date {
            Some(date) => date,
            None => today
                .checked_sub_days(Days::new(1))
                .ok_or_else(|| format!("no day before {}", today))?,
        };
        Ok(Selection::Dates(vec![date]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cdr-ingest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_to_yesterday() {
        let cli = parse(&[]);
        assert_eq!(
            cli.selection(day(2025, 3, 1)).unwrap(),
            Selection::Dates(vec![day(2025, 2, 28)])
        );
        assert!(!cli.dry_run);
        assert_eq!(cli.verbosity, None);
    }

    #[test]
    fn test_explicit_date_and_verbosity() {
        let cli = parse(&["--date", "2025-01-13", "--verbosity", "detailed", "--json-logs"]);
        assert_eq!(
            cli.selection(day(2025, 6, 1)).unwrap(),
            Selection::Dates(vec![day(2025, 1, 13)])
        );
        assert_eq!(cli.verbosity, Some(Verbosity::Detailed));
        assert!(cli.json_logs);
    }

    #[test]
    fn test_date_range() {
        let cli = parse(&["--from", "2025-01-30", "--to", "2025-02-02"]);
        assert_eq!(
            cli.selection(day(2025, 6, 1)).unwrap(),
            Selection::Dates(vec![
                day(2025, 1, 30),
                day(2025, 1, 31),
                day(2025, 2, 1),
                day(2025, 2, 2),
            ])
        );
    }

    #[test]
    fn test_reversed_range_rejected() {
        let cli = parse(&["--from", "2025-02-02", "--to", "2025-01-30"]);
        assert!(cli.selection(day(2025, 6, 1)).is_err());
    }

    #[test]
    fn test_files() {
        let cli = parse(&["--file", "a.csv", "b.csv", "--dry-run"]);
        assert_eq!(
            cli.selection(day(2025, 6, 1)).unwrap(),
            Selection::Files(vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")])
        );
        assert!(cli.dry_run);
    }

    #[test]
    fn test_conflicting_arguments() {
        let args = ["cdr-ingest", "--date", "2025-01-13", "--file", "a.csv"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["cdr-ingest", "--from", "2025-01-13"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
