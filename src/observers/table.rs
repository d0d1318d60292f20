//! Table observer for comparing strategies side by side.
//!
//! [`TableObserver`] renders a slice of [`LoadReport`]s as one row per
//! strategy, and the tallies of a [`StrategyStats`] as a name/value list or a
//! compact grid.
//!
//! # Feature Flag
//!
//! This module requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! contesa = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use contesa::observers::table::{TableObserver, TableStyle};
//!
//! let observer = TableObserver::new().with_style(TableStyle::Rounded);
//! println!("{}", observer.render_reports(&reports));
//! // ╭────────────┬─────────┬──────────┬──────────┬──────────┬──────┬──────────┬────────┬────────────┬─────────╮
//! // │ Strategy   │ Workers │ Requests │ Expected │ Observed │ Lost │ Give-ups │ Errors │ Elapsed ms │ Req/s   │
//! // ├────────────┼─────────┼──────────┼──────────┼──────────┼──────┼──────────┼────────┼────────────┼─────────┤
//! // │ exclusive  │ 100     │ 10000    │ 10000    │ 10000    │ 0    │ 0        │ 0      │ 41         │ 243902  │
//! // │ optimistic │ 100     │ 10000    │ 10000    │ 9377     │ 623  │ 623      │ 0      │ 18         │ 555555  │
//! // ╰────────────┴─────────┴──────────┴──────────┴──────────┴──────┴──────────┴────────┴────────────┴─────────╯
//! ```

use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::load::LoadReport;
use crate::metrics::{Observable, StrategyStats};

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// GitHub-flavored Markdown table
    Markdown,
    /// No borders, just spacing
    Blank,
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row (ignored for compact tallies).
    pub show_header: bool,
    /// Line printed above the table.
    pub title: Option<String>,
    /// Render tallies as `name: value` cells in a grid.
    pub compact: bool,
    /// Grid width in compact mode.
    pub columns: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
            compact: false,
            columns: 1,
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Workers")]
    workers: usize,
    #[tabled(rename = "Requests")]
    requests: usize,
    #[tabled(rename = "Expected")]
    expected: u64,
    #[tabled(rename = "Observed")]
    observed: u64,
    #[tabled(rename = "Lost")]
    lost: u64,
    #[tabled(rename = "Give-ups")]
    give_ups: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
    #[tabled(rename = "Elapsed ms")]
    elapsed_ms: u128,
    #[tabled(rename = "Req/s")]
    throughput: String,
}

impl From<&LoadReport> for ReportRow {
    fn from(report: &LoadReport) -> Self {
        Self {
            strategy: report.strategy.to_string(),
            workers: report.workers,
            requests: report.requests,
            expected: report.expected,
            observed: report.observed,
            lost: report.lost(),
            give_ups: report.give_ups,
            errors: report.errors,
            elapsed_ms: report.elapsed.as_millis(),
            throughput: format!("{:.0}", report.throughput()),
        }
    }
}

#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: u64,
}

/// Renders load reports and tallies as formatted tables.
///
/// # Examples
///
/// ```rust
/// use contesa::metrics::StrategyStats;
/// use contesa::observers::table::TableObserver;
///
/// let stats = StrategyStats::new();
/// stats.optimistic_conflicts.add(12);
///
/// let output = TableObserver::new().render_stats(&stats);
/// assert!(output.contains("optimistic_conflicts"));
/// assert!(output.contains("12"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a table observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets a title printed above the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// Enables or disables the compact tally grid.
    pub fn compact(mut self, enabled: bool) -> Self {
        self.config.compact = enabled;
        self
    }

    /// Sets the grid width in compact mode. Values less than 1 are treated as 1.
    pub fn columns(mut self, count: usize) -> Self {
        self.config.columns = count.max(1);
        self
    }

    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    fn finish(&self, mut table: Table, header: bool) -> String {
        self.apply_style(&mut table);

        if header && !self.config.show_header {
            table.with(tabled::settings::Remove::row(
                tabled::settings::object::Rows::first(),
            ));
        }

        match self.config.title {
            Some(ref title) => format!("{}\n{}", title, table),
            None => table.to_string(),
        }
    }

    /// Renders one row per load report.
    pub fn render_reports(&self, reports: &[LoadReport]) -> String {
        let rows: Vec<ReportRow> = reports.iter().map(ReportRow::from).collect();
        self.finish(Table::new(&rows), true)
    }

    /// Renders every tally of `stats`.
    pub fn render_stats(&self, stats: &StrategyStats) -> String {
        self.render_tallies(stats.observables().into_iter())
    }

    /// Renders an arbitrary set of observables.
    ///
    /// In compact mode an empty input renders as an empty string.
    pub fn render_tallies<'a>(&self, tallies: impl Iterator<Item = &'a dyn Observable>) -> String {
        let entries = tallies.map(|t| {
            let name = if t.name().is_empty() {
                "(unnamed)".to_string()
            } else {
                t.name().to_string()
            };
            (name, t.value())
        });

        if !self.config.compact {
            let rows: Vec<TallyRow> = entries.map(|(name, value)| TallyRow { name, value }).collect();
            return self.finish(Table::new(&rows), true);
        }

        let cells: Vec<String> = entries
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        if cells.is_empty() {
            return String::new();
        }

        let cols = self.config.columns;
        let mut builder = Builder::default();
        for chunk in cells.chunks(cols) {
            let mut row = chunk.to_vec();
            row.resize(cols, String::new());
            builder.push_record(row);
        }
        self.finish(builder.build(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::Strategy;
    use crate::metrics::Tally;
    use std::time::Duration;

    fn report(strategy: Strategy, observed: u64, give_ups: u64) -> LoadReport {
        LoadReport {
            strategy,
            workers: 100,
            requests: 10_000,
            expected: 10_000,
            observed,
            give_ups,
            errors: 0,
            elapsed: Duration::from_millis(250),
        }
    }

    #[test]
    fn test_render_reports() {
        let reports = vec![
            report(Strategy::Exclusive, 10_000, 0),
            report(Strategy::Optimistic, 9_377, 623),
        ];
        let output = TableObserver::new().render_reports(&reports);

        assert!(output.contains("Strategy"));
        assert!(output.contains("Give-ups"));
        assert!(output.contains("exclusive"));
        assert!(output.contains("optimistic"));
        assert!(output.contains("9377"));
        assert!(output.contains("623"));
        assert!(output.contains("40000"));
    }

    #[test]
    fn test_render_reports_empty() {
        let output = TableObserver::new().render_reports(&[]);
        assert!(output.contains("Strategy"));
    }

    #[test]
    fn test_render_stats() {
        let stats = StrategyStats::new();
        stats.exclusive_applied.add(7);
        stats.failures.incr();

        let output = TableObserver::new().render_stats(&stats);

        assert!(output.contains("Name"));
        assert!(output.contains("exclusive_applied"));
        assert!(output.contains("7"));
        assert!(output.contains("failures"));
    }

    #[test]
    fn test_without_header() {
        let stats = StrategyStats::new();
        let output = TableObserver::new().with_header(false).render_stats(&stats);
        assert!(!output.contains("Name"));
        assert!(output.contains("fast_applied"));
    }

    #[test]
    fn test_with_title() {
        let output = TableObserver::new()
            .with_title("Contention")
            .render_reports(&[report(Strategy::Fast, 10_000, 0)]);
        assert!(output.starts_with("Contention\n"));
    }

    #[test]
    fn test_ascii_style() {
        let output = TableObserver::new()
            .with_style(TableStyle::Ascii)
            .render_reports(&[report(Strategy::Fast, 10_000, 0)]);
        assert!(output.contains('+'));
        assert!(output.contains('|'));
    }

    #[test]
    fn test_markdown_style() {
        let output = TableObserver::new()
            .with_style(TableStyle::Markdown)
            .render_stats(&StrategyStats::new());
        assert!(output.contains('|'));
        assert!(output.contains("---"));
    }

    #[test]
    fn test_compact_grid() {
        let stats = StrategyStats::new();
        stats.optimistic_give_ups.add(3);

        let output = TableObserver::new().compact(true).columns(3).render_stats(&stats);

        assert!(output.contains("optimistic_give_ups: 3"));
        // Seven tallies in three columns: three rows.
        assert_eq!(output.lines().filter(|l| l.contains(": ")).count(), 3);
    }

    #[test]
    fn test_compact_empty() {
        let tallies: Vec<&dyn Observable> = vec![];
        let output = TableObserver::new().compact(true).render_tallies(tallies.into_iter());
        assert!(output.is_empty());
    }

    #[test]
    fn test_unnamed_tally() {
        let tally = Tally::new();
        tally.add(5);
        let tallies: Vec<&dyn Observable> = vec![&tally];
        let output = TableObserver::new().render_tallies(tallies.into_iter());
        assert!(output.contains("(unnamed)"));
    }

    #[test]
    fn test_columns_minimum() {
        let observer = TableObserver::new().columns(0);
        assert_eq!(observer.config.columns, 1);
    }
}
