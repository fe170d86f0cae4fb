//! Output formatting for the CLI.
//!
//! Supports human-readable, JSON, raw and table output.

use crate::cli::args::OutputFormat;
use crate::cli::hints;
use crate::oid::Oid;
use crate::table::{InterfaceTable, Table};
use crate::walk::{WalkReport, WalkStatus};
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

/// One walk, ready for output.
#[derive(Debug, Serialize)]
pub struct WalkResult {
    pub target: String,
    pub root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub status: String,
    pub complete: bool,
    pub rows: Vec<RowResult>,
}

/// A single collected row.
#[derive(Debug, Serialize)]
pub struct RowResult {
    pub index: String,
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub value: String,
}

/// All walks of one invocation.
#[derive(Debug, Serialize)]
pub struct OperationResult {
    pub walks: Vec<WalkResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<f64>,
}

/// One interface of the interface status view.
#[derive(Debug, Serialize)]
pub struct InterfaceResult {
    pub index: String,
    pub name: Option<String>,
    pub admin_status: Option<String>,
    pub oper_status: Option<String>,
}

/// Output context for formatting.
pub struct OutputContext {
    pub format: OutputFormat,
    pub show_hints: bool,
    pub show_timing: bool,
}

impl OutputContext {
    /// Create a new output context with default settings.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_hints: true,
            show_timing: false,
        }
    }

    /// Write walk reports to stdout.
    pub fn write_reports(
        &self,
        reports: &[WalkReport],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        self.write_reports_to(&mut io::stdout().lock(), reports, elapsed)
    }

    /// Write walk reports to `w`.
    pub fn write_reports_to<W: Write>(
        &self,
        w: &mut W,
        reports: &[WalkReport],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let result = self.build_result(reports, elapsed);

        match self.format {
            OutputFormat::Human => self.write_human(w, &result),
            OutputFormat::Json => write_json(w, &result),
            OutputFormat::Raw => write_raw(w, &result),
            OutputFormat::Table => {
                let columns: Vec<(String, &WalkReport)> = result
                    .walks
                    .iter()
                    .zip(reports)
                    .map(|(walk, report)| {
                        let header = walk.hint.clone().unwrap_or_else(|| walk.root.clone());
                        (header, report)
                    })
                    .collect();
                let columns: Vec<(&str, &WalkReport)> =
                    columns.iter().map(|(h, r)| (h.as_str(), *r)).collect();
                self.write_table(w, &Table::join(&columns), result.timing_ms)
            }
        }
    }

    /// Write the interface status view to `w`.
    pub fn write_interfaces_to<W: Write>(
        &self,
        w: &mut W,
        view: &InterfaceTable,
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let timing_ms = elapsed.map(|d| d.as_secs_f64() * 1000.0);
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<InterfaceResult> = view
                    .rows()
                    .iter()
                    .map(|r| InterfaceResult {
                        index: r.index.clone(),
                        name: r.name.clone(),
                        admin_status: r.admin_status.clone(),
                        oper_status: r.oper_status.clone(),
                    })
                    .collect();
                write_json(w, &rows)
            }
            OutputFormat::Raw => {
                for r in view.rows() {
                    writeln!(
                        w,
                        "{}\t{}\t{}\t{}",
                        r.index,
                        r.name.as_deref().unwrap_or(""),
                        r.admin_status.as_deref().unwrap_or(""),
                        r.oper_status.as_deref().unwrap_or("")
                    )?;
                }
                Ok(())
            }
            OutputFormat::Human | OutputFormat::Table => {
                self.write_table(w, &view.to_table(), timing_ms)
            }
        }
    }

    /// Write the interface status view to stdout.
    pub fn write_interfaces(
        &self,
        view: &InterfaceTable,
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        self.write_interfaces_to(&mut io::stdout().lock(), view, elapsed)
    }

    fn build_result(&self, reports: &[WalkReport], elapsed: Option<Duration>) -> OperationResult {
        let walks = reports
            .iter()
            .map(|report| WalkResult {
                target: report.target.to_string(),
                root: report.root.to_string(),
                hint: self.hint(&report.root),
                status: report.status.to_string(),
                complete: report.status == WalkStatus::Done,
                rows: report
                    .rows
                    .iter()
                    .map(|row| RowResult {
                        index: row.index.clone(),
                        hint: Oid::parse(&row.oid).ok().and_then(|oid| self.hint(&oid)),
                        oid: row.oid.clone(),
                        value: row.value.clone(),
                    })
                    .collect(),
            })
            .collect();

        OperationResult {
            walks,
            timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
        }
    }

    fn hint(&self, oid: &Oid) -> Option<String> {
        if self.show_hints {
            hints::describe(oid)
        } else {
            None
        }
    }

    fn write_human<W: Write>(&self, w: &mut W, result: &OperationResult) -> io::Result<()> {
        for walk in &result.walks {
            for row in &walk.rows {
                if let Some(ref hint) = row.hint {
                    writeln!(w, "{} ({}) = {}", row.oid, hint, row.value)?;
                } else {
                    writeln!(w, "{} = {}", row.oid, row.value)?;
                }
            }
        }
        self.write_timing(w, result.timing_ms)
    }

    fn write_table<W: Write>(
        &self,
        w: &mut W,
        table: &Table,
        timing_ms: Option<f64>,
    ) -> io::Result<()> {
        write!(w, "{}", table)?;
        self.write_timing(w, timing_ms)
    }

    fn write_timing<W: Write>(&self, w: &mut W, timing_ms: Option<f64>) -> io::Result<()> {
        if self.show_timing
            && let Some(ms) = timing_ms
        {
            writeln!(w, "\nTiming: {:.1}ms", ms)?;
        }
        Ok(())
    }
}

fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(w, "{}", json)
}

fn write_raw<W: Write>(w: &mut W, result: &OperationResult) -> io::Result<()> {
    for walk in &result.walks {
        for row in &walk.rows {
            writeln!(w, "{}\t{}", row.oid, row.value)?;
        }
    }
    Ok(())
}

/// Note on stderr every walk that did not finish normally.
///
/// Returns `true` if any walk failed.
pub fn write_status_notes(reports: &[WalkReport]) -> bool {
    let mut failed = false;
    let mut stderr = io::stderr().lock();
    for report in reports {
        match &report.status {
            WalkStatus::Done => {}
            WalkStatus::Failed(_) => {
                failed = true;
                let _ = writeln!(stderr, "Error: walk of {} {}", report.root, report.status);
            }
            status => {
                let _ = writeln!(
                    stderr,
                    "Note: walk of {} {}, {} row(s) may be incomplete",
                    report.root,
                    status,
                    report.rows.len()
                );
            }
        }
    }
    failed
}

/// Write an error message to stderr.
pub fn write_error(err: &crate::Error) {
    eprintln!("Error: {}", err);
}
