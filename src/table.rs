//! Joining walk results into tables.
//!
//! Columns of one SNMP table share their row indexes, so walking each column
//! separately and joining on [`WalkRow::index`] rebuilds the table.
//!
//! [`WalkRow::index`]: crate::walk::WalkRow::index

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::walk::{WalkReport, WalkStatus, Walker, WalkerBuilder};

/// IF-MIB `ifDescr` column.
pub const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
/// IF-MIB `ifAdminStatus` column.
pub const IF_ADMIN_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 7];
/// IF-MIB `ifOperStatus` column.
pub const IF_OPER_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 8];

/// Several walks joined by row index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

/// One row of a [`Table`]; `cells[i]` belongs to `headers[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub index: String,
    pub cells: Vec<Option<String>>,
}

impl Table {
    /// Join `(header, report)` columns on row index.
    ///
    /// Rows appear in the order their index is first seen, scanning the
    /// columns in the order given. A column with no row for an index leaves
    /// that cell `None`. If a column repeats an index, the last value wins.
    pub fn join(columns: &[(&str, &WalkReport)]) -> Self {
        let headers = columns.iter().map(|(h, _)| h.to_string()).collect();
        let mut rows: Vec<TableRow> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for (col, (_, report)) in columns.iter().enumerate() {
            for row in &report.rows {
                let pos = *positions.entry(row.index.as_str()).or_insert_with(|| {
                    rows.push(TableRow {
                        index: row.index.clone(),
                        cells: vec![None; columns.len()],
                    });
                    rows.len() - 1
                });
                rows[pos].cells[col] = Some(row.value.clone());
            }
        }

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rewrite every present cell of one column.
    pub fn map_column(&mut self, column: usize, f: impl Fn(&str) -> String) {
        for row in &mut self.rows {
            if let Some(Some(cell)) = row.cells.get_mut(column) {
                *cell = f(cell);
            }
        }
    }
}

/// Aligned plain text, one line per row, missing cells shown as `-`.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = std::iter::once("index".len())
            .chain(self.headers.iter().map(String::len))
            .collect();
        for row in &self.rows {
            widths[0] = widths[0].max(row.index.len());
            for (i, cell) in row.cells.iter().enumerate() {
                let len = cell.as_deref().map_or(1, str::len);
                widths[i + 1] = widths[i + 1].max(len);
            }
        }

        let headers = self.headers.iter().map(String::as_str);
        write_line(f, &widths, std::iter::once("index").chain(headers))?;
        for row in &self.rows {
            let cells = row.cells.iter().map(|c| c.as_deref().unwrap_or("-"));
            write_line(f, &widths, std::iter::once(row.index.as_str()).chain(cells))?;
        }
        Ok(())
    }
}

fn write_line<'a>(
    f: &mut fmt::Formatter<'_>,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let mut out = String::new();
    for (cell, width) in cells.zip(widths) {
        if !out.is_empty() {
            out.push_str("  ");
        }
        out.push_str(&format!("{cell:<width$}"));
    }
    writeln!(f, "{}", out.trim_end())
}

/// Name of an `ifAdminStatus`/`ifOperStatus` value, if it is a known one.
pub fn interface_status_name(code: i32) -> Option<&'static str> {
    Some(match code {
        1 => "up",
        2 => "down",
        3 => "testing",
        4 => "unknown",
        5 => "dormant",
        6 => "notPresent",
        7 => "lowerLayerDown",
        _ => return None,
    })
}

fn render_status(value: &str) -> String {
    value
        .parse::<i32>()
        .ok()
        .and_then(interface_status_name)
        .map_or_else(|| value.to_string(), str::to_string)
}

/// One interface: name plus administrative and operational status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRow {
    pub index: String,
    pub name: Option<String>,
    pub admin_status: Option<String>,
    pub oper_status: Option<String>,
}

/// Interface status view built from the IF-MIB `ifDescr`, `ifAdminStatus`
/// and `ifOperStatus` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceTable {
    rows: Vec<InterfaceRow>,
    statuses: Vec<WalkStatus>,
}

impl InterfaceTable {
    /// Add the three interface columns to a walker.
    pub fn columns(builder: WalkerBuilder) -> WalkerBuilder {
        builder
            .root(IF_DESCR)
            .root(IF_ADMIN_STATUS)
            .root(IF_OPER_STATUS)
    }

    /// Build the view from reports of the interface columns.
    ///
    /// Reports are matched by root, so their order does not matter and
    /// unrelated reports are skipped.
    pub fn from_reports(reports: &[WalkReport]) -> Self {
        let find = |root: &[u32]| reports.iter().find(|r| r.root.arcs() == root);
        let wanted = [
            ("name", find(IF_DESCR)),
            ("admin", find(IF_ADMIN_STATUS)),
            ("oper", find(IF_OPER_STATUS)),
        ];
        let statuses = wanted
            .iter()
            .filter_map(|(_, r)| r.map(|r| r.status.clone()))
            .collect();
        let columns: Vec<(&str, &WalkReport)> = wanted
            .iter()
            .filter_map(|(h, r)| r.map(|r| (*h, r)))
            .collect();

        let table = Table::join(&columns);
        let cell = |row: &TableRow, header: &str| {
            columns
                .iter()
                .position(|(h, _)| *h == header)
                .and_then(|i| row.cells[i].clone())
        };
        let rows = table
            .rows()
            .iter()
            .map(|row| InterfaceRow {
                index: row.index.clone(),
                name: cell(row, "name"),
                admin_status: cell(row, "admin").map(|v| render_status(&v)),
                oper_status: cell(row, "oper").map(|v| render_status(&v)),
            })
            .collect();

        Self { rows, statuses }
    }

    pub fn rows(&self) -> &[InterfaceRow] {
        &self.rows
    }

    /// Final status of each column walk that contributed.
    pub fn statuses(&self) -> &[WalkStatus] {
        &self.statuses
    }

    /// Whether every column walk finished normally.
    pub fn is_complete(&self) -> bool {
        self.statuses.len() == 3 && self.statuses.iter().all(|s| *s == WalkStatus::Done)
    }

    /// Generic table form, for rendering.
    pub fn to_table(&self) -> Table {
        Table {
            headers: vec!["name".into(), "admin".into(), "oper".into()],
            rows: self
                .rows
                .iter()
                .map(|r| TableRow {
                    index: r.index.clone(),
                    cells: vec![r.name.clone(), r.admin_status.clone(), r.oper_status.clone()],
                })
                .collect(),
        }
    }
}

impl fmt::Display for InterfaceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_table().fmt(f)
    }
}

/// Walk the interface columns of `host` in one run.
pub async fn walk_interfaces(
    host: &str,
    community: &str,
    timeout: Duration,
) -> Result<InterfaceTable> {
    let reports = InterfaceTable::columns(Walker::builder(host))
        .community(community)
        .timeout(timeout)
        .build()
        .run()
        .await?;
    Ok(InterfaceTable::from_reports(&reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::Oid;
    use crate::walk::WalkRow;

    fn report(root: &[u32], status: WalkStatus, rows: &[(&str, &str)]) -> WalkReport {
        let root = Oid::from_slice(root);
        WalkReport {
            target: "192.0.2.1:161".parse().unwrap(),
            rows: rows
                .iter()
                .map(|(index, value)| WalkRow {
                    index: index.to_string(),
                    oid: format!("{}.{}", root, index),
                    value: value.to_string(),
                })
                .collect(),
            root,
            status,
        }
    }

    #[test]
    fn test_join_first_seen_order() {
        let a = report(IF_DESCR, WalkStatus::Done, &[("1", "lo"), ("2", "eth0")]);
        let b = report(IF_OPER_STATUS, WalkStatus::Done, &[("3", "1"), ("1", "1")]);
        let table = Table::join(&[("descr", &a), ("oper", &b)]);

        let indexes: Vec<_> = table.rows().iter().map(|r| r.index.as_str()).collect();
        assert_eq!(indexes, ["1", "2", "3"]);
        assert_eq!(table.rows()[0].cells, [Some("lo".into()), Some("1".into())]);
        assert_eq!(table.rows()[1].cells, [Some("eth0".into()), None]);
        assert_eq!(table.rows()[2].cells, [None, Some("1".into())]);
    }

    #[test]
    fn test_join_empty() {
        let table = Table::join(&[]);
        assert!(table.is_empty());
        assert_eq!(table.to_string(), "index\n");
    }

    #[test]
    fn test_display_aligned() {
        let a = report(IF_DESCR, WalkStatus::Done, &[("1", "lo"), ("10", "Ethernet0")]);
        let b = report(IF_OPER_STATUS, WalkStatus::Done, &[("1", "up")]);
        let table = Table::join(&[("descr", &a), ("oper", &b)]);
        assert_eq!(
            table.to_string(),
            "index  descr      oper\n\
             1      lo         up\n\
             10     Ethernet0  -\n"
        );
    }

    #[test]
    fn test_map_column() {
        let a = report(IF_OPER_STATUS, WalkStatus::Done, &[("1", "1"), ("2", "2")]);
        let mut table = Table::join(&[("oper", &a)]);
        table.map_column(0, render_status);
        assert_eq!(table.rows()[1].cells[0].as_deref(), Some("down"));
    }

    #[test]
    fn test_status_names() {
        assert_eq!(interface_status_name(1), Some("up"));
        assert_eq!(interface_status_name(7), Some("lowerLayerDown"));
        assert_eq!(interface_status_name(0), None);
        assert_eq!(render_status("5"), "dormant");
        assert_eq!(render_status("42"), "42");
        assert_eq!(render_status("n/a"), "n/a");
    }

    #[test]
    fn test_interface_table_from_reports() {
        let reports = [
            report(IF_OPER_STATUS, WalkStatus::Done, &[("1", "1"), ("2", "7")]),
            report(IF_DESCR, WalkStatus::Done, &[("1", "lo"), ("2", "eth0")]),
            report(IF_ADMIN_STATUS, WalkStatus::Done, &[("1", "1"), ("2", "2")]),
        ];
        let view = InterfaceTable::from_reports(&reports);
        assert!(view.is_complete());
        assert_eq!(
            view.rows()[1],
            InterfaceRow {
                index: "2".into(),
                name: Some("eth0".into()),
                admin_status: Some("down".into()),
                oper_status: Some("lowerLayerDown".into()),
            }
        );
    }

    #[test]
    fn test_interface_table_partial() {
        let reports = [
            report(IF_DESCR, WalkStatus::TimedOut, &[("1", "lo")]),
            report(IF_ADMIN_STATUS, WalkStatus::Done, &[("1", "1")]),
        ];
        let view = InterfaceTable::from_reports(&reports);
        assert!(!view.is_complete());
        assert_eq!(view.statuses().len(), 2);
        assert_eq!(view.rows()[0].oper_status, None);
        assert_eq!(view.rows()[0].admin_status.as_deref(), Some("up"));
    }

    #[test]
    fn test_columns_adds_three_roots() {
        let walker = InterfaceTable::columns(Walker::builder("192.0.2.1")).build();
        assert_eq!(walker.roots().len(), 3);
        assert_eq!(walker.roots()[0].arcs(), IF_DESCR);
    }
}
