//! Text rendering of records, result sets and the API root listing.
//!
//! JSON output reproduces what the server sent, key order included. For a
//! [`ResultSet`] that means the first page's envelope, as fetched; walking
//! every page is opt-in through [`render_all`].
//!
//! Table output uses a fixed column set per resource kind and the
//! texttable layout of [`Table`].

mod columns;
mod size;
mod table;

pub use size::human_readable_size;
pub use table::{Align, Table};

use serde_json::Value;

use crate::error::MytardisError;
use crate::model::{ApiEndpoints, ResourceKind, ResourceRecord, ResultSet};

/// Output encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderFormat {
    Json,
    #[default]
    Table,
}

impl RenderFormat {
    /// `--json` selects JSON; tables are the default.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            RenderFormat::Json
        } else {
            RenderFormat::Table
        }
    }
}

/// Anything that can be printed as JSON or a table.
pub trait Render {
    fn render(&self, format: RenderFormat) -> String;
}

fn pretty(value: &Value) -> String {
    format!("{value:#}")
}

impl Render for ResourceRecord {
    fn render(&self, format: RenderFormat) -> String {
        match format {
            RenderFormat::Json => pretty(&self.to_json()),
            RenderFormat::Table => record_table(self).render(),
        }
    }
}

impl Render for ResultSet<'_> {
    fn render(&self, format: RenderFormat) -> String {
        match format {
            RenderFormat::Json => pretty(self.first_page_json()),
            RenderFormat::Table => list_block(self, self.first_page_records()),
        }
    }
}

impl Render for ApiEndpoints {
    fn render(&self, format: RenderFormat) -> String {
        match format {
            RenderFormat::Json => pretty(&self.json),
            RenderFormat::Table => {
                let mut table = Table::new(
                    ["API Endpoint (Model)", "List Endpoint", "Schema"],
                    vec![Align::Left; 3],
                );
                for endpoint in &self.endpoints {
                    table.add_row(vec![
                        endpoint.model.clone(),
                        endpoint.list_endpoint.clone(),
                        endpoint.schema.clone(),
                    ]);
                }
                table.render()
            }
        }
    }
}

/// Renders every record of `set` from its first offset on, fetching the
/// remaining pages.
///
/// JSON output is a flat array of records rather than a page envelope.
pub fn render_all(set: &ResultSet<'_>, format: RenderFormat) -> Result<String, MytardisError> {
    let records = set
        .iter_from(set.offset())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match format {
        RenderFormat::Json => pretty(&Value::Array(
            records.iter().map(ResourceRecord::to_json).collect(),
        )),
        RenderFormat::Table => list_block(set, &records),
    })
}

/// A list table for `records` of one kind.
pub fn records_table(kind: ResourceKind, records: &[ResourceRecord]) -> Table {
    let columns = columns::list_columns(kind);
    let align = (0..columns.len())
        .map(|i| if i == 0 { Align::Right } else { Align::Left })
        .collect();
    let mut table = Table::new(columns.iter().map(|c| c.title), align);
    for record in records {
        table.add_row(columns.iter().map(|c| c.cell.text(record)).collect());
    }
    table
}

fn record_table(record: &ResourceRecord) -> Table {
    let kind = record.kind();
    let mut table = Table::new(
        [format!("{} field", kind.display_name()), "Value".to_string()],
        vec![Align::Left, Align::Left],
    );
    for row in columns::detail_rows(kind) {
        table.add_row(vec![row.title.to_string(), row.cell.text(record)]);
    }
    table
}

fn list_block(set: &ResultSet<'_>, records: &[ResourceRecord]) -> String {
    let mut out = format!(
        "Model: {}\nQuery: {}\nTotal Count: {}\nLimit: {}\nOffset: {}\n\n",
        set.kind().display_name(),
        set.url(),
        set.len(),
        set.limit(),
        set.offset()
    );
    out.push_str(&records_table(set.kind(), records).render());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_json_round_trips() {
        let original = json!({
            "id": 5,
            "title": "Test Experiment",
            "description": null,
            "institution_name": "Monash University",
            "resource_uri": "/api/v1/experiment/5/"
        });
        let record =
            ResourceRecord::from_json(ResourceKind::Experiment, original.clone(), "u").expect("record");
        let text = record.render(RenderFormat::Json);
        let decoded: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(decoded, original);
        assert!(text.find("\"title\"") < text.find("\"institution_name\""));
    }

    #[test]
    fn facility_detail_table() {
        let record = ResourceRecord::from_json(
            ResourceKind::Facility,
            json!({"id": 7, "name": "Imaging", "manager_group": {"id": 1, "name": "imaging-admins"}}),
            "u",
        )
        .expect("record");
        let expected = [
            "+----------------+----------------+",
            "| Facility field |     Value      |",
            "+================+================+",
            "| ID             | 7              |",
            "+----------------+----------------+",
            "| Name           | Imaging        |",
            "+----------------+----------------+",
            "| Manager Group  | imaging-admins |",
            "+----------------+----------------+",
        ]
        .join("\n");
        assert_eq!(record.render(RenderFormat::Table), expected);
    }

    #[test]
    fn format_from_flag() {
        assert_eq!(RenderFormat::from_json_flag(true), RenderFormat::Json);
        assert_eq!(RenderFormat::from_json_flag(false), RenderFormat::Table);
        assert_eq!(RenderFormat::default(), RenderFormat::Table);
    }
}
