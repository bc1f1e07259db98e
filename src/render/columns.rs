//! Fixed table columns for each resource kind.

use serde_json::Value;

use super::size::human_readable_size;
use crate::model::{ResourceKind, ResourceRecord};

/// How a cell's text is pulled out of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cell {
    Id,
    Field(&'static str),
    /// A field of a nested object; a bare resource URI is shown as-is.
    Nested(&'static str, &'static str),
    /// A field of the first entry in `replicas`.
    FirstReplica(&'static str),
    /// A byte count, shown with [`human_readable_size`].
    Size(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Column {
    pub title: &'static str,
    pub cell: Cell,
}

const fn col(title: &'static str, cell: Cell) -> Column {
    Column { title, cell }
}

const EXPERIMENT_LIST: &[Column] = &[
    col("ID", Cell::Id),
    col("Title", Cell::Field("title")),
    col("Institution", Cell::Field("institution_name")),
    col("Description", Cell::Field("description")),
];

const EXPERIMENT_DETAIL: &[Column] = &[
    col("ID", Cell::Id),
    col("Institution", Cell::Field("institution_name")),
    col("Title", Cell::Field("title")),
    col("Description", Cell::Field("description")),
];

const DATASET_LIST: &[Column] = &[
    col("Dataset ID", Cell::Id),
    col("Experiment(s)", Cell::Field("experiments")),
    col("Description", Cell::Field("description")),
    col("Instrument", Cell::Nested("instrument", "name")),
];

const DATASET_DETAIL: &[Column] = &[
    col("ID", Cell::Id),
    col("Experiment(s)", Cell::Field("experiments")),
    col("Description", Cell::Field("description")),
    col("Instrument", Cell::Nested("instrument", "name")),
];

const DATAFILE_LIST: &[Column] = &[
    col("DataFile ID", Cell::Id),
    col("Filename", Cell::Field("filename")),
    col("Storage Box", Cell::FirstReplica("location")),
    col("URI", Cell::FirstReplica("uri")),
    col("Verified", Cell::FirstReplica("verified")),
    col("Size", Cell::Size("size")),
    col("MD5 Sum", Cell::Field("md5sum")),
];

const DATAFILE_DETAIL: &[Column] = &[
    col("ID", Cell::Id),
    col("Dataset", Cell::Field("dataset")),
    col("Storage Box", Cell::FirstReplica("location")),
    col("Directory", Cell::Field("directory")),
    col("Filename", Cell::Field("filename")),
    col("URI", Cell::FirstReplica("uri")),
    col("Verified", Cell::FirstReplica("verified")),
    col("Size", Cell::Size("size")),
    col("MD5 Sum", Cell::Field("md5sum")),
];

const INSTRUMENT_COLUMNS: &[Column] = &[
    col("ID", Cell::Id),
    col("Name", Cell::Field("name")),
    col("Facility", Cell::Nested("facility", "name")),
];

const FACILITY_COLUMNS: &[Column] = &[
    col("ID", Cell::Id),
    col("Name", Cell::Field("name")),
    col("Manager Group", Cell::Nested("manager_group", "name")),
];

const REPLICA_COLUMNS: &[Column] = &[
    col("ID", Cell::Id),
    col("DataFile", Cell::Field("datafile")),
    col("URI", Cell::Field("uri")),
    col("Location", Cell::Field("location")),
    col("Verified", Cell::Field("verified")),
];

/// Columns of a list table; the first one is right-aligned.
pub(crate) fn list_columns(kind: ResourceKind) -> &'static [Column] {
    match kind {
        ResourceKind::Experiment => EXPERIMENT_LIST,
        ResourceKind::Dataset => DATASET_LIST,
        ResourceKind::DataFile => DATAFILE_LIST,
        ResourceKind::Instrument => INSTRUMENT_COLUMNS,
        ResourceKind::Facility => FACILITY_COLUMNS,
        ResourceKind::Replica => REPLICA_COLUMNS,
    }
}

/// Rows of a single-record `field | value` table.
pub(crate) fn detail_rows(kind: ResourceKind) -> &'static [Column] {
    match kind {
        ResourceKind::Experiment => EXPERIMENT_DETAIL,
        ResourceKind::Dataset => DATASET_DETAIL,
        ResourceKind::DataFile => DATAFILE_DETAIL,
        ResourceKind::Instrument => INSTRUMENT_COLUMNS,
        ResourceKind::Facility => FACILITY_COLUMNS,
        ResourceKind::Replica => REPLICA_COLUMNS,
    }
}

impl Cell {
    pub(crate) fn text(self, record: &ResourceRecord) -> String {
        match self {
            Cell::Id => record.id().to_string(),
            Cell::Field(name) => record.field(name).map(display_value).unwrap_or_default(),
            Cell::Nested(name, inner) => match record.field(name) {
                Some(Value::Object(object)) => {
                    object.get(inner).map(display_value).unwrap_or_default()
                }
                Some(other) => display_value(other),
                None => String::new(),
            },
            Cell::FirstReplica(name) => record
                .field("replicas")
                .and_then(Value::as_array)
                .and_then(|replicas| replicas.first())
                .and_then(|replica| replica.get(name))
                .map(display_value)
                .unwrap_or_default(),
            Cell::Size(name) => match record.field(name) {
                Some(value) => size_text(value),
                None => String::new(),
            },
        }
    }
}

fn size_text(value: &Value) -> String {
    let bytes = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match bytes {
        Some(bytes) => human_readable_size(bytes),
        None => display_value(value),
    }
}

/// Plain-text form of a JSON value for a table cell.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}
