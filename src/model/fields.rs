//! Request bodies for create and update.
//!
//! Foreign keys are sent as resource URIs (`/api/v1/experiment/3/`), which is
//! what the API expects on POST and PATCH.

use serde_json::{json, Map, Value};

use super::ResourceKind;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn new_experiment(
    title: &str,
    description: Option<&str>,
    institution: Option<&str>,
) -> Map<String, Value> {
    let mut fields = object(json!({ "title": title }));
    if let Some(description) = description {
        fields.insert("description".into(), description.into());
    }
    if let Some(institution) = institution {
        fields.insert("institution_name".into(), institution.into());
    }
    fields
}

pub fn experiment_changes(title: Option<&str>, description: Option<&str>) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(title) = title {
        fields.insert("title".into(), title.into());
    }
    if let Some(description) = description {
        fields.insert("description".into(), description.into());
    }
    fields
}

/// A new dataset in one experiment; `parameter_sets` is passed through as-is.
pub fn new_dataset(
    experiment_id: i64,
    description: &str,
    instrument_id: Option<i64>,
    parameter_sets: Option<Value>,
) -> Map<String, Value> {
    let mut fields = object(json!({
        "description": description,
        "experiments": [ResourceKind::Experiment.uri(experiment_id)],
        "immutable": false,
    }));
    if let Some(instrument_id) = instrument_id {
        fields.insert(
            "instrument".into(),
            ResourceKind::Instrument.uri(instrument_id).into(),
        );
    }
    if let Some(parameter_sets) = parameter_sets {
        fields.insert("parameter_sets".into(), parameter_sets);
    }
    fields
}

pub fn dataset_changes(description: &str) -> Map<String, Value> {
    object(json!({ "description": description }))
}

pub fn new_instrument(facility_id: i64, name: &str) -> Map<String, Value> {
    object(json!({
        "name": name,
        "facility": ResourceKind::Facility.uri(facility_id),
    }))
}

pub fn instrument_changes(name: &str) -> Map<String, Value> {
    object(json!({ "name": name }))
}

pub fn datafile_changes(md5sum: &str) -> Map<String, Value> {
    object(json!({ "md5sum": md5sum }))
}
