//! Resource types of the MyTardis API v1.
//!
//! Every resource shares one access pattern; what differs between them is
//! data, kept in a single table keyed by [`ResourceKind`]: the API path,
//! the display name, and which related list a `get` shows alongside the
//! record.
//!
//! # Example
//!
//! ```
//! use mytardis::model::ResourceKind;
//!
//! let kind: ResourceKind = "datafile".parse().unwrap();
//! assert_eq!(kind.path(), "dataset_file");
//! assert_eq!(kind.uri(7), "/api/v1/dataset_file/7/");
//! ```

mod endpoint;
pub mod fields;
mod record;
mod result_set;

pub use endpoint::{ApiEndpoint, ApiEndpoints};
pub use record::ResourceRecord;
pub use result_set::{Page, PageMeta, PageSource, ResultSet, ResultSetIter};

use std::fmt;
use std::str::FromStr;

/// A named REST entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Experiment,
    Dataset,
    DataFile,
    Instrument,
    Facility,
    Replica,
}

/// A list shown under a record in table mode, e.g. a dataset's datafiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Related {
    pub kind: ResourceKind,
    /// Filter field on `kind` that selects children of the parent id.
    pub filter: &'static str,
}

struct ResourceInfo {
    path: &'static str,
    display_name: &'static str,
    related: Option<Related>,
}

const EXPERIMENT: ResourceInfo = ResourceInfo {
    path: "experiment",
    display_name: "Experiment",
    related: Some(Related {
        kind: ResourceKind::Dataset,
        filter: "experiments__id",
    }),
};

const DATASET: ResourceInfo = ResourceInfo {
    path: "dataset",
    display_name: "Dataset",
    related: Some(Related {
        kind: ResourceKind::DataFile,
        filter: "dataset__id",
    }),
};

const DATAFILE: ResourceInfo = ResourceInfo {
    path: "dataset_file",
    display_name: "DataFile",
    related: None,
};

const INSTRUMENT: ResourceInfo = ResourceInfo {
    path: "instrument",
    display_name: "Instrument",
    related: None,
};

const FACILITY: ResourceInfo = ResourceInfo {
    path: "facility",
    display_name: "Facility",
    related: Some(Related {
        kind: ResourceKind::Instrument,
        filter: "facility__id",
    }),
};

const REPLICA: ResourceInfo = ResourceInfo {
    path: "replica",
    display_name: "Replica",
    related: None,
};

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Experiment,
        ResourceKind::Dataset,
        ResourceKind::DataFile,
        ResourceKind::Instrument,
        ResourceKind::Facility,
        ResourceKind::Replica,
    ];

    fn info(self) -> &'static ResourceInfo {
        match self {
            ResourceKind::Experiment => &EXPERIMENT,
            ResourceKind::Dataset => &DATASET,
            ResourceKind::DataFile => &DATAFILE,
            ResourceKind::Instrument => &INSTRUMENT,
            ResourceKind::Facility => &FACILITY,
            ResourceKind::Replica => &REPLICA,
        }
    }

    /// Path segment under `/api/v1/`.
    pub fn path(self) -> &'static str {
        self.info().path
    }

    /// Name used in table headers and status messages.
    pub fn display_name(self) -> &'static str {
        self.info().display_name
    }

    pub fn related(self) -> Option<Related> {
        self.info().related
    }

    /// Resource URI used for foreign keys, e.g. `/api/v1/facility/7/`.
    pub fn uri(self, id: i64) -> String {
        format!("/api/v1/{}/{}/", self.path(), id)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| {
                lowered == kind.path() || lowered == kind.display_name().to_ascii_lowercase()
            })
            .ok_or_else(|| format!("unknown resource '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_and_names() {
        assert_eq!(ResourceKind::DataFile.path(), "dataset_file");
        assert_eq!(ResourceKind::DataFile.display_name(), "DataFile");
        assert_eq!(ResourceKind::Facility.uri(7), "/api/v1/facility/7/");
    }

    #[test]
    fn parse_accepts_path_or_name() {
        assert_eq!("dataset_file".parse(), Ok(ResourceKind::DataFile));
        assert_eq!("DataFile".parse(), Ok(ResourceKind::DataFile));
        assert_eq!("experiment".parse(), Ok(ResourceKind::Experiment));
        assert!("sample".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn related_lists() {
        let related = ResourceKind::Dataset.related().expect("dataset has datafiles");
        assert_eq!(related.kind, ResourceKind::DataFile);
        assert_eq!(related.filter, "dataset__id");
        assert!(ResourceKind::DataFile.related().is_none());
    }
}
