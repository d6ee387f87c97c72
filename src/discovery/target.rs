use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type LabelSet = BTreeMap<String, String>;

/// One entry of a Prometheus HTTP service discovery response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub targets: Vec<String>,
    pub labels: LabelSet,
}

/// Full discovery response, serialized as a bare JSON array.
pub type DiscoveryDocument = Vec<ScrapeTarget>;
