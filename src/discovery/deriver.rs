//! Turns one compute instance into Prometheus scrape targets.
//!
//! Two modes exist:
//!
//! - [`DiscoveryMode::Passthrough`] (default): every instance with an address
//!   becomes exactly one target `<address>`, labelled with its identity plus all
//!   of its labels and metadata. Selection is left to relabelling rules on the
//!   Prometheus side.
//! - [`DiscoveryMode::Exporter`] (legacy): only instances carrying a
//!   `prometheus_job` label are exposed, with one `<address>:<port>` target per
//!   `prometheus_*_port` label.
//!
//! Derivation is pure and never fails: instances without an address are skipped.

use serde::Deserialize;
use tracing::warn;

use crate::cloud::model::Instance;
use crate::discovery::labels::{insert_label, merge_labels};
use crate::discovery::target::{LabelSet, ScrapeTarget};

pub const EXPORTER_PORT_PREFIX: &str = "prometheus_";
pub const EXPORTER_PORT_SUFFIX: &str = "_port";
pub const JOB_LABEL: &str = "prometheus_job";

/// Accepted exporter port values. 65536 is deliberately accepted.
const EXPORTER_PORT_RANGE: std::ops::RangeInclusive<i64> = 0..=65536;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    #[default]
    Passthrough,
    Exporter,
}

/// Zero or more targets for `instance` according to `mode`.
pub fn derive_targets(instance: &Instance, mode: DiscoveryMode) -> Vec<ScrapeTarget> {
    let Some(address) = instance.primary_address() else {
        warn!(
            instance_id = %instance.id,
            interfaces = instance.network_interfaces.len(),
            "instance has no primary ipv4 address, skipping"
        );
        return Vec::new();
    };

    let target = match mode {
        DiscoveryMode::Passthrough => Some(passthrough_target(instance, address)),
        DiscoveryMode::Exporter => exporter_target(instance, address),
    };
    target.into_iter().collect()
}

fn passthrough_target(instance: &Instance, address: &str) -> ScrapeTarget {
    let mut labels = LabelSet::new();
    insert_label(&mut labels, "id", &instance.id);
    insert_label(&mut labels, "folder_id", &instance.folder_id);
    insert_label(&mut labels, "zone_id", &instance.zone_id);
    insert_label(&mut labels, "fqdn", &instance.fqdn);
    if let Some(name) = instance.name.as_deref().filter(|name| !name.is_empty()) {
        insert_label(&mut labels, "name", name);
    }

    // metadata goes last so it wins over labels
    if let Some(instance_labels) = &instance.labels {
        merge_labels(&mut labels, instance_labels);
    }
    if let Some(metadata) = &instance.metadata {
        merge_labels(&mut labels, metadata);
    }

    ScrapeTarget { targets: vec![address.to_owned()], labels }
}

fn exporter_target(instance: &Instance, address: &str) -> Option<ScrapeTarget> {
    let instance_labels = instance.labels.as_ref();

    let job = instance_labels
        .and_then(|labels| labels.get(JOB_LABEL))
        .filter(|job| !job.is_empty())?;

    let targets: Vec<String> = instance_labels
        .into_iter()
        .flatten()
        .filter(|(key, _)| is_exporter_port_key(key))
        .filter(|(_, value)| is_exporter_port(value))
        .map(|(_, port)| format!("{}:{}", address, port))
        .collect();
    if targets.is_empty() {
        return None;
    }

    let mut labels = LabelSet::new();
    insert_label(&mut labels, "yc_id", &instance.id);
    insert_label(&mut labels, "yc_folder_id", &instance.folder_id);
    insert_label(&mut labels, "yc_zone_id", &instance.zone_id);
    insert_label(&mut labels, "yc_fqdn", &instance.fqdn);
    if let Some(name) = instance.name.as_deref().filter(|name| !name.is_empty()) {
        insert_label(&mut labels, "hostname", name);
    }
    insert_label(&mut labels, "job", job);

    Some(ScrapeTarget { targets, labels })
}

fn is_exporter_port_key(key: &str) -> bool {
    key.starts_with(EXPORTER_PORT_PREFIX) && key.ends_with(EXPORTER_PORT_SUFFIX)
}

/// The value is kept verbatim in the target, it only has to parse as an in-range integer.
fn is_exporter_port(value: &str) -> bool {
    parse_port(value).is_some_and(|port| EXPORTER_PORT_RANGE.contains(&port))
}

/// Integer literal with optional sign and surrounding whitespace. Single `_`
/// between digits is allowed as a group separator (`9_100`).
fn parse_port(value: &str) -> Option<i64> {
    let value = value.trim();
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    value.replace('_', "").parse().ok()
}
