//! From raw compute inventory to Prometheus HTTP SD documents.

pub mod aggregator;
pub mod deriver;
pub mod labels;
pub mod nodes;
pub mod target;
