pub mod common;
mod discovery_flow;
