pub mod addon;
pub mod config;
pub mod convert;
pub mod epg_changes;
pub mod error;
pub mod events;
pub mod host;
pub mod models;
pub mod negotiation;
pub mod registry;
pub mod relay;
pub mod session;
pub mod tracing_ext;
pub mod update;
