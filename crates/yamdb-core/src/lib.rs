//! Service plumbing shared by YaMDb binaries: health probes, request-id and
//! trace middleware, tracing setup, serde helpers and sea-orm extensions.

pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod tracing;
