//! Utility layer for a FHIR-simulation web service.
//!
//! - `middleware::bearer`: gates requests on an optional signed bearer token
//! - `token`: decoding helpers for launch/sim arguments and raw tokens
//! - `format`: small string/number/date coercion helpers
//! - `files`: promise-style async file and directory helpers
//! - `response`: FHIR OperationOutcome and templated error replies
//!
//! Everything takes an explicit [`config::Config`]; there is no process-wide
//! singleton.

pub mod config;
pub mod error;
pub mod files;
pub mod format;
pub mod middleware;
pub mod response;
pub mod startup;
pub mod state;
pub mod token;
