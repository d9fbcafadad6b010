//! Document-search backend.
//!
//! [`EsConditionGenerator`] renders a condition as an Elasticsearch query
//! document. The output is the query structure only; sending it is up to
//! the caller.

mod conversion;
mod generator;

pub use conversion::{DocumentConversion, DocumentHints, QueryTarget, json_value};
pub use generator::EsConditionGenerator;
