//! Exporters turning a condition back into user input.
//!
//! Both forms round-trip: processing the exported input with the matching
//! input processor yields a condition equal to the exported one.

mod string_query;
mod structured;

pub use string_query::StringQueryExporter;
pub use structured::StructuredExporter;
