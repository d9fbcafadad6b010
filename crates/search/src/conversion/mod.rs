//! Built-in value conversions.
//!
//! A conversion changes how a backend renders a field. The field's runtime
//! value selects a [`ConversionStrategy`] once per value; the strategy then
//! decides both the column and the value rendering, so the two always agree.

mod age;
mod cast;

use serde::{Deserialize, Serialize};

pub use age::{AgeDateConversion, SQLITE_AGE_FUNCTION};
pub use cast::CastConversion;

/// Rendering selected by a conversion for one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionStrategy {
    /// Column and value are used unchanged.
    #[default]
    Direct,
    /// Column and value are compared as dates.
    AsDate,
    /// The column holds a date; the value is an age in whole years.
    AsAge,
    /// Conversion-defined rendering.
    Custom(u32),
}
