//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod table;

/// Message shown for an empty list in table format
pub const EMPTY_LIST_MESSAGE: &str = "No results found.";

/// Types that can be rendered in any [`OutputFormat`]
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

impl<T: Tabled + Serialize> Formattable for Vec<T> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(table::format_table(self, EMPTY_LIST_MESSAGE)),
            OutputFormat::Json => Ok(json::format_json(self)?),
        }
    }
}
