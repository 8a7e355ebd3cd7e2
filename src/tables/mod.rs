//! Static reference tables used for phone dissection and carrier lookup.
//!
//! Both tables are plain comma-separated text. Quote characters are simply
//! stripped and every comma splits a field; there is no CSV escaping. Row
//! order is significant: every lookup returns the first matching row.
//!
//! # Example
//!
//! ```rust
//! use wa_registration::tables::ReferenceTables;
//!
//! let tables = ReferenceTables::parse(
//!     "\"USA\",\"1\",\"310|311\",\"US\",\"en\",\"260\"\n",
//!     "\"310\",\"310\",\"260\",\"260\",\"us\",\"United States\",\"1\",\"T-Mobile\"\n",
//! )
//! .unwrap();
//!
//! let row = tables.lookup_country("14155550100").unwrap();
//! assert_eq!(row.country, "USA");
//! assert_eq!(tables.lookup_carrier("us", "T-Mobile"), "260");
//! assert_eq!(tables.lookup_carrier("us", "Unknown"), "000");
//! ```

mod countries;
mod networks;

pub use countries::ReferenceRow;
pub use networks::CarrierRow;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Network code returned when no carrier row matches.
pub const UNKNOWN_NETWORK_CODE: &str = "000";

/// Default file name of the country table.
pub const COUNTRIES_FILE: &str = "countries.csv";

/// Default file name of the carrier table.
pub const NETWORKS_FILE: &str = "networkinfo.csv";

/// Errors raised while loading reference tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// Table file could not be read.
    #[error("Failed to read {table} table from {}: {source}", path.display())]
    Io {
        table: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Table contains a row that cannot be parsed.
    #[error("Malformed {table} table at line {line}: {reason}")]
    Malformed {
        table: &'static str,
        line: usize,
        reason: String,
    },

    /// Table has no rows at all.
    #[error("The {table} table is empty")]
    Empty { table: &'static str },
}

/// Split one raw table line into fields, dropping quote characters.
pub(crate) fn split_row(line: &str) -> Vec<String> {
    line.replace('"', "").split(',').map(str::to_string).collect()
}

/// Parse every non-blank line of `text` with `parse_row`.
fn parse_rows<T>(
    table: &'static str,
    text: &str,
    parse_row: impl Fn(&str, usize) -> Result<T, TableError>,
) -> Result<Vec<T>, TableError> {
    let rows = text
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| parse_row(line, line_no))
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(TableError::Empty { table });
    }
    Ok(rows)
}

fn read_table(table: &'static str, path: &Path) -> Result<String, TableError> {
    fs::read_to_string(path).map_err(|source| TableError::Io {
        table,
        path: path.to_path_buf(),
        source,
    })
}

/// Country and carrier tables, immutable after load.
///
/// Wrap in an `Arc` to share one loaded copy across many clients.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    countries: Vec<ReferenceRow>,
    networks: Vec<CarrierRow>,
}

impl ReferenceTables {
    /// Parse both tables from their text contents.
    pub fn parse(countries: &str, networks: &str) -> Result<Self, TableError> {
        Ok(Self {
            countries: parse_rows("countries", countries, ReferenceRow::parse)?,
            networks: parse_rows("networks", networks, CarrierRow::parse)?,
        })
    }

    /// Load both tables from explicit file paths.
    pub fn from_files(
        countries: impl AsRef<Path>,
        networks: impl AsRef<Path>,
    ) -> Result<Self, TableError> {
        let countries_text = read_table("countries", countries.as_ref())?;
        let networks_text = read_table("networks", networks.as_ref())?;
        let tables = Self::parse(&countries_text, &networks_text)?;

        #[cfg(feature = "tracing")]
        debug!(
            countries = tables.countries.len(),
            networks = tables.networks.len(),
            "Loaded reference tables"
        );

        Ok(tables)
    }

    /// Load `countries.csv` and `networkinfo.csv` from a directory.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, TableError> {
        let dir = dir.as_ref();
        Self::from_files(dir.join(COUNTRIES_FILE), dir.join(NETWORKS_FILE))
    }

    /// First country row, in file order, whose prefix starts `digits`.
    ///
    /// This is a plain prefix test, not a longest match: overlapping
    /// prefixes resolve to whichever row comes first in the table.
    pub fn lookup_country(&self, digits: &str) -> Option<&ReferenceRow> {
        self.countries.iter().find(|row| row.matches(digits))
    }

    /// Network code of the first carrier row matching `lc` and `carrier`.
    ///
    /// Returns [`UNKNOWN_NETWORK_CODE`] when nothing matches.
    pub fn lookup_carrier(&self, lc: &str, carrier: &str) -> &str {
        self.networks
            .iter()
            .find(|row| row.matches(lc, carrier))
            .map(|row| row.mobile_network_code.as_str())
            .unwrap_or(UNKNOWN_NETWORK_CODE)
    }

    /// All country rows in file order.
    pub fn countries(&self) -> &[ReferenceRow] {
        &self.countries
    }

    /// All carrier rows in file order.
    pub fn networks(&self) -> &[CarrierRow] {
        &self.networks
    }
}
