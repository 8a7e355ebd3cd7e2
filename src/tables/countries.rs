//! Country reference table.

use super::{TableError, split_row};
use keshvar::Country;

/// Minimum number of fields a country row must carry.
const COUNTRY_FIELDS: usize = 6;

/// One row of the country table.
///
/// Field order on disk: country name, calling-code prefix, pipe-delimited
/// mobile country codes, ISO3166, ISO639, default mobile network code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    /// Country display name.
    pub country: String,
    /// Calling-code prefix as stored in the table (e.g. "1", "1242", "44").
    pub prefix: String,
    /// Raw `|`-separated list of mobile country codes.
    pub mobile_country_codes: String,
    /// ISO3166 alpha-2 country code, possibly empty.
    pub iso3166: String,
    /// ISO639 language code, possibly empty.
    pub iso639: String,
    /// Default mobile network code.
    pub mobile_network_code: String,
}

impl ReferenceRow {
    pub(crate) fn parse(line: &str, line_no: usize) -> Result<Self, TableError> {
        let fields = split_row(line);
        if fields.len() < COUNTRY_FIELDS {
            return Err(TableError::Malformed {
                table: "countries",
                line: line_no,
                reason: format!(
                    "expected at least {COUNTRY_FIELDS} fields, found {}",
                    fields.len()
                ),
            });
        }
        if fields[1].is_empty() {
            return Err(TableError::Malformed {
                table: "countries",
                line: line_no,
                reason: "empty calling-code prefix".to_string(),
            });
        }

        Ok(Self {
            country: fields[0].to_string(),
            prefix: fields[1].to_string(),
            mobile_country_codes: fields[2].to_string(),
            iso3166: fields[3].to_string(),
            iso639: fields[4].to_string(),
            mobile_network_code: fields[5].to_string(),
        })
    }

    /// Whether this row's prefix starts `digits`.
    pub fn matches(&self, digits: &str) -> bool {
        digits.starts_with(self.prefix.as_str())
    }

    /// Calling code used on the wire.
    ///
    /// North American Numbering Plan rows are stored with their full area
    /// prefix ("1242", "1876", ...) but always dial as "1".
    pub fn calling_code(&self) -> &str {
        if self.prefix.starts_with('1') {
            "1"
        } else {
            &self.prefix
        }
    }

    /// Canonical mobile country code: the first `|`-separated entry.
    pub fn mobile_country_code(&self) -> &str {
        self.mobile_country_codes
            .split('|')
            .next()
            .unwrap_or_default()
    }

    /// Resolve the ISO3166 field to a known country.
    pub fn iso_country(&self) -> Option<Country> {
        Country::try_from(self.iso3166.to_ascii_uppercase().as_str()).ok()
    }
}
