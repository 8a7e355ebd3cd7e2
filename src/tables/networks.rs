//! Carrier (mobile network) reference table.

use super::{TableError, split_row};

/// Minimum number of fields a carrier row must carry.
const CARRIER_FIELDS: usize = 8;

/// One row of the carrier table.
///
/// Field order on disk: mcc, mcc (decimal), mnc, mnc (decimal), lowercase
/// country code, country name, calling code, carrier name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierRow {
    /// Mobile country code.
    pub mobile_country_code: String,
    /// Mobile network code.
    pub mobile_network_code: String,
    /// Lowercase locale code the row is keyed by (e.g. "us", "es").
    pub lc: String,
    /// Country display name.
    pub country: String,
    /// Calling code of the country.
    pub calling_code: String,
    /// Carrier display name (e.g. "MTS", "Movistar").
    pub carrier: String,
}

impl CarrierRow {
    pub(crate) fn parse(line: &str, line_no: usize) -> Result<Self, TableError> {
        let fields = split_row(line);
        if fields.len() < CARRIER_FIELDS {
            return Err(TableError::Malformed {
                table: "networks",
                line: line_no,
                reason: format!(
                    "expected at least {CARRIER_FIELDS} fields, found {}",
                    fields.len()
                ),
            });
        }

        Ok(Self {
            mobile_country_code: fields[0].to_string(),
            mobile_network_code: fields[2].to_string(),
            lc: fields[4].to_string(),
            country: fields[5].to_string(),
            calling_code: fields[6].to_string(),
            carrier: fields[7].to_string(),
        })
    }

    /// Exact, case-sensitive match on locale code and carrier name.
    pub fn matches(&self, lc: &str, carrier: &str) -> bool {
        self.lc == lc && self.carrier == carrier
    }
}
