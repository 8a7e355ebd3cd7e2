//! Phone number dissection against the country table.

use crate::events::{EventHub, RegistrationEvent};
use crate::tables::ReferenceTables;
use crate::types::PhoneNumber;
use keshvar::Country;
use serde::Serialize;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Language sent when the country row has no ISO639 code.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Country sent when the country row has no ISO3166 code.
pub const FALLBACK_COUNTRY: &str = "US";

/// Locale and network data derived from a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneInfo {
    /// Country display name from the table.
    pub country: String,
    /// Calling code ("1" for every North American row).
    pub calling_code: String,
    /// Number without the calling code.
    pub national_number: String,
    /// Canonical mobile country code.
    pub mobile_country_code: String,
    /// ISO3166 country code, possibly empty.
    pub iso3166: String,
    /// ISO639 language code, possibly empty.
    pub iso639: String,
    /// Default mobile network code of the country.
    pub mobile_network_code: String,
}

impl PhoneInfo {
    /// Value of the `lg` request parameter.
    pub fn language_code(&self) -> &str {
        if self.iso639.is_empty() {
            FALLBACK_LANGUAGE
        } else {
            &self.iso639
        }
    }

    /// Value of the `lc` request parameter.
    pub fn locale_country_code(&self) -> &str {
        if self.iso3166.is_empty() {
            FALLBACK_COUNTRY
        } else {
            &self.iso3166
        }
    }

    /// Calling code followed by the national number.
    pub fn full_number(&self) -> String {
        format!("{}{}", self.calling_code, self.national_number)
    }

    /// Country resolved from the ISO3166 code, if it is a known one.
    pub fn country(&self) -> Option<Country> {
        Country::try_from(self.iso3166.to_ascii_uppercase().as_str()).ok()
    }
}

/// Resolves phone numbers to [`PhoneInfo`] using shared reference tables.
#[derive(Debug, Clone)]
pub struct PhoneDissector {
    tables: Arc<ReferenceTables>,
}

impl PhoneDissector {
    /// Create a dissector over `tables`.
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self { tables }
    }

    /// Tables backing this dissector.
    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Dissect `number`, publishing `onDissectPhone` or `onDissectPhoneFailed`.
    ///
    /// Returns `None` when no country row matches.
    pub fn dissect<R>(&self, number: &PhoneNumber, events: &EventHub<R>) -> Option<PhoneInfo> {
        let Some(info) = self.resolve(number) else {
            #[cfg(feature = "tracing")]
            debug!(phone_number = %number, "No country prefix matches phone number");

            events.publish(&RegistrationEvent::DissectPhoneFailed {
                phone_number: number.clone(),
            });
            return None;
        };

        #[cfg(feature = "tracing")]
        debug!(
            phone_number = %number,
            country = %info.country,
            calling_code = %info.calling_code,
            mcc = %info.mobile_country_code,
            "Dissected phone number"
        );

        events.publish(&RegistrationEvent::DissectPhone {
            phone_number: number.clone(),
            info: info.clone(),
        });
        Some(info)
    }

    /// Dissect `number` without publishing anything.
    pub fn resolve(&self, number: &PhoneNumber) -> Option<PhoneInfo> {
        let digits = number.as_str();
        let row = self.tables.lookup_country(digits)?;
        let calling_code = row.calling_code();

        Some(PhoneInfo {
            country: row.country.clone(),
            calling_code: calling_code.to_string(),
            national_number: digits[calling_code.len()..].to_string(),
            mobile_country_code: row.mobile_country_code().to_string(),
            iso3166: row.iso3166.clone(),
            iso639: row.iso639.clone(),
            mobile_network_code: row.mobile_network_code.clone(),
        })
    }
}
