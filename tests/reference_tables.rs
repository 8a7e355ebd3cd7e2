//! Integration tests for reference table loading and phone dissection.
//!
//! Uses the tables under `tests/fixtures/`.

use keshvar::Alpha2;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use wa_registration::events::{EventHub, EventName, RegistrationEvent};
use wa_registration::tables::UNKNOWN_NETWORK_CODE;
use wa_registration::{PhoneDissector, PhoneNumber, ReferenceTables, TableError};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn tables() -> Arc<ReferenceTables> {
    Arc::new(ReferenceTables::load_dir(fixtures()).unwrap())
}

fn number(digits: &str) -> PhoneNumber {
    PhoneNumber::new(digits).unwrap()
}

#[test]
fn test_load_fixture_tables() {
    let tables = tables();
    assert_eq!(tables.countries().len(), 14);
    assert_eq!(tables.networks().len(), 9);
}

#[test]
fn test_north_american_number() {
    let dissector = PhoneDissector::new(tables());
    let info = dissector.resolve(&number("14155550100")).unwrap();

    assert_eq!(info.country, "USA");
    assert_eq!(info.calling_code, "1");
    assert_eq!(info.national_number, "4155550100");
    assert_eq!(info.mobile_country_code, "310");
    assert_eq!(info.country(), Some(Alpha2::US.to_country()));
}

#[test]
fn test_caribbean_prefix_collapses_to_one() {
    let dissector = PhoneDissector::new(tables());
    let info = dissector.resolve(&number("12425550123")).unwrap();

    assert_eq!(info.country, "Bahamas");
    assert_eq!(info.calling_code, "1");
    assert_eq!(info.national_number, "2425550123");
}

#[test]
fn test_first_row_wins_over_later_rows() {
    // Canada shares prefix "1" with the USA row listed before it.
    let dissector = PhoneDissector::new(tables());
    let info = dissector.resolve(&number("16135550100")).unwrap();
    assert_eq!(info.country, "USA");
}

#[test]
fn test_reconstruction_for_every_fixture_country() {
    let dissector = PhoneDissector::new(tables());
    let samples = [
        "14155550100",
        "12465550100",
        "79161234567",
        "201001234567",
        "34600111222",
        "447700900123",
        "4915112345678",
        "5511987654321",
        "351912345678",
        "353851234567",
        "38344123456",
        "380501234567",
    ];

    for digits in samples {
        let info = dissector
            .resolve(&number(digits))
            .unwrap_or_else(|| panic!("no row for {digits}"));
        assert_eq!(info.full_number(), digits);
    }
}

#[test]
fn test_empty_locale_falls_back() {
    let dissector = PhoneDissector::new(tables());
    let info = dissector.resolve(&number("38344123456")).unwrap();

    assert_eq!(info.country, "Kosovo");
    assert_eq!(info.language_code(), "en");
    assert_eq!(info.locale_country_code(), "US");
    assert!(info.country().is_none());
}

#[test]
fn test_unknown_prefix_publishes_failure() {
    let dissector = PhoneDissector::new(tables());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut hub = EventHub::new();
    let sink = Arc::clone(&seen);
    hub.subscribe(EventName::DissectPhoneFailed, move |event: &RegistrationEvent| {
        sink.lock().unwrap().push(event.phone_number().to_string());
    });

    assert!(dissector.dissect(&number("999123"), &hub).is_none());
    assert_eq!(*seen.lock().unwrap(), vec!["999123".to_string()]);
}

#[test]
fn test_carrier_lookup() {
    let tables = tables();
    assert_eq!(tables.lookup_carrier("es", "Movistar"), "07");
    assert_eq!(tables.lookup_carrier("ru", "MTS"), "01");
    assert_eq!(tables.lookup_carrier("us", "AT&T"), "410");
    assert_eq!(tables.lookup_carrier("us", "Unknown"), UNKNOWN_NETWORK_CODE);
    // Keys are case-sensitive.
    assert_eq!(tables.lookup_carrier("ES", "Movistar"), UNKNOWN_NETWORK_CODE);
}

#[test]
fn test_missing_directory_is_load_error() {
    let err = ReferenceTables::load_dir(fixtures().join("missing")).unwrap_err();
    assert!(matches!(err, TableError::Io { .. }));
}
