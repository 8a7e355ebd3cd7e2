//! Request parameter construction.
//!
//! All three endpoints share one parameter block (number, locale, identity,
//! a fixed set of device decoys and a random `pid`). The code request and
//! register steps add fresh nonce hashes; the code request also carries the
//! token and network codes.

use crate::phone::PhoneInfo;
use crate::transport::QueryParams;
use crate::types::{CodeMethod, Identity, VerificationCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use md5::Md5;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use std::ops::RangeInclusive;

/// Range the `pid` parameter is drawn from.
pub const PID_RANGE: RangeInclusive<u16> = 100..=9999;

/// Number of random bytes fed into each nonce hash.
const NONCE_SEED_LEN: usize = 20;

/// Device decoys sent after the identity/token block.
const DECOYS: [(&str, &str); 7] = [
    ("mistyped", "6"),
    ("network_radio_type", "1"),
    ("simnum", "1"),
    ("s", ""),
    ("copiedrc", "1"),
    ("hasinrc", "1"),
    ("rcmatch", "1"),
];

/// Random process id in [`PID_RANGE`].
pub fn random_pid() -> u16 {
    rand::thread_rng().gen_range(PID_RANGE)
}

fn nonce_seed() -> [u8; NONCE_SEED_LEN] {
    let mut seed = [0u8; NONCE_SEED_LEN];
    rand::thread_rng().fill_bytes(&mut seed);
    seed
}

/// Base64 of the SHA-256 digest of 20 fresh random bytes.
pub fn rchash() -> String {
    BASE64_STANDARD.encode(Sha256::digest(nonce_seed()))
}

/// Lowercase hex of the MD5 digest of 20 fresh random bytes.
pub fn anhash() -> String {
    hex::encode(Md5::digest(nonce_seed()))
}

/// What a request adds on top of the common block.
enum Extra<'a> {
    CodeRequest {
        token: &'a str,
        mnc: &'a str,
        method: CodeMethod,
    },
    CodeRegister {
        code: &'a VerificationCode,
    },
    CredentialsCheck,
}

fn build(info: &PhoneInfo, identity: &Identity, extra: Extra<'_>) -> QueryParams {
    let mut query = QueryParams::new();
    query
        .push("cc", info.calling_code.as_str())
        .push("in", info.national_number.as_str())
        .push("lg", info.language_code())
        .push("lc", info.locale_country_code())
        .push_binary("id", identity.as_bytes());

    if let Extra::CodeRequest { token, .. } = extra {
        query.push("token", token);
    }

    for (key, value) in DECOYS {
        query.push(key, value);
    }
    query.push("pid", random_pid().to_string());

    if !matches!(extra, Extra::CredentialsCheck) {
        query.push("rchash", rchash()).push("anhash", anhash());
    }

    query.push("extexist", "1").push("extstate", "1");

    match extra {
        Extra::CodeRequest { mnc, method, .. } => {
            query
                .push("mcc", info.mobile_country_code.as_str())
                .push("mnc", mnc)
                .push("sim_mcc", info.mobile_country_code.as_str())
                .push("sim_mnc", mnc)
                .push("method", method.as_str());
        }
        Extra::CodeRegister { code } => {
            query.push("code", code.as_str());
        }
        Extra::CredentialsCheck => {}
    }

    query
}

/// Parameters of a code request.
pub fn code_request(
    info: &PhoneInfo,
    identity: &Identity,
    token: &str,
    mnc: &str,
    method: CodeMethod,
) -> QueryParams {
    build(info, identity, Extra::CodeRequest { token, mnc, method })
}

/// Parameters of a code registration.
pub fn code_register(info: &PhoneInfo, identity: &Identity, code: &VerificationCode) -> QueryParams {
    build(info, identity, Extra::CodeRegister { code })
}

/// Parameters of a credential check.
pub fn credentials_check(info: &PhoneInfo, identity: &Identity) -> QueryParams {
    build(info, identity, Extra::CredentialsCheck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ParamValue;

    fn info() -> PhoneInfo {
        PhoneInfo {
            country: "Spain".to_string(),
            calling_code: "34".to_string(),
            national_number: "600111222".to_string(),
            mobile_country_code: "214".to_string(),
            iso3166: "ES".to_string(),
            iso639: "es".to_string(),
            mobile_network_code: "007".to_string(),
        }
    }

    fn identity() -> Identity {
        Identity::new(vec![7u8; 20]).unwrap()
    }

    const COMMON: [&str; 5] = ["cc", "in", "lg", "lc", "id"];

    #[test]
    fn test_pid_in_range() {
        for _ in 0..1000 {
            assert!(PID_RANGE.contains(&random_pid()));
        }
    }

    #[test]
    fn test_rchash_shape() {
        let hash = rchash();
        // 32-byte digest in padded base64.
        assert_eq!(hash.len(), 44);
        assert_eq!(BASE64_STANDARD.decode(&hash).unwrap().len(), 32);
        assert_ne!(hash, rchash());
    }

    #[test]
    fn test_anhash_shape() {
        let hash = anhash();
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(hash, anhash());
    }

    #[test]
    fn test_code_request_params() {
        let query = code_request(&info(), &identity(), "tok", "001", CodeMethod::Voice);

        let keys: Vec<_> = query.keys().collect();
        assert_eq!(
            keys,
            vec![
                "cc",
                "in",
                "lg",
                "lc",
                "id",
                "token",
                "mistyped",
                "network_radio_type",
                "simnum",
                "s",
                "copiedrc",
                "hasinrc",
                "rcmatch",
                "pid",
                "rchash",
                "anhash",
                "extexist",
                "extstate",
                "mcc",
                "mnc",
                "sim_mcc",
                "sim_mnc",
                "method",
            ]
        );
        assert_eq!(query.get("cc"), Some("34"));
        assert_eq!(query.get("in"), Some("600111222"));
        assert_eq!(query.get("lg"), Some("es"));
        assert_eq!(query.get("lc"), Some("ES"));
        assert_eq!(query.value("id"), Some(&ParamValue::Binary(vec![7u8; 20])));
        assert_eq!(query.get("token"), Some("tok"));
        assert_eq!(query.get("mistyped"), Some("6"));
        assert_eq!(query.get("s"), Some(""));
        assert_eq!(query.get("mcc"), Some("214"));
        assert_eq!(query.get("mnc"), Some("001"));
        assert_eq!(query.get("sim_mnc"), Some("001"));
        assert_eq!(query.get("method"), Some("voice"));
    }

    #[test]
    fn test_code_register_params() {
        let code = VerificationCode::new("123-456");
        let query = code_register(&info(), &identity(), &code);

        for key in COMMON {
            assert!(query.contains(key), "missing {key}");
        }
        assert_eq!(query.get("code"), Some("123456"));
        assert!(query.contains("rchash"));
        assert!(query.contains("anhash"));
        assert!(!query.contains("token"));
        assert!(!query.contains("method"));
    }

    #[test]
    fn test_credentials_check_params() {
        let query = credentials_check(&info(), &identity());

        for key in COMMON {
            assert!(query.contains(key), "missing {key}");
        }
        assert!(query.contains("pid"));
        assert!(query.contains("extstate"));
        assert!(!query.contains("code"));
        assert!(!query.contains("rchash"));
        assert!(!query.contains("anhash"));
        assert!(!query.contains("token"));
    }

    #[test]
    fn test_locale_fallbacks() {
        let mut bare = info();
        bare.iso3166.clear();
        bare.iso639.clear();

        let query = credentials_check(&bare, &identity());
        assert_eq!(query.get("lg"), Some("en"));
        assert_eq!(query.get("lc"), Some("US"));
    }
}
