//! Deterministic wire memo reference per brand.
//!
//! Incoming wires are matched to a brand by memo only, so the reference has
//! to be reproducible from the brand id alone:
//!
//! ```text
//! BW-{first 10 chars of base32(SHA-256(brand_id bytes))}
//! ```

use uuid::Uuid;

/// Prefix of every wire reference.
pub const WIRE_REFERENCE_PREFIX: &str = "BW-";

const WIRE_REFERENCE_LEN: usize = 10;

/// Derive the wire memo reference for a brand.
pub fn wire_reference(brand_id: Uuid) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, brand_id.as_bytes());
    let encoded = fast32::base32::RFC4648_NOPAD.encode(digest.as_ref());
    let short: String = encoded.chars().take(WIRE_REFERENCE_LEN).collect();
    format!("{WIRE_REFERENCE_PREFIX}{short}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_stable_per_brand() {
        let brand = Uuid::parse_str("0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c02").unwrap();
        let first = wire_reference(brand);
        let second = wire_reference(brand);
        assert_eq!(first, second);
        assert!(first.starts_with(WIRE_REFERENCE_PREFIX));
        assert_eq!(first.len(), WIRE_REFERENCE_PREFIX.len() + 10);
    }

    #[test]
    fn test_reference_differs_between_brands() {
        let a = Uuid::parse_str("0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c02").unwrap();
        let b = Uuid::parse_str("0195a4f2-3c1d-7e55-9a51-2b0f3f1e9c03").unwrap();
        assert_ne!(wire_reference(a), wire_reference(b));
    }
}
