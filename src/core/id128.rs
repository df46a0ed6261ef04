//! 128-bit message identifiers
//!
//! Ids are written as 32 hex digits (`fc2e22bc6ee647b6b90729ab34a250b1`) or in
//! dashed UUID form (`fc2e22bc-6ee6-47b6-b907-29ab34a250b1`). Both parse to the
//! same 16 bytes; display always uses the undashed lowercase form.

use crate::error::{CatalogError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Raw 16-byte identifier, ordered by its bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id128(pub [u8; 16]);

impl Id128 {
    pub const SIZE: usize = 16;

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Id128(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Parse an id, accepting both the plain and the dashed form
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_bytes(s.as_bytes()).ok_or_else(|| CatalogError::InvalidId(s.to_string()))
    }

    fn parse_bytes(s: &[u8]) -> Option<Self> {
        let dashed = match s.len() {
            32 => false,
            36 => true,
            _ => return None,
        };

        let mut out = [0u8; 16];
        let mut pos = 0;
        for (n, byte) in out.iter_mut().enumerate() {
            if dashed && matches!(n, 4 | 6 | 8 | 10) {
                if s[pos] != b'-' {
                    return None;
                }
                pos += 1;
            }
            let hi = hex_value(s[pos])?;
            let lo = hex_value(s[pos + 1])?;
            *byte = (hi << 4) | lo;
            pos += 2;
        }

        Some(Id128(out))
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for Id128 {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        Id128::parse(s)
    }
}

impl fmt::Display for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for Id128 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "fc2e22bc6ee647b6b90729ab34a250b1";

    #[test]
    fn test_parse_plain() {
        let id = Id128::parse(PLAIN).unwrap();
        assert_eq!(id.0[0], 0xfc);
        assert_eq!(id.0[15], 0xb1);
        assert_eq!(id.to_string(), PLAIN);
    }

    #[test]
    fn test_parse_dashed_matches_plain() {
        let dashed = Id128::parse("fc2e22bc-6ee6-47b6-b907-29ab34a250b1").unwrap();
        assert_eq!(dashed, Id128::parse(PLAIN).unwrap());
    }

    #[test]
    fn test_parse_uppercase() {
        let id = Id128::parse("FC2E22BC6EE647B6B90729AB34A250B1").unwrap();
        assert_eq!(id.to_string(), PLAIN);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Id128::parse("").is_err());
        assert!(Id128::parse("fc2e22bc6ee647b6b90729ab34a250b").is_err()); // 31 digits
        assert!(Id128::parse("fc2e22bc6ee647b6b90729ab34a250bx").is_err());
        assert!(Id128::parse("fc2e22bc-6ee6-47b6-b907_29ab34a250b1").is_err());
        assert!(Id128::parse("fc2e22bc6ee647b6b90729ab34a250b1ff").is_err());
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let a = Id128::parse("00000000000000000000000000000001").unwrap();
        let b = Id128::parse("00000000000000000000000000000100").unwrap();
        assert!(a < b);
        assert!(Id128::default().is_null());
    }
}
