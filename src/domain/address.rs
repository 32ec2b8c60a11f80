use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bytes in an account address.
pub const ADDRESS_LEN: usize = 20;

/// Account identity that owns travel items.
/// Written as "0x" followed by 40 hex digits; parsing is case-insensitive,
/// display is always lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parse an address, accepting it with or without the "0x" prefix.
    pub fn parse(input: &str) -> Result<Self, ParseAddressError> {
        let input = input.trim();
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(ParseAddressError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| ParseAddressError::InvalidHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    InvalidLength(usize),
    InvalidHex,
}

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAddressError::InvalidLength(len) => write!(
                f,
                "address must have {} hex digits, got {}",
                ADDRESS_LEN * 2,
                len
            ),
            ParseAddressError::InvalidHex => write!(f, "address contains non-hex characters"),
        }
    }
}

impl std::error::Error for ParseAddressError {}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn test_parse_and_display() {
        let addr = Address::parse(ALICE).unwrap();
        assert_eq!(addr.to_string(), ALICE);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let upper = Address::parse("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
        let lower = Address::parse(ALICE).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_parse_without_prefix() {
        let addr = Address::parse(&ALICE[2..]).unwrap();
        assert_eq!(addr.to_string(), ALICE);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(
            Address::parse("0x1234"),
            Err(ParseAddressError::InvalidLength(4))
        );
        assert_eq!(
            Address::parse("0xzz997970c51812dc3a010c7d01b50e0d17dc79c8"),
            Err(ParseAddressError::InvalidHex)
        );
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let addr = Address::parse(ALICE).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", ALICE));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
