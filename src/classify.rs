//! Source-address classification.
//!
//! Turns the textual source address of a fingerprint into its IP version and
//! the canonical single-host CIDR used as a block-list entry: `a.b.c.d/32`
//! for IPv4, the fully expanded zero-padded form with `/128` for IPv6.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// IP version of a classified source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl IpVersion {
    /// Returns the version as a string for output and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            IpVersion::V4 => "IPv4",
            IpVersion::V6 => "IPv6",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source address reduced to its version and canonical network form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedAddress {
    /// IP version of the address
    pub version: IpVersion,
    /// Canonical single-host CIDR (`/32` or `/128`)
    pub network: String,
}

impl ClassifiedAddress {
    /// Classify an already-parsed address. Infallible; the canonical network
    /// string is fully determined by the address value.
    pub fn from_ip(address: IpAddr) -> Self {
        match address {
            IpAddr::V4(v4) => ClassifiedAddress {
                version: IpVersion::V4,
                network: format!("{v4}/32"),
            },
            IpAddr::V6(v6) => ClassifiedAddress {
                version: IpVersion::V6,
                network: format!("{}/128", expand_v6(v6)),
            },
        }
    }
}

/// The fingerprint's source address is not a parseable IPv4 or IPv6 string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid source address: {address:?}")]
pub struct InvalidAddressError {
    pub address: String,
}

/// Parse a textual address, preserving the original input in the error.
pub fn parse_address(address: &str) -> Result<IpAddr, InvalidAddressError> {
    address.parse().map_err(|_| InvalidAddressError {
        address: address.to_string(),
    })
}

/// Classify a textual IPv4 or IPv6 address into its canonical network form.
///
/// Compressed and expanded spellings of the same IPv6 address classify to
/// the identical network string.
pub fn classify(address: &str) -> Result<ClassifiedAddress, InvalidAddressError> {
    Ok(ClassifiedAddress::from_ip(parse_address(address)?))
}

/// Render an IPv6 address with all eight groups zero-padded to four hex
/// digits, never compressed.
fn expand_v6(address: Ipv6Addr) -> String {
    let s = address.segments();
    format!(
        "{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}",
        s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]
    )
}
