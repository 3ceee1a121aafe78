//! Execution port model.
//!
//! A port is one of the fixed execution units of a core. Each port
//! dispatches at most one uop at a time; a uop occupies its port for
//! `latency` cycles starting at its dispatch cycle.
//!
//! Ports are identified by small integers. Decoder output frequently
//! spells them as strings (`"0"`, `"5"`), so both forms are accepted on
//! input and the numeric form is always written back.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An execution port identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port(pub u8);

impl Port {
    /// Creates a port from its index.
    #[inline]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Port index.
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The first `count` ports, `0..count`.
    ///
    /// Convenience for renderers that need a fixed port enumeration
    /// (Sandy Bridge has six: `Port::range(6)`).
    pub fn range(count: u8) -> Vec<Port> {
        (0..count).map(Port).collect()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Port {
    fn from(index: u8) -> Self {
        Self(index)
    }
}

/// Error parsing a port identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid port identifier '{0}'")]
pub struct ParsePortError(pub String);

impl FromStr for Port {
    type Err = ParsePortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(Port)
            .map_err(|_| ParsePortError(s.to_string()))
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u8),
    Text(String),
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PortRepr::deserialize(deserializer)? {
            PortRepr::Number(n) => Ok(Port(n)),
            PortRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
