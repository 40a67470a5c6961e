//! Shared types
//!
//! Network parameters and ledger eras cross every component boundary, so
//! they live here rather than in any single module.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Network
// =============================================================================

/// Protocol magic of Cardano mainnet
pub const MAINNET_PROTOCOL_MAGIC: u32 = 764_824_073;

/// Target network of a signing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Network id carried in addresses and the optional body field (0 testnets, 1 mainnet)
    pub network_id: u8,
    /// Byron-era protocol magic, used in bootstrap witness attributes
    pub protocol_magic: u32,
}

impl Network {
    pub const MAINNET: Network = Network {
        network_id: 1,
        protocol_magic: MAINNET_PROTOCOL_MAGIC,
    };

    pub const PREPROD: Network = Network {
        network_id: 0,
        protocol_magic: 1,
    };

    pub const PREVIEW: Network = Network {
        network_id: 0,
        protocol_magic: 2,
    };

    pub fn new(network_id: u8, protocol_magic: u32) -> Self {
        Self {
            network_id,
            protocol_magic,
        }
    }

    /// Look up a well-known network by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Some(Self::MAINNET),
            "preprod" => Some(Self::PREPROD),
            "preview" => Some(Self::PREVIEW),
            _ => None,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        self.protocol_magic == MAINNET_PROTOCOL_MAGIC
    }
}

// =============================================================================
// Era
// =============================================================================

/// Ledger era of a transaction
///
/// Ordered oldest to newest so eras can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    Shelley,
    Allegra,
    Mary,
    Alonzo,
    Babbage,
    Conway,
}

impl Era {
    /// Label used in text envelopes, e.g. `ConwayEra`
    pub fn label(&self) -> &'static str {
        match self {
            Era::Shelley => "ShelleyEra",
            Era::Allegra => "AllegraEra",
            Era::Mary => "MaryEra",
            Era::Alonzo => "AlonzoEra",
            Era::Babbage => "BabbageEra",
            Era::Conway => "ConwayEra",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_name() {
        assert_eq!(Network::from_name("Mainnet"), Some(Network::MAINNET));
        assert_eq!(Network::from_name(" preprod "), Some(Network::PREPROD));
        assert_eq!(Network::from_name("sanchonet"), None);
        assert!(Network::MAINNET.is_mainnet());
        assert!(!Network::PREVIEW.is_mainnet());
    }

    #[test]
    fn test_era_ordering() {
        assert!(Era::Conway > Era::Babbage);
        assert_eq!(Era::Babbage.to_string(), "BabbageEra");
    }

    #[test]
    fn test_network_serialization() {
        let json = serde_json::to_string(&Network::PREVIEW).unwrap();
        assert_eq!(json, r#"{"networkId":0,"protocolMagic":2}"#);
    }
}
