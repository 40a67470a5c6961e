//! Derivation Paths
//!
//! CIP-1852 style paths such as `1852'/1815'/0'/2/0`. Hardened components
//! carry the [`HARDENED`] offset; the purpose component decides which key
//! role a path belongs to.

use super::descriptor::KeyRole;
use std::fmt;
use std::str::FromStr;

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Cardano coin type from SLIP-0044
pub const ADA_COIN_TYPE: u32 = 1815;

/// Purpose components (without the hardened offset)
pub mod purposes {
    pub const BYRON: u32 = 44;
    pub const SHELLEY: u32 = 1852;
    pub const POOL_COLD: u32 = 1853;
    pub const MULTISIG: u32 = 1854;
    pub const MINT: u32 = 1855;
    pub const CIP36: u32 = 1694;
}

/// Chain components under `1852'/1815'/account'`
pub mod chains {
    pub const EXTERNAL: u32 = 0;
    pub const INTERNAL: u32 = 1;
    pub const STAKE: u32 = 2;
    pub const DREP: u32 = 3;
    pub const COMMITTEE_COLD: u32 = 4;
    pub const COMMITTEE_HOT: u32 = 5;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty derivation path")]
    Empty,

    #[error("invalid path component `{0}`")]
    InvalidComponent(String),

    #[error("path component `{0}` exceeds the hardened range")]
    IndexOutOfRange(String),
}

/// Parsed derivation path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// Raw components including the hardened offset
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Purpose of a path whose first component is hardened
    pub fn purpose(&self) -> Option<u32> {
        match self.0.first() {
            Some(&first) if first >= HARDENED => Some(first - HARDENED),
            _ => None,
        }
    }

    /// Legacy (Byron) payment key path
    pub fn is_byron(&self) -> bool {
        self.purpose() == Some(purposes::BYRON)
    }

    /// Key role implied by the purpose, and for Shelley paths the chain
    pub fn implied_role(&self) -> Option<KeyRole> {
        let coin_type_ok = self.0.get(1) == Some(&(ADA_COIN_TYPE + HARDENED));
        if !coin_type_ok {
            return None;
        }

        match self.purpose()? {
            purposes::BYRON => Some(KeyRole::Payment),
            purposes::SHELLEY => match self.0.get(3).copied()? {
                chains::EXTERNAL | chains::INTERNAL => Some(KeyRole::Payment),
                chains::STAKE => Some(KeyRole::Stake),
                chains::DREP => Some(KeyRole::DRep),
                chains::COMMITTEE_COLD => Some(KeyRole::CommitteeCold),
                chains::COMMITTEE_HOT => Some(KeyRole::CommitteeHot),
                _ => None,
            },
            purposes::POOL_COLD => Some(KeyRole::PoolCold),
            purposes::MULTISIG => Some(KeyRole::MultiSig),
            purposes::MINT => Some(KeyRole::Mint),
            purposes::CIP36 => Some(KeyRole::Cip36Voting),
            _ => None,
        }
    }

    /// Parse `1852'/1815'/0'/0/0`, with or without a leading `m/`.
    /// `'`, `h` and `H` all mark a hardened component.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.trim();
        let body = trimmed
            .strip_prefix("m/")
            .or_else(|| trimmed.strip_prefix("M/"))
            .unwrap_or(trimmed);
        if body.is_empty() {
            return Err(PathError::Empty);
        }

        body.split('/')
            .map(parse_component)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

fn parse_component(s: &str) -> Result<u32, PathError> {
    let trimmed = s.trim();
    let (digits, hardened) = match trimmed.strip_suffix(&['\'', 'h', 'H'][..]) {
        Some(digits) => (digits, true),
        None => (trimmed, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidComponent(s.to_string()));
    }
    let index: u32 = digits
        .parse()
        .map_err(|_| PathError::IndexOutOfRange(s.to_string()))?;
    if index >= HARDENED {
        return Err(PathError::IndexOutOfRange(s.to_string()));
    }

    Ok(if hardened { index + HARDENED } else { index })
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            if *component >= HARDENED {
                write!(f, "{}'", component - HARDENED)?;
            } else {
                write!(f, "{}", component)?;
            }
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(components: Vec<u32>) -> Self {
        Self(components)
    }
}
