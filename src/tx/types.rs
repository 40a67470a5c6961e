//! Transaction model
//!
//! An owned, acyclic tree: every certificate, relay and output belongs to
//! exactly one parent. Nothing here is mutated after decoding.

use crate::codec::{CborValue, Hash28, Hash32};
use crate::types::Era;
use std::collections::BTreeMap;

// =============================================================================
// Inputs, outputs and values
// =============================================================================

/// Reference to an unspent output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxInput {
    pub tx_hash: Hash32,
    pub output_index: u64,
}

impl TxInput {
    pub fn new(tx_hash: Hash32, output_index: u64) -> Self {
        Self {
            tx_hash,
            output_index,
        }
    }
}

/// Asset name, at most 32 bytes
pub type AssetName = Vec<u8>;

/// Policy id → asset name → quantity
pub type MultiAsset<Q> = BTreeMap<Hash28, BTreeMap<AssetName, Q>>;

/// Output value: plain lovelace or lovelace plus native assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputAmount {
    Coin(u64),
    WithAssets { coin: u64, assets: MultiAsset<u64> },
}

impl OutputAmount {
    pub fn coin(&self) -> u64 {
        match self {
            OutputAmount::Coin(coin) => *coin,
            OutputAmount::WithAssets { coin, .. } => *coin,
        }
    }
}

/// Datum attached to an output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatumOption {
    Hash(Hash32),
    /// Encoded plutus data, kept byte-for-byte
    Inline(Vec<u8>),
}

/// Wire shape of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `[address, amount, datum_hash?]`
    #[default]
    Array,
    /// `{0: address, 1: amount, 2: datum_option?, 3: script_ref?}`
    Map,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: Vec<u8>,
    pub amount: OutputAmount,
    pub datum: Option<DatumOption>,
    /// Encoded script, kept byte-for-byte
    pub script_ref: Option<Vec<u8>>,
    pub format: OutputFormat,
}

impl TxOutput {
    pub fn new(address: Vec<u8>, amount: OutputAmount) -> Self {
        Self {
            address,
            amount,
            datum: None,
            script_ref: None,
            format: OutputFormat::Array,
        }
    }

    /// Datum or reference script, either of which implies script execution
    pub fn has_script_evidence(&self) -> bool {
        self.datum.is_some() || self.script_ref.is_some()
    }
}

// =============================================================================
// Certificates
// =============================================================================

/// Stake credential: a key hash or a script hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StakeCredential {
    KeyHash(Hash28),
    ScriptHash(Hash28),
}

impl StakeCredential {
    pub fn key_hash(&self) -> Option<&Hash28> {
        match self {
            StakeCredential::KeyHash(hash) => Some(hash),
            StakeCredential::ScriptHash(_) => None,
        }
    }
}

/// Pool margin as a rational number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInterval {
    pub numerator: u64,
    pub denominator: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: Hash32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolRelay {
    SingleHostAddress {
        port: Option<u16>,
        ipv4: Option<[u8; 4]>,
        ipv6: Option<[u8; 16]>,
    },
    SingleHostName {
        port: Option<u16>,
        dns_name: String,
    },
    MultiHostName {
        dns_name: String,
    },
}

/// Registration parameters of a stake pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub operator: Hash28,
    pub vrf_key_hash: Hash32,
    pub pledge: u64,
    pub cost: u64,
    pub margin: UnitInterval,
    pub reward_account: Vec<u8>,
    /// Never empty, no duplicates
    pub owners: Vec<Hash28>,
    pub relays: Vec<PoolRelay>,
    pub metadata: Option<PoolMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Certificate {
    StakeKeyRegistration {
        credential: StakeCredential,
    },
    StakeKeyDeregistration {
        credential: StakeCredential,
    },
    Delegation {
        credential: StakeCredential,
        pool_key_hash: Hash28,
    },
    StakepoolRegistration(PoolParams),
    StakepoolRetirement {
        pool_key_hash: Hash28,
        epoch: u64,
    },
}

impl Certificate {
    /// Wire tag of the certificate
    pub fn type_id(&self) -> u64 {
        match self {
            Certificate::StakeKeyRegistration { .. } => 0,
            Certificate::StakeKeyDeregistration { .. } => 1,
            Certificate::Delegation { .. } => 2,
            Certificate::StakepoolRegistration(_) => 3,
            Certificate::StakepoolRetirement { .. } => 4,
        }
    }

    /// Deregistration and delegation must be witnessed by the stake key
    pub fn needs_stake_witness(&self) -> bool {
        matches!(
            self,
            Certificate::StakeKeyDeregistration { .. } | Certificate::Delegation { .. }
        )
    }
}

// =============================================================================
// Body
// =============================================================================

/// How sets (inputs, certificates, owners, signers) appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetEncoding {
    /// Plain arrays
    #[default]
    Plain,
    /// Arrays wrapped in tag 258
    Tagged,
}

/// Map keys of the transaction body
pub mod body_keys {
    pub const INPUTS: u64 = 0;
    pub const OUTPUTS: u64 = 1;
    pub const FEE: u64 = 2;
    pub const TTL: u64 = 3;
    pub const CERTIFICATES: u64 = 4;
    pub const WITHDRAWALS: u64 = 5;
    pub const AUXILIARY_DATA_HASH: u64 = 7;
    pub const VALIDITY_INTERVAL_START: u64 = 8;
    pub const MINT: u64 = 9;
    pub const SCRIPT_DATA_HASH: u64 = 11;
    pub const COLLATERAL_INPUTS: u64 = 13;
    pub const REQUIRED_SIGNERS: u64 = 14;
    pub const NETWORK_ID: u64 = 15;
    pub const COLLATERAL_RETURN: u64 = 16;
    pub const TOTAL_COLLATERAL: u64 = 17;
    pub const REFERENCE_INPUTS: u64 = 18;
    /// First key belonging to the governance era
    pub const FIRST_CONWAY: u64 = 19;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionBody {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: u64,
    pub ttl: Option<u64>,
    pub certificates: Option<Vec<Certificate>>,
    /// Reward address → withdrawn lovelace
    pub withdrawals: Option<BTreeMap<Vec<u8>, u64>>,
    pub auxiliary_data_hash: Option<Hash32>,
    pub validity_interval_start: Option<u64>,
    pub mint: Option<MultiAsset<i64>>,
    pub script_data_hash: Option<Hash32>,
    pub collateral_inputs: Option<Vec<TxInput>>,
    pub required_signers: Option<Vec<Hash28>>,
    pub network_id: Option<u8>,
    pub collateral_return: Option<TxOutput>,
    pub total_collateral: Option<u64>,
    pub reference_inputs: Option<Vec<TxInput>>,
    /// Fields this model does not interpret (update proposals, governance)
    pub other_fields: BTreeMap<u64, CborValue>,
    pub set_encoding: SetEncoding,
}

impl TransactionBody {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>, fee: u64) -> Self {
        Self {
            inputs,
            outputs,
            fee,
            ..Default::default()
        }
    }

    pub fn certificates(&self) -> &[Certificate] {
        self.certificates.as_deref().unwrap_or(&[])
    }

    pub fn pool_registrations(&self) -> impl Iterator<Item = &PoolParams> {
        self.certificates().iter().filter_map(|cert| match cert {
            Certificate::StakepoolRegistration(params) => Some(params),
            _ => None,
        })
    }

    pub fn has_pool_retirement(&self) -> bool {
        self.certificates()
            .iter()
            .any(|cert| matches!(cert, Certificate::StakepoolRetirement { .. }))
    }

    /// Deregistration / delegation certificates or any withdrawal entry
    pub fn has_stake_witness_content(&self) -> bool {
        let certs = self.certificates().iter().any(Certificate::needs_stake_witness);
        let withdrawals = self.withdrawals.as_ref().is_some_and(|w| !w.is_empty());
        certs || withdrawals
    }

    /// Mint field present with at least one asset
    pub fn mints(&self) -> bool {
        self.mint
            .as_ref()
            .is_some_and(|policies| policies.values().any(|assets| !assets.is_empty()))
    }

    /// Fields that only exist for script execution
    pub fn has_script_evidence(&self) -> bool {
        self.collateral_inputs.is_some()
            || self.collateral_return.is_some()
            || self.total_collateral.is_some()
            || self.reference_inputs.is_some()
            || self.script_data_hash.is_some()
            || self.required_signers.is_some()
            || self.outputs.iter().any(TxOutput::has_script_evidence)
    }
}

// =============================================================================
// Witness set and envelope
// =============================================================================

/// Map keys of the witness set
pub mod witness_keys {
    pub const VKEY_WITNESSES: u64 = 0;
    pub const NATIVE_SCRIPTS: u64 = 1;
    pub const BOOTSTRAP_WITNESSES: u64 = 2;
}

/// Witness set, kept as raw entries keyed by witness category
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WitnessSet {
    pub entries: BTreeMap<u64, CborValue>,
}

impl WitnessSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: u64) -> Option<&CborValue> {
        self.entries.get(&key)
    }
}

/// Decoded transaction envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub body: TransactionBody,
    pub witness_set: WitnessSet,
    /// Present only in 4-element (Alonzo and later) envelopes
    pub is_valid: Option<bool>,
    pub auxiliary_data: Option<CborValue>,
    pub(crate) raw_body: Vec<u8>,
    /// Witness-set values as received, by key
    pub(crate) raw_witnesses: BTreeMap<u64, Vec<u8>>,
    pub(crate) raw_auxiliary_data: Option<Vec<u8>>,
}

impl Transaction {
    /// Oldest era whose ledger rules admit everything in this envelope
    pub fn era(&self) -> Era {
        let body = &self.body;
        let conway = body.set_encoding == SetEncoding::Tagged
            || body
                .other_fields
                .keys()
                .any(|key| *key >= body_keys::FIRST_CONWAY);
        if conway {
            return Era::Conway;
        }

        let babbage = body.collateral_return.is_some()
            || body.total_collateral.is_some()
            || body.reference_inputs.is_some()
            || body.outputs.iter().any(|out| {
                out.format == OutputFormat::Map
                    || out.script_ref.is_some()
                    || matches!(out.datum, Some(DatumOption::Inline(_)))
            });
        if babbage {
            return Era::Babbage;
        }

        let alonzo = self.is_valid.is_some()
            || body.script_data_hash.is_some()
            || body.collateral_inputs.is_some()
            || body.required_signers.is_some()
            || body.network_id.is_some()
            || body.outputs.iter().any(|out| out.datum.is_some());
        if alonzo {
            return Era::Alonzo;
        }

        if body.mint.is_some() {
            Era::Mary
        } else if body.validity_interval_start.is_some() || body.ttl.is_none() {
            Era::Allegra
        } else {
            Era::Shelley
        }
    }
}
