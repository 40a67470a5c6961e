//! Transaction decoder
//!
//! Parses the raw envelope with the codec, then maps the value tree onto the
//! typed model field by field. The original byte spans of the body, of every
//! witness-set value and of the auxiliary data are captured so the exact
//! bytes the sender produced stay available for hashing and re-emission.

use super::error::{DecodeError, DecodeResult};
use super::types::*;
use crate::codec::{
    decoder::at_break, read_value, CborValue, CodecError, Hash28, TAG_ENCODED_CBOR,
    TAG_RATIONAL, TAG_SET,
};
use minicbor::data::Type;
use minicbor::Decoder;
use std::collections::{BTreeMap, BTreeSet};

/// Longest asset name the ledger accepts
pub const MAX_ASSET_NAME_LEN: usize = 32;
/// Longest pool metadata URL or relay DNS name
pub const MAX_URL_LEN: usize = 64;
/// Header byte plus a 28-byte credential hash
pub const REWARD_ACCOUNT_LEN: usize = 29;

impl Transaction {
    /// Decode a full transaction envelope
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut d = Decoder::new(bytes);
        match d.datatype().map_err(CodecError::from)? {
            Type::Array | Type::ArrayIndef => {}
            _ => {
                let found = crate::codec::decode(bytes)
                    .map(|value| value.kind())
                    .unwrap_or("malformed item");
                return Err(DecodeError::UnexpectedType {
                    field: "transaction",
                    expected: "array",
                    found,
                });
            }
        }

        let len = d.array().map_err(CodecError::from)?;
        let mut elements = Vec::with_capacity(4);
        let mut spans = Vec::with_capacity(4);

        match len {
            Some(n) => {
                if n != 3 && n != 4 {
                    return Err(DecodeError::InvalidEnvelope(
                        usize::try_from(n).unwrap_or(usize::MAX),
                    ));
                }
                for _ in 0..n {
                    read_element(&mut d, &mut elements, &mut spans)?;
                }
            }
            None => {
                while !at_break(&mut d)? {
                    if elements.len() == 4 {
                        return Err(DecodeError::InvalidEnvelope(5));
                    }
                    read_element(&mut d, &mut elements, &mut spans)?;
                }
                if elements.len() < 3 {
                    return Err(DecodeError::InvalidEnvelope(elements.len()));
                }
            }
        }

        if d.position() != bytes.len() {
            return Err(CodecError::TrailingBytes(bytes.len() - d.position()).into());
        }

        let mut elements = elements.into_iter();
        let body_value = next_element(&mut elements)?;
        let witness_value = next_element(&mut elements)?;
        let (is_valid, aux_value) = if elements.len() == 2 {
            let flag = match next_element(&mut elements)? {
                CborValue::Bool(flag) => flag,
                other => return Err(unexpected("is_valid", "bool", &other)),
            };
            (Some(flag), next_element(&mut elements)?)
        } else {
            (None, next_element(&mut elements)?)
        };

        let body = decode_body(&body_value)?;
        let witness_set = decode_witness_set(&witness_value)?;
        let auxiliary_data = match aux_value {
            CborValue::Null => None,
            value @ (CborValue::Map(_) | CborValue::Array(_) | CborValue::Tag(..)) => Some(value),
            other => return Err(unexpected("auxiliary_data", "map, array, tag or null", &other)),
        };

        let span = |index: usize| &bytes[spans[index].0..spans[index].1];
        let raw_witnesses = raw_witness_entries(span(1))?;
        let raw_auxiliary_data = auxiliary_data
            .as_ref()
            .map(|_| span(spans.len() - 1).to_vec());

        Ok(Self {
            body,
            witness_set,
            is_valid,
            auxiliary_data,
            raw_body: span(0).to_vec(),
            raw_witnesses,
            raw_auxiliary_data,
        })
    }

    /// Decode from a hex string, tolerating surrounding whitespace
    pub fn from_hex(hex_str: &str) -> DecodeResult<Self> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| DecodeError::InvalidValue {
            field: "transaction",
            reason: "not a hex string",
        })?;
        Self::decode(&bytes)
    }
}

fn read_element(
    d: &mut Decoder<'_>,
    elements: &mut Vec<CborValue>,
    spans: &mut Vec<(usize, usize)>,
) -> DecodeResult<()> {
    let start = d.position();
    elements.push(read_value(d)?);
    spans.push((start, d.position()));
    Ok(())
}

fn next_element(elements: &mut std::vec::IntoIter<CborValue>) -> DecodeResult<CborValue> {
    elements
        .next()
        .ok_or(DecodeError::MissingField("transaction element"))
}

// =============================================================================
// Body
// =============================================================================

/// Records which set shapes appeared while decoding a body
#[derive(Default)]
struct SetTracker {
    tagged: bool,
}

impl SetTracker {
    fn encoding(&self) -> SetEncoding {
        if self.tagged {
            SetEncoding::Tagged
        } else {
            SetEncoding::Plain
        }
    }
}

pub fn decode_body(value: &CborValue) -> DecodeResult<TransactionBody> {
    let entries = match value {
        CborValue::Map(entries) => entries,
        other => return Err(unexpected("transaction_body", "map", other)),
    };

    let mut body = TransactionBody::default();
    let mut sets = SetTracker::default();
    let (mut has_inputs, mut has_outputs, mut has_fee) = (false, false, false);

    for (key, value) in entries {
        let key = key
            .as_u64()
            .ok_or_else(|| unexpected("transaction_body key", "unsigned integer", key))?;
        match key {
            body_keys::INPUTS => {
                body.inputs = decode_inputs(value, "inputs", &mut sets)?;
                has_inputs = true;
            }
            body_keys::OUTPUTS => {
                body.outputs = expect_array(value, "outputs")?
                    .iter()
                    .map(decode_output)
                    .collect::<DecodeResult<_>>()?;
                has_outputs = true;
            }
            body_keys::FEE => {
                body.fee = expect_uint(value, "fee")?;
                has_fee = true;
            }
            body_keys::TTL => body.ttl = Some(expect_uint(value, "ttl")?),
            body_keys::CERTIFICATES => {
                body.certificates = Some(
                    expect_set(value, "certificates", &mut sets)?
                        .iter()
                        .map(|cert| decode_certificate(cert, &mut sets))
                        .collect::<DecodeResult<_>>()?,
                );
            }
            body_keys::WITHDRAWALS => body.withdrawals = Some(decode_withdrawals(value)?),
            body_keys::AUXILIARY_DATA_HASH => {
                body.auxiliary_data_hash = Some(expect_hash(value, "auxiliary_data_hash")?)
            }
            body_keys::VALIDITY_INTERVAL_START => {
                body.validity_interval_start = Some(expect_uint(value, "validity_interval_start")?)
            }
            body_keys::MINT => body.mint = Some(decode_multiasset(value, "mint", expect_i64)?),
            body_keys::SCRIPT_DATA_HASH => {
                body.script_data_hash = Some(expect_hash(value, "script_data_hash")?)
            }
            body_keys::COLLATERAL_INPUTS => {
                body.collateral_inputs = Some(decode_inputs(value, "collateral_inputs", &mut sets)?)
            }
            body_keys::REQUIRED_SIGNERS => {
                let signers = expect_set(value, "required_signers", &mut sets)?
                    .iter()
                    .map(|signer| expect_hash(signer, "required_signers"))
                    .collect::<DecodeResult<Vec<Hash28>>>()?;
                ensure_unique(&signers, "required_signers")?;
                body.required_signers = Some(signers);
            }
            body_keys::NETWORK_ID => {
                let id = expect_uint(value, "network_id")?;
                body.network_id =
                    Some(u8::try_from(id).map_err(|_| DecodeError::IntegerOverflow("network_id"))?);
            }
            body_keys::COLLATERAL_RETURN => {
                body.collateral_return = Some(decode_output(value)?)
            }
            body_keys::TOTAL_COLLATERAL => {
                body.total_collateral = Some(expect_uint(value, "total_collateral")?)
            }
            body_keys::REFERENCE_INPUTS => {
                body.reference_inputs = Some(decode_inputs(value, "reference_inputs", &mut sets)?)
            }
            other => {
                body.other_fields.insert(other, value.clone());
            }
        }
    }

    if !has_inputs {
        return Err(DecodeError::MissingField("inputs"));
    }
    if !has_outputs {
        return Err(DecodeError::MissingField("outputs"));
    }
    if !has_fee {
        return Err(DecodeError::MissingField("fee"));
    }
    if body.inputs.is_empty() {
        return Err(DecodeError::EmptyField("inputs"));
    }
    if body.outputs.is_empty() {
        return Err(DecodeError::EmptyField("outputs"));
    }

    body.set_encoding = sets.encoding();
    Ok(body)
}

fn decode_inputs(
    value: &CborValue,
    field: &'static str,
    sets: &mut SetTracker,
) -> DecodeResult<Vec<TxInput>> {
    let inputs = expect_set(value, field, sets)?
        .iter()
        .map(|input| {
            let items = expect_array(input, field)?;
            expect_len(items, 2, field)?;
            Ok(TxInput {
                tx_hash: expect_hash(&items[0], field)?,
                output_index: expect_uint(&items[1], field)?,
            })
        })
        .collect::<DecodeResult<Vec<_>>>()?;
    ensure_unique(&inputs, field)?;
    Ok(inputs)
}

// =============================================================================
// Outputs
// =============================================================================

pub fn decode_output(value: &CborValue) -> DecodeResult<TxOutput> {
    match value {
        CborValue::Array(items) => {
            if items.len() != 2 && items.len() != 3 {
                return Err(DecodeError::InvalidLength {
                    field: "output",
                    expected: 2,
                    actual: items.len(),
                });
            }
            let mut output = TxOutput::new(
                expect_bytes(&items[0], "output.address")?.to_vec(),
                decode_amount(&items[1])?,
            );
            if let Some(datum_hash) = items.get(2) {
                output.datum = Some(DatumOption::Hash(expect_hash(datum_hash, "output.datum_hash")?));
            }
            Ok(output)
        }
        CborValue::Map(entries) => {
            let mut address = None;
            let mut amount = None;
            let mut datum = None;
            let mut script_ref = None;
            for (key, value) in entries {
                let key = key
                    .as_u64()
                    .ok_or_else(|| unexpected("output key", "unsigned integer", key))?;
                match key {
                    0 => address = Some(expect_bytes(value, "output.address")?.to_vec()),
                    1 => amount = Some(decode_amount(value)?),
                    2 => datum = Some(decode_datum_option(value)?),
                    3 => script_ref = Some(expect_embedded_cbor(value, "output.script_ref")?),
                    other => {
                        return Err(DecodeError::UnexpectedKey {
                            field: "output",
                            key: other,
                        })
                    }
                }
            }
            Ok(TxOutput {
                address: address.ok_or(DecodeError::MissingField("output.address"))?,
                amount: amount.ok_or(DecodeError::MissingField("output.amount"))?,
                datum,
                script_ref,
                format: OutputFormat::Map,
            })
        }
        other => Err(unexpected("output", "array or map", other)),
    }
}

fn decode_amount(value: &CborValue) -> DecodeResult<OutputAmount> {
    match value {
        CborValue::Int(_) => Ok(OutputAmount::Coin(expect_uint(value, "output.amount")?)),
        CborValue::Array(items) => {
            expect_len(items, 2, "output.amount")?;
            Ok(OutputAmount::WithAssets {
                coin: expect_uint(&items[0], "output.amount")?,
                assets: decode_multiasset(&items[1], "output.amount", expect_uint)?,
            })
        }
        other => Err(unexpected("output.amount", "integer or array", other)),
    }
}

fn decode_datum_option(value: &CborValue) -> DecodeResult<DatumOption> {
    let items = expect_array(value, "output.datum")?;
    expect_len(items, 2, "output.datum")?;
    match expect_uint(&items[0], "output.datum")? {
        0 => Ok(DatumOption::Hash(expect_hash(&items[1], "output.datum")?)),
        1 => Ok(DatumOption::Inline(expect_embedded_cbor(
            &items[1],
            "output.datum",
        )?)),
        other => Err(DecodeError::UnsupportedDatumOption(other)),
    }
}

fn decode_multiasset<Q>(
    value: &CborValue,
    field: &'static str,
    quantity: fn(&CborValue, &'static str) -> DecodeResult<Q>,
) -> DecodeResult<MultiAsset<Q>> {
    let policies = expect_map(value, field)?;
    let mut out = BTreeMap::new();
    for (policy, assets) in policies {
        let policy: Hash28 = expect_hash(policy, field)?;
        let mut names = BTreeMap::new();
        for (name, amount) in expect_map(assets, field)? {
            let name = expect_bytes(name, field)?;
            if name.len() > MAX_ASSET_NAME_LEN {
                return Err(DecodeError::InvalidValue {
                    field,
                    reason: "asset name longer than 32 bytes",
                });
            }
            names.insert(name.to_vec(), quantity(amount, field)?);
        }
        out.insert(policy, names);
    }
    Ok(out)
}

fn decode_withdrawals(value: &CborValue) -> DecodeResult<BTreeMap<Vec<u8>, u64>> {
    let mut out = BTreeMap::new();
    for (account, amount) in expect_map(value, "withdrawals")? {
        let account = expect_reward_account(account, "withdrawals")?;
        out.insert(account, expect_uint(amount, "withdrawals")?);
    }
    Ok(out)
}

// =============================================================================
// Certificates
// =============================================================================

fn decode_certificate(value: &CborValue, sets: &mut SetTracker) -> DecodeResult<Certificate> {
    let items = expect_array(value, "certificate")?;
    let kind = match items.first() {
        Some(kind) => expect_uint(kind, "certificate")?,
        None => {
            return Err(DecodeError::InvalidLength {
                field: "certificate",
                expected: 2,
                actual: 0,
            })
        }
    };

    match kind {
        0 => {
            expect_len(items, 2, "stake_registration")?;
            Ok(Certificate::StakeKeyRegistration {
                credential: decode_credential(&items[1])?,
            })
        }
        1 => {
            expect_len(items, 2, "stake_deregistration")?;
            Ok(Certificate::StakeKeyDeregistration {
                credential: decode_credential(&items[1])?,
            })
        }
        2 => {
            expect_len(items, 3, "stake_delegation")?;
            Ok(Certificate::Delegation {
                credential: decode_credential(&items[1])?,
                pool_key_hash: expect_hash(&items[2], "stake_delegation.pool")?,
            })
        }
        3 => {
            expect_len(items, 10, "pool_registration")?;
            decode_pool_params(&items[1..], sets).map(Certificate::StakepoolRegistration)
        }
        4 => {
            expect_len(items, 3, "pool_retirement")?;
            Ok(Certificate::StakepoolRetirement {
                pool_key_hash: expect_hash(&items[1], "pool_retirement.pool")?,
                epoch: expect_uint(&items[2], "pool_retirement.epoch")?,
            })
        }
        other => Err(DecodeError::UnsupportedCertificateType(other)),
    }
}

fn decode_credential(value: &CborValue) -> DecodeResult<StakeCredential> {
    let items = expect_array(value, "stake_credential")?;
    expect_len(items, 2, "stake_credential")?;
    let hash = expect_hash(&items[1], "stake_credential")?;
    match expect_uint(&items[0], "stake_credential")? {
        0 => Ok(StakeCredential::KeyHash(hash)),
        1 => Ok(StakeCredential::ScriptHash(hash)),
        other => Err(DecodeError::UnsupportedCredentialType(other)),
    }
}

/// Pool parameters are spliced flat into the certificate array
fn decode_pool_params(items: &[CborValue], sets: &mut SetTracker) -> DecodeResult<PoolParams> {
    let owners = expect_set(&items[6], "pool_owners", sets)?
        .iter()
        .map(|owner| expect_hash(owner, "pool_owners"))
        .collect::<DecodeResult<Vec<Hash28>>>()?;
    if owners.is_empty() {
        return Err(DecodeError::EmptyField("pool_owners"));
    }
    ensure_unique(&owners, "pool_owners")?;

    let metadata = match &items[8] {
        CborValue::Null => None,
        value => {
            let fields = expect_array(value, "pool_metadata")?;
            expect_len(fields, 2, "pool_metadata")?;
            Some(PoolMetadata {
                url: expect_text(&fields[0], "pool_metadata.url")?,
                hash: expect_hash(&fields[1], "pool_metadata.hash")?,
            })
        }
    };

    Ok(PoolParams {
        operator: expect_hash(&items[0], "pool_registration.operator")?,
        vrf_key_hash: expect_hash(&items[1], "pool_registration.vrf_key_hash")?,
        pledge: expect_uint(&items[2], "pool_registration.pledge")?,
        cost: expect_uint(&items[3], "pool_registration.cost")?,
        margin: decode_unit_interval(&items[4])?,
        reward_account: expect_reward_account(&items[5], "pool_registration.reward_account")?,
        owners,
        relays: expect_array(&items[7], "pool_relays")?
            .iter()
            .map(decode_relay)
            .collect::<DecodeResult<_>>()?,
        metadata,
    })
}

fn decode_unit_interval(value: &CborValue) -> DecodeResult<UnitInterval> {
    let inner = match value {
        CborValue::Tag(TAG_RATIONAL, inner) => inner.as_ref(),
        CborValue::Tag(tag, _) => {
            return Err(DecodeError::UnexpectedTag {
                field: "pool_registration.margin",
                tag: *tag,
            })
        }
        other => return Err(unexpected("pool_registration.margin", "tag 30", other)),
    };
    let parts = expect_array(inner, "pool_registration.margin")?;
    expect_len(parts, 2, "pool_registration.margin")?;
    let numerator = expect_uint(&parts[0], "pool_registration.margin")?;
    let denominator = expect_uint(&parts[1], "pool_registration.margin")?;
    if denominator == 0 || numerator > denominator {
        return Err(DecodeError::InvalidValue {
            field: "pool_registration.margin",
            reason: "margin must lie in [0, 1] with a non-zero denominator",
        });
    }
    Ok(UnitInterval {
        numerator,
        denominator,
    })
}

fn decode_relay(value: &CborValue) -> DecodeResult<PoolRelay> {
    let items = expect_array(value, "pool_relay")?;
    let kind = match items.first() {
        Some(kind) => expect_uint(kind, "pool_relay")?,
        None => {
            return Err(DecodeError::InvalidLength {
                field: "pool_relay",
                expected: 2,
                actual: 0,
            })
        }
    };

    match kind {
        0 => {
            expect_len(items, 4, "pool_relay")?;
            Ok(PoolRelay::SingleHostAddress {
                port: optional(&items[1], expect_port)?,
                ipv4: optional(&items[2], |v| expect_fixed(v, "pool_relay.ipv4"))?,
                ipv6: optional(&items[3], |v| expect_fixed(v, "pool_relay.ipv6"))?,
            })
        }
        1 => {
            expect_len(items, 3, "pool_relay")?;
            Ok(PoolRelay::SingleHostName {
                port: optional(&items[1], expect_port)?,
                dns_name: expect_text(&items[2], "pool_relay.dns_name")?,
            })
        }
        2 => {
            expect_len(items, 2, "pool_relay")?;
            Ok(PoolRelay::MultiHostName {
                dns_name: expect_text(&items[1], "pool_relay.dns_name")?,
            })
        }
        other => Err(DecodeError::UnsupportedRelayType(other)),
    }
}

// =============================================================================
// Witness set
// =============================================================================

pub fn decode_witness_set(value: &CborValue) -> DecodeResult<WitnessSet> {
    let mut entries = BTreeMap::new();
    for (key, value) in expect_map(value, "witness_set")? {
        let key = key
            .as_u64()
            .ok_or_else(|| unexpected("witness_set key", "unsigned integer", key))?;
        entries.insert(key, value.clone());
    }
    Ok(WitnessSet { entries })
}

/// Byte span of each value in an already validated witness-set map
fn raw_witness_entries(raw: &[u8]) -> DecodeResult<BTreeMap<u64, Vec<u8>>> {
    let mut d = Decoder::new(raw);
    let mut entries = BTreeMap::new();
    let mut read_entry = |d: &mut Decoder<'_>| -> DecodeResult<()> {
        let key = read_value(d)?;
        let key = key
            .as_u64()
            .ok_or_else(|| unexpected("witness_set key", "unsigned integer", &key))?;
        let start = d.position();
        read_value(d)?;
        entries.insert(key, raw[start..d.position()].to_vec());
        Ok(())
    };

    match d.map().map_err(CodecError::from)? {
        Some(n) => {
            for _ in 0..n {
                read_entry(&mut d)?;
            }
        }
        None => {
            while !at_break(&mut d)? {
                read_entry(&mut d)?;
            }
        }
    }
    Ok(entries)
}

// =============================================================================
// Field helpers
// =============================================================================

fn unexpected(field: &'static str, expected: &'static str, found: &CborValue) -> DecodeError {
    DecodeError::UnexpectedType {
        field,
        expected,
        found: found.kind(),
    }
}

fn expect_array<'a>(value: &'a CborValue, field: &'static str) -> DecodeResult<&'a [CborValue]> {
    value
        .as_array()
        .ok_or_else(|| unexpected(field, "array", value))
}

fn expect_map<'a>(
    value: &'a CborValue,
    field: &'static str,
) -> DecodeResult<&'a [(CborValue, CborValue)]> {
    match value {
        CborValue::Map(entries) => Ok(entries),
        other => Err(unexpected(field, "map", other)),
    }
}

/// A set is a plain array or an array wrapped in tag 258
fn expect_set<'a>(
    value: &'a CborValue,
    field: &'static str,
    sets: &mut SetTracker,
) -> DecodeResult<&'a [CborValue]> {
    match value {
        CborValue::Array(items) => Ok(items),
        CborValue::Tag(TAG_SET, inner) => {
            sets.tagged = true;
            expect_array(inner, field)
        }
        CborValue::Tag(tag, _) => Err(DecodeError::UnexpectedTag { field, tag: *tag }),
        other => Err(unexpected(field, "array or set", other)),
    }
}

fn expect_len(items: &[CborValue], expected: usize, field: &'static str) -> DecodeResult<()> {
    if items.len() != expected {
        return Err(DecodeError::InvalidLength {
            field,
            expected,
            actual: items.len(),
        });
    }
    Ok(())
}

fn expect_uint(value: &CborValue, field: &'static str) -> DecodeResult<u64> {
    match value {
        CborValue::Int(n) if *n < 0 => Err(DecodeError::NegativeValue(field)),
        CborValue::Int(n) => u64::try_from(*n).map_err(|_| DecodeError::IntegerOverflow(field)),
        other => Err(unexpected(field, "unsigned integer", other)),
    }
}

fn expect_i64(value: &CborValue, field: &'static str) -> DecodeResult<i64> {
    match value {
        CborValue::Int(n) => i64::try_from(*n).map_err(|_| DecodeError::IntegerOverflow(field)),
        other => Err(unexpected(field, "integer", other)),
    }
}

fn expect_port(value: &CborValue) -> DecodeResult<u16> {
    let port = expect_uint(value, "pool_relay.port")?;
    u16::try_from(port).map_err(|_| DecodeError::IntegerOverflow("pool_relay.port"))
}

fn expect_bytes<'a>(value: &'a CborValue, field: &'static str) -> DecodeResult<&'a [u8]> {
    value
        .as_bytes()
        .ok_or_else(|| unexpected(field, "bytes", value))
}

fn expect_fixed<const N: usize>(value: &CborValue, field: &'static str) -> DecodeResult<[u8; N]> {
    let bytes = expect_bytes(value, field)?;
    bytes
        .try_into()
        .map_err(|_| DecodeError::InvalidByteLength {
            field,
            expected: N,
            actual: bytes.len(),
        })
}

fn expect_hash<const N: usize>(value: &CborValue, field: &'static str) -> DecodeResult<[u8; N]> {
    expect_fixed(value, field)
}

fn expect_text(value: &CborValue, field: &'static str) -> DecodeResult<String> {
    match value {
        CborValue::Text(text) if text.len() > MAX_URL_LEN => Err(DecodeError::InvalidValue {
            field,
            reason: "text longer than 64 bytes",
        }),
        CborValue::Text(text) => Ok(text.clone()),
        other => Err(unexpected(field, "text", other)),
    }
}

fn expect_reward_account(value: &CborValue, field: &'static str) -> DecodeResult<Vec<u8>> {
    let bytes = expect_bytes(value, field)?;
    if bytes.len() != REWARD_ACCOUNT_LEN {
        return Err(DecodeError::InvalidByteLength {
            field,
            expected: REWARD_ACCOUNT_LEN,
            actual: bytes.len(),
        });
    }
    Ok(bytes.to_vec())
}

/// `#6.24(bytes)`: embedded CBOR kept byte-for-byte
fn expect_embedded_cbor(value: &CborValue, field: &'static str) -> DecodeResult<Vec<u8>> {
    match value {
        CborValue::Tag(TAG_ENCODED_CBOR, inner) => Ok(expect_bytes(inner, field)?.to_vec()),
        CborValue::Tag(tag, _) => Err(DecodeError::UnexpectedTag { field, tag: *tag }),
        other => Err(unexpected(field, "tag 24", other)),
    }
}

fn optional<T>(
    value: &CborValue,
    parse: impl FnOnce(&CborValue) -> DecodeResult<T>,
) -> DecodeResult<Option<T>> {
    if value.is_null() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

fn ensure_unique<T: Ord>(items: &[T], field: &'static str) -> DecodeResult<()> {
    let mut seen = BTreeSet::new();
    if items.iter().all(|item| seen.insert(item)) {
        Ok(())
    } else {
        Err(DecodeError::DuplicateSetElement(field))
    }
}
