//! Transaction encoder
//!
//! Maps the typed model back onto a [`CborValue`] tree. The canonical bytes
//! of that tree are what the device hashes, so this mirrors the decoder
//! field for field.

use super::types::*;
use crate::codec::encoder::write_value;
use crate::codec::{
    decode, encode_canonical, hash, CborValue, Hash32, TAG_ENCODED_CBOR, TAG_RATIONAL, TAG_SET,
};
use minicbor::encode::{Error, Write};
use minicbor::Encoder;

type VecWriteError = Error<<Vec<u8> as Write>::Error>;

impl Transaction {
    /// Wrap a body and witness set built in memory
    pub fn new(
        body: TransactionBody,
        witness_set: WitnessSet,
        is_valid: Option<bool>,
        auxiliary_data: Option<CborValue>,
    ) -> Self {
        let raw_body = encode_canonical(&body_to_value(&body));
        let raw_witnesses = witness_set
            .entries
            .iter()
            .map(|(key, value)| (*key, encode_canonical(value)))
            .collect();
        let raw_auxiliary_data = auxiliary_data.as_ref().map(encode_canonical);
        Self {
            body,
            witness_set,
            is_valid,
            auxiliary_data,
            raw_body,
            raw_witnesses,
            raw_auxiliary_data,
        }
    }

    /// Body bytes exactly as they appeared in the envelope
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// Transaction id: BLAKE2b-256 of the body bytes as received
    pub fn body_hash(&self) -> Hash32 {
        hash(&self.raw_body)
    }

    /// BLAKE2b-256 of the canonical re-encoding of the body
    pub fn canonical_body_hash(&self) -> Hash32 {
        hash(&self.canonical_body())
    }

    pub fn canonical_body(&self) -> Vec<u8> {
        encode_canonical(&body_to_value(&self.body))
    }

    /// Whether the body arrived in its canonical form
    pub fn is_canonical(&self) -> bool {
        self.raw_body == self.canonical_body()
    }

    /// Envelope with the given witness set in place of the current one.
    ///
    /// The body is written canonically, since that is what the device signs.
    /// Auxiliary data and every witness-set value still equal to what was
    /// decoded keep their received bytes; `auxiliary_data_hash` and
    /// `script_data_hash` commit to those.
    pub fn encode_with_witnesses(&self, witness_set: &WitnessSet) -> Vec<u8> {
        let mut e = Encoder::new(Vec::new());
        self.write_envelope(&mut e, witness_set)
            .expect("encoding into a Vec should not fail");
        e.into_writer()
    }

    /// Fully canonical envelope bytes
    pub fn encode_canonical(&self) -> Vec<u8> {
        let mut elements = vec![
            body_to_value(&self.body),
            witness_set_to_value(&self.witness_set),
        ];
        if let Some(flag) = self.is_valid {
            elements.push(CborValue::Bool(flag));
        }
        elements.push(self.auxiliary_data.clone().unwrap_or(CborValue::Null));
        encode_canonical(&CborValue::Array(elements))
    }

    fn write_envelope(
        &self,
        e: &mut Encoder<Vec<u8>>,
        witness_set: &WitnessSet,
    ) -> Result<(), VecWriteError> {
        e.array(if self.is_valid.is_some() { 4 } else { 3 })?;
        write_value(e, &body_to_value(&self.body))?;

        e.map(witness_set.entries.len() as u64)?;
        for (key, value) in &witness_set.entries {
            e.u64(*key)?;
            write_preserved(e, value, self.raw_witnesses.get(key))?;
        }

        if let Some(flag) = self.is_valid {
            e.bool(flag)?;
        }
        match &self.auxiliary_data {
            Some(aux) => write_preserved(e, aux, self.raw_auxiliary_data.as_ref())?,
            None => {
                e.null()?;
            }
        }
        Ok(())
    }
}

/// Splice `raw` when it still decodes to `value`, otherwise encode canonically
fn write_preserved(
    e: &mut Encoder<Vec<u8>>,
    value: &CborValue,
    raw: Option<&Vec<u8>>,
) -> Result<(), VecWriteError> {
    match raw {
        Some(raw) if decode(raw).map_or(false, |decoded| &decoded == value) => {
            e.writer_mut().extend_from_slice(raw);
            Ok(())
        }
        _ => write_value(e, value),
    }
}

// =============================================================================
// Body
// =============================================================================

pub fn body_to_value(body: &TransactionBody) -> CborValue {
    let sets = body.set_encoding;
    let mut entries = vec![
        (
            CborValue::uint(body_keys::INPUTS),
            inputs_to_value(&body.inputs, sets),
        ),
        (
            CborValue::uint(body_keys::OUTPUTS),
            CborValue::Array(body.outputs.iter().map(output_to_value).collect()),
        ),
        (CborValue::uint(body_keys::FEE), CborValue::uint(body.fee)),
    ];

    let mut push = |key: u64, value: CborValue| entries.push((CborValue::uint(key), value));

    if let Some(ttl) = body.ttl {
        push(body_keys::TTL, CborValue::uint(ttl));
    }
    if let Some(certs) = &body.certificates {
        push(
            body_keys::CERTIFICATES,
            set_value(certs.iter().map(|c| certificate_to_value(c, sets)).collect(), sets),
        );
    }
    if let Some(withdrawals) = &body.withdrawals {
        push(
            body_keys::WITHDRAWALS,
            CborValue::map(
                withdrawals
                    .iter()
                    .map(|(account, amount)| {
                        (CborValue::from(account.as_slice()), CborValue::uint(*amount))
                    })
                    .collect(),
            ),
        );
    }
    if let Some(aux_hash) = &body.auxiliary_data_hash {
        push(body_keys::AUXILIARY_DATA_HASH, CborValue::from(&aux_hash[..]));
    }
    if let Some(start) = body.validity_interval_start {
        push(body_keys::VALIDITY_INTERVAL_START, CborValue::uint(start));
    }
    if let Some(mint) = &body.mint {
        push(body_keys::MINT, multiasset_to_value(mint, |q| CborValue::from(*q)));
    }
    if let Some(script_data_hash) = &body.script_data_hash {
        push(body_keys::SCRIPT_DATA_HASH, CborValue::from(&script_data_hash[..]));
    }
    if let Some(collateral) = &body.collateral_inputs {
        push(body_keys::COLLATERAL_INPUTS, inputs_to_value(collateral, sets));
    }
    if let Some(signers) = &body.required_signers {
        push(
            body_keys::REQUIRED_SIGNERS,
            set_value(signers.iter().map(|s| CborValue::from(&s[..])).collect(), sets),
        );
    }
    if let Some(network_id) = body.network_id {
        push(body_keys::NETWORK_ID, CborValue::uint(u64::from(network_id)));
    }
    if let Some(collateral_return) = &body.collateral_return {
        push(body_keys::COLLATERAL_RETURN, output_to_value(collateral_return));
    }
    if let Some(total) = body.total_collateral {
        push(body_keys::TOTAL_COLLATERAL, CborValue::uint(total));
    }
    if let Some(reference) = &body.reference_inputs {
        push(body_keys::REFERENCE_INPUTS, inputs_to_value(reference, sets));
    }
    for (key, value) in &body.other_fields {
        push(*key, value.clone());
    }

    CborValue::map(entries)
}

fn set_value(items: Vec<CborValue>, encoding: SetEncoding) -> CborValue {
    match encoding {
        SetEncoding::Plain => CborValue::Array(items),
        SetEncoding::Tagged => CborValue::tagged(TAG_SET, CborValue::Array(items)),
    }
}

fn inputs_to_value(inputs: &[TxInput], encoding: SetEncoding) -> CborValue {
    set_value(
        inputs
            .iter()
            .map(|input| {
                CborValue::Array(vec![
                    CborValue::from(&input.tx_hash[..]),
                    CborValue::uint(input.output_index),
                ])
            })
            .collect(),
        encoding,
    )
}

// =============================================================================
// Outputs
// =============================================================================

/// Array-format outputs can only carry a datum hash; anything richer is
/// emitted in map format.
pub fn output_to_value(output: &TxOutput) -> CborValue {
    let array_compatible = output.script_ref.is_none()
        && !matches!(output.datum, Some(DatumOption::Inline(_)));

    if output.format == OutputFormat::Array && array_compatible {
        let mut items = vec![
            CborValue::from(output.address.as_slice()),
            amount_to_value(&output.amount),
        ];
        if let Some(DatumOption::Hash(datum_hash)) = &output.datum {
            items.push(CborValue::from(&datum_hash[..]));
        }
        return CborValue::Array(items);
    }

    let mut entries = vec![
        (CborValue::uint(0), CborValue::from(output.address.as_slice())),
        (CborValue::uint(1), amount_to_value(&output.amount)),
    ];
    if let Some(datum) = &output.datum {
        let option = match datum {
            DatumOption::Hash(datum_hash) => {
                CborValue::Array(vec![CborValue::uint(0), CborValue::from(&datum_hash[..])])
            }
            DatumOption::Inline(data) => CborValue::Array(vec![
                CborValue::uint(1),
                CborValue::tagged(TAG_ENCODED_CBOR, CborValue::from(data.as_slice())),
            ]),
        };
        entries.push((CborValue::uint(2), option));
    }
    if let Some(script) = &output.script_ref {
        entries.push((
            CborValue::uint(3),
            CborValue::tagged(TAG_ENCODED_CBOR, CborValue::from(script.as_slice())),
        ));
    }
    CborValue::map(entries)
}

fn amount_to_value(amount: &OutputAmount) -> CborValue {
    match amount {
        OutputAmount::Coin(coin) => CborValue::uint(*coin),
        OutputAmount::WithAssets { coin, assets } => CborValue::Array(vec![
            CborValue::uint(*coin),
            multiasset_to_value(assets, |q| CborValue::uint(*q)),
        ]),
    }
}

fn multiasset_to_value<Q>(
    assets: &MultiAsset<Q>,
    quantity: impl Fn(&Q) -> CborValue,
) -> CborValue {
    CborValue::map(
        assets
            .iter()
            .map(|(policy, names)| {
                let names = CborValue::map(
                    names
                        .iter()
                        .map(|(name, q)| (CborValue::from(name.as_slice()), quantity(q)))
                        .collect(),
                );
                (CborValue::from(&policy[..]), names)
            })
            .collect(),
    )
}

// =============================================================================
// Certificates
// =============================================================================

fn credential_to_value(credential: &StakeCredential) -> CborValue {
    let (kind, hash) = match credential {
        StakeCredential::KeyHash(hash) => (0, hash),
        StakeCredential::ScriptHash(hash) => (1, hash),
    };
    CborValue::Array(vec![CborValue::uint(kind), CborValue::from(&hash[..])])
}

fn certificate_to_value(cert: &Certificate, sets: SetEncoding) -> CborValue {
    let kind = CborValue::uint(cert.type_id());
    match cert {
        Certificate::StakeKeyRegistration { credential }
        | Certificate::StakeKeyDeregistration { credential } => {
            CborValue::Array(vec![kind, credential_to_value(credential)])
        }
        Certificate::Delegation {
            credential,
            pool_key_hash,
        } => CborValue::Array(vec![
            kind,
            credential_to_value(credential),
            CborValue::from(&pool_key_hash[..]),
        ]),
        Certificate::StakepoolRegistration(params) => {
            let mut items = vec![kind];
            items.extend(pool_params_to_values(params, sets));
            CborValue::Array(items)
        }
        Certificate::StakepoolRetirement {
            pool_key_hash,
            epoch,
        } => CborValue::Array(vec![
            kind,
            CborValue::from(&pool_key_hash[..]),
            CborValue::uint(*epoch),
        ]),
    }
}

fn pool_params_to_values(params: &PoolParams, sets: SetEncoding) -> Vec<CborValue> {
    let margin = CborValue::tagged(
        TAG_RATIONAL,
        CborValue::Array(vec![
            CborValue::uint(params.margin.numerator),
            CborValue::uint(params.margin.denominator),
        ]),
    );
    let owners = set_value(
        params.owners.iter().map(|o| CborValue::from(&o[..])).collect(),
        sets,
    );
    let metadata = match &params.metadata {
        Some(meta) => CborValue::Array(vec![
            CborValue::from(meta.url.as_str()),
            CborValue::from(&meta.hash[..]),
        ]),
        None => CborValue::Null,
    };

    vec![
        CborValue::from(&params.operator[..]),
        CborValue::from(&params.vrf_key_hash[..]),
        CborValue::uint(params.pledge),
        CborValue::uint(params.cost),
        margin,
        CborValue::from(params.reward_account.as_slice()),
        owners,
        CborValue::Array(params.relays.iter().map(relay_to_value).collect()),
        metadata,
    ]
}

fn relay_to_value(relay: &PoolRelay) -> CborValue {
    fn or_null<T>(value: &Option<T>, f: impl FnOnce(&T) -> CborValue) -> CborValue {
        value.as_ref().map(f).unwrap_or(CborValue::Null)
    }
    let port = |p: &u16| CborValue::uint(u64::from(*p));

    match relay {
        PoolRelay::SingleHostAddress { port: p, ipv4, ipv6 } => CborValue::Array(vec![
            CborValue::uint(0),
            or_null(p, port),
            or_null(ipv4, |ip| CborValue::from(&ip[..])),
            or_null(ipv6, |ip| CborValue::from(&ip[..])),
        ]),
        PoolRelay::SingleHostName { port: p, dns_name } => CborValue::Array(vec![
            CborValue::uint(1),
            or_null(p, port),
            CborValue::from(dns_name.as_str()),
        ]),
        PoolRelay::MultiHostName { dns_name } => {
            CborValue::Array(vec![CborValue::uint(2), CborValue::from(dns_name.as_str())])
        }
    }
}

// =============================================================================
// Witness set
// =============================================================================

pub fn witness_set_to_value(witness_set: &WitnessSet) -> CborValue {
    CborValue::map(
        witness_set
            .entries
            .iter()
            .map(|(key, value)| (CborValue::uint(*key), value.clone()))
            .collect(),
    )
}
