use anyhow::{anyhow, bail, Context, Result};
use cardano_hw_signing::codec::{Hash28, Hash32};
use cardano_hw_signing::signing::{policy, SigningParameters};
use cardano_hw_signing::{
    serde_bytes, utils, Era, HwSignError, HwSigningDescriptor, KeyRole, Network, SigningMode,
    SigningPurpose, Transaction,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Inspect a Cardano transaction before sending it to a hardware wallet
#[derive(Parser, Debug)]
#[command(name = "cardano-hw-tx-inspect", version)]
struct Cli {
    /// Transaction file (hex or text envelope JSON). Reads stdin when omitted
    tx_file: Option<PathBuf>,

    /// Hardware signing file, may be repeated
    #[arg(long = "signing-file", value_name = "FILE")]
    signing_files: Vec<PathBuf>,

    /// Target network: mainnet, preprod or preview
    #[arg(long, default_value = "mainnet")]
    network: String,

    #[arg(long, value_enum, default_value_t = Purpose::Sign)]
    purpose: Purpose,

    /// Print debug log lines to stderr
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Purpose {
    Sign,
    Witness,
}

impl From<Purpose> for SigningPurpose {
    fn from(p: Purpose) -> Self {
        match p {
            Purpose::Sign => SigningPurpose::Sign,
            Purpose::Witness => SigningPurpose::Witness,
        }
    }
}

#[derive(Deserialize)]
struct EnvelopeFile {
    #[serde(rename = "cborHex")]
    cbor_hex: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningFileSummary {
    path: String,
    role: KeyRole,
    #[serde(with = "serde_bytes::hex28")]
    key_hash: Hash28,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectSummary {
    era: Era,
    #[serde(with = "serde_bytes::hex32")]
    body_hash: Hash32,
    #[serde(with = "serde_bytes::hex32")]
    raw_body_hash: Hash32,
    canonical: bool,
    inputs: usize,
    outputs: usize,
    fee: u64,
    certificates: usize,
    #[serde(with = "serde_bytes::hex32_option", skip_serializing_if = "Option::is_none")]
    auxiliary_data_hash: Option<Hash32>,
    #[serde(with = "serde_bytes::hex32_option", skip_serializing_if = "Option::is_none")]
    script_data_hash: Option<Hash32>,
    network: Network,
    purpose: SigningPurpose,
    signing_files: Vec<SigningFileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signing_mode: Option<SigningMode>,
    /// Classification or policy failure, absent when the transaction can be signed
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<HwSignError>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(if cli.debug {
        utils::LogLevel::Debug
    } else {
        utils::LogLevel::Info
    });

    let network = Network::from_name(&cli.network)
        .ok_or_else(|| anyhow!("unknown network '{}'", cli.network))?;

    let payload = match &cli.tx_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let tx_hex = extract_hex(&payload)?;
    let transaction = Transaction::from_hex(&tx_hex).map_err(HwSignError::from)?;

    let mut descriptors = Vec::with_capacity(cli.signing_files.len());
    for path in &cli.signing_files {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let descriptor = HwSigningDescriptor::from_json(&json)
            .map_err(HwSignError::from)
            .with_context(|| format!("loading signing file {}", path.display()))?;
        descriptors.push(descriptor);
    }

    let summary = inspect(&transaction, &descriptors, cli.purpose.into(), network);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Accept raw hex or a text envelope carrying `cborHex`
fn extract_hex(payload: &str) -> Result<String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        bail!("empty transaction input");
    }
    if trimmed.starts_with('{') {
        let envelope: EnvelopeFile =
            serde_json::from_str(trimmed).context("parsing text envelope")?;
        return Ok(envelope.cbor_hex);
    }
    Ok(trimmed.split_whitespace().collect())
}

fn inspect(
    transaction: &Transaction,
    descriptors: &[HwSigningDescriptor],
    purpose: SigningPurpose,
    network: Network,
) -> InspectSummary {
    let body = &transaction.body;
    let signing_files = descriptors
        .iter()
        .map(|d| SigningFileSummary {
            path: d.path().to_string(),
            role: d.role(),
            key_hash: d.key_hash(),
        })
        .collect();

    let (signing_mode, error) =
        match SigningParameters::prepare(transaction, descriptors, purpose, network) {
            Ok(params) => {
                let error = policy::validate(&params).err().map(HwSignError::from);
                (Some(params.mode), error)
            }
            Err(e) => (None, Some(HwSignError::from(e))),
        };

    InspectSummary {
        era: transaction.era(),
        body_hash: transaction.canonical_body_hash(),
        raw_body_hash: transaction.body_hash(),
        canonical: transaction.is_canonical(),
        inputs: body.inputs.len(),
        outputs: body.outputs.len(),
        fee: body.fee,
        certificates: body.certificates().len(),
        auxiliary_data_hash: body.auxiliary_data_hash,
        script_data_hash: body.script_data_hash,
        network,
        purpose,
        signing_files,
        signing_mode,
        error,
    }
}
