use ed25519_dalek::SigningKey;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// One input, one output, fee 170000, ttl 5000
fn shelley_tx(fee_hex: &str) -> String {
    format!(
        "83a40081825820{}00018182581d61{}1a000f424002{}03191388a0f6",
        "00".repeat(32),
        "11".repeat(28),
        fee_hex
    )
}

fn payment_signing_file(name: &str) -> PathBuf {
    let secret = SigningKey::from_bytes(&[7; 32]);
    let mut xpub = secret.verifying_key().to_bytes().to_vec();
    xpub.extend_from_slice(&[9; 32]);
    let record = serde_json::json!({
        "type": "PaymentHWSigningFileShelley_ed25519",
        "description": "Payment Hardware Signing File",
        "path": "1852H/1815H/0H/0/0",
        "cborXPubKeyHex": format!("5840{}", hex::encode(xpub)),
    });

    let path = std::env::temp_dir().join(format!(
        "cardano-hw-inspect-{}-{}.hwsfile",
        name,
        std::process::id()
    ));
    fs::write(&path, record.to_string()).expect("write signing file");
    path
}

fn run_inspect(stdin: &str, args: &[&str]) -> std::process::Output {
    let binary_path = assert_cmd::cargo::cargo_bin!("cardano-hw-tx-inspect");
    let mut child = Command::new(binary_path)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("cli starts");
    // the cli may exit on bad arguments before reading stdin
    let _ = child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(stdin.as_bytes());
    child.wait_with_output().expect("cli run completes")
}

fn inspect_json(stdin: &str, args: &[&str]) -> Value {
    let output = run_inspect(stdin, args);
    assert!(
        output.status.success(),
        "cli exited unsuccessfully: {:?}",
        output
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

#[test]
fn cli_summarises_transaction_without_signing_files() {
    let summary = inspect_json(&shelley_tx("1a00029810"), &[]);

    assert_eq!(summary["era"], "shelley");
    assert_eq!(summary["canonical"], true);
    assert_eq!(summary["inputs"], 1);
    assert_eq!(summary["outputs"], 1);
    assert_eq!(summary["fee"], 170000);
    assert_eq!(summary["bodyHash"], summary["rawBodyHash"]);
    assert_eq!(summary["signingMode"], "Ordinary");
    assert_eq!(summary["error"]["code"], "policy_violation");
}

#[test]
fn cli_flags_non_canonical_body() {
    let summary = inspect_json(&shelley_tx("1b0000000000029810"), &[]);

    assert_eq!(summary["canonical"], false);
    assert_eq!(summary["fee"], 170000);
    assert_ne!(summary["bodyHash"], summary["rawBodyHash"]);
}

#[test]
fn cli_accepts_text_envelope_and_signing_file() {
    let signing_file = payment_signing_file("payment");
    let envelope = serde_json::json!({
        "type": "Unwitnessed Tx ShelleyEra",
        "description": "",
        "cborHex": shelley_tx("1a00029810"),
    });

    let summary = inspect_json(
        &envelope.to_string(),
        &[
            "--signing-file",
            signing_file.to_str().expect("utf8 temp path"),
            "--network",
            "preprod",
        ],
    );
    let _ = fs::remove_file(&signing_file);

    assert_eq!(summary["signingMode"], "Ordinary");
    assert!(summary.get("error").is_none(), "unexpected error: {}", summary);
    assert_eq!(summary["network"]["protocolMagic"], 1);
    assert_eq!(summary["signingFiles"][0]["role"], "Payment");
    assert_eq!(summary["signingFiles"][0]["path"], "1852'/1815'/0'/0/0");
}

#[test]
fn cli_witness_purpose_limits_signing_files() {
    let first = payment_signing_file("first");
    let summary = inspect_json(
        &shelley_tx("1a00029810"),
        &[
            "--purpose",
            "witness",
            "--signing-file",
            first.to_str().expect("utf8 temp path"),
            "--signing-file",
            first.to_str().expect("utf8 temp path"),
        ],
    );
    let _ = fs::remove_file(&first);

    assert_eq!(summary["purpose"], "witness");
    assert_eq!(summary["error"]["code"], "policy_violation");
}

#[test]
fn cli_rejects_malformed_input() {
    let output = run_inspect("83a4zz", &[]);
    assert!(!output.status.success());

    let output = run_inspect(&shelley_tx("1a00029810"), &["--network", "atlantis"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown network"), "stderr: {}", stderr);
}
