use async_trait::async_trait;
use cardano_hw_signing::codec::{hash, Hash32};
use cardano_hw_signing::signing::policy::PolicyError;
use cardano_hw_signing::tx::{
    Certificate, OutputAmount, PoolParams, PoolRelay, StakeCredential, UnitInterval,
};
use cardano_hw_signing::{
    assemble, classify, sign_with_device, validate, AssemblyError, DecodeError, DerivationPath,
    DeviceError, DeviceResponse, DeviceSession, DeviceSignature, HwSigningDescriptor, KeyRole,
    Network, SignFlowError, SigningMode, SigningParameters, SigningPurpose, Transaction,
    TransactionBody, TxInput, TxOutput, WitnessSet,
};
use ed25519_dalek::{Signer, SigningKey};

const PAYMENT: &str = "1852'/1815'/0'/0/0";
const STAKE: &str = "1852'/1815'/0'/2/0";
const POOL_COLD: &str = "1853'/1815'/0'/0'";

struct DeviceKey {
    descriptor: HwSigningDescriptor,
    secret: SigningKey,
}

impl DeviceKey {
    fn new(role: KeyRole, path: &str, seed: u8) -> Self {
        let secret = SigningKey::from_bytes(&[seed; 32]);
        let mut xpub = secret.verifying_key().to_bytes().to_vec();
        xpub.extend_from_slice(&[seed.wrapping_add(0x80); 32]);
        let descriptor =
            HwSigningDescriptor::new(role, DerivationPath::parse(path).unwrap(), &xpub).unwrap();
        Self { descriptor, secret }
    }
}

/// Signs whatever hash it is handed; optionally reports a different one
struct FakeDevice {
    keys: Vec<DeviceKey>,
    reported_hash: Option<Hash32>,
    fail: Option<DeviceError>,
}

impl FakeDevice {
    fn new(keys: Vec<DeviceKey>) -> Self {
        Self {
            keys,
            reported_hash: None,
            fail: None,
        }
    }

    fn descriptors(&self) -> Vec<HwSigningDescriptor> {
        self.keys.iter().map(|k| k.descriptor.clone()).collect()
    }
}

#[async_trait]
impl DeviceSession for FakeDevice {
    async fn sign(&self, params: &SigningParameters<'_>) -> Result<DeviceResponse, DeviceError> {
        if let Some(err) = &self.fail {
            return Err(err.clone());
        }
        let signatures = self
            .keys
            .iter()
            .map(|k| {
                DeviceSignature::new(
                    k.descriptor.path().clone(),
                    k.secret.sign(&params.body_hash).to_bytes().to_vec(),
                )
            })
            .collect();
        Ok(DeviceResponse {
            signatures,
            body_hash: Some(self.reported_hash.unwrap_or(params.body_hash)),
        })
    }
}

fn simple_body() -> TransactionBody {
    TransactionBody::new(
        vec![TxInput::new([0x10; 32], 1)],
        vec![TxOutput::new(vec![0x01; 57], OutputAmount::Coin(5_000_000))],
        180_000,
    )
}

fn delegation_body(stake: &HwSigningDescriptor) -> TransactionBody {
    let mut body = simple_body();
    body.certificates = Some(vec![Certificate::Delegation {
        credential: StakeCredential::KeyHash(stake.key_hash()),
        pool_key_hash: [0x77; 28],
    }]);
    body
}

fn pool_registration_body() -> TransactionBody {
    let mut reward_account = vec![0xe1];
    reward_account.extend_from_slice(&[0x21; 28]);
    let mut body = simple_body();
    body.certificates = Some(vec![Certificate::StakepoolRegistration(PoolParams {
        operator: [0x20; 28],
        vrf_key_hash: [0x22; 32],
        pledge: 100_000_000,
        cost: 340_000_000,
        margin: UnitInterval {
            numerator: 3,
            denominator: 100,
        },
        reward_account,
        owners: vec![[0x23; 28]],
        relays: vec![PoolRelay::SingleHostAddress {
            port: Some(6000),
            ipv4: Some([10, 0, 0, 1]),
            ipv6: None,
        }],
        metadata: None,
    })]);
    body
}

fn tx(body: TransactionBody) -> Transaction {
    Transaction::new(body, WitnessSet::default(), None, None)
}

fn prepare<'a>(
    transaction: &'a Transaction,
    descriptors: &'a [HwSigningDescriptor],
) -> SigningParameters<'a> {
    SigningParameters::prepare(transaction, descriptors, SigningPurpose::Sign, Network::MAINNET)
        .unwrap()
}

#[test]
fn delegation_with_payment_and_stake_is_ordinary() {
    let payment = DeviceKey::new(KeyRole::Payment, PAYMENT, 1);
    let stake = DeviceKey::new(KeyRole::Stake, STAKE, 2);
    let transaction = tx(delegation_body(&stake.descriptor));
    let descriptors = vec![payment.descriptor, stake.descriptor];

    assert_eq!(
        classify(&transaction.body, &descriptors),
        Ok(SigningMode::Ordinary)
    );
    assert_eq!(validate(&prepare(&transaction, &descriptors)), Ok(()));
}

#[test]
fn delegation_without_stake_file_is_rejected() {
    let payment = DeviceKey::new(KeyRole::Payment, PAYMENT, 1);
    let stake = DeviceKey::new(KeyRole::Stake, STAKE, 2);
    let transaction = tx(delegation_body(&stake.descriptor));
    let descriptors = vec![payment.descriptor];

    assert_eq!(
        validate(&prepare(&transaction, &descriptors)),
        Err(PolicyError::MissingStakeSigningFile)
    );
}

#[test]
fn pool_registration_as_operator_rejects_payment_file() {
    let pool = DeviceKey::new(KeyRole::PoolCold, POOL_COLD, 3);
    let transaction = tx(pool_registration_body());

    let operator_only = vec![pool.descriptor.clone()];
    assert_eq!(
        classify(&transaction.body, &operator_only),
        Ok(SigningMode::PoolRegistrationAsOperator)
    );
    assert_eq!(validate(&prepare(&transaction, &operator_only)), Ok(()));

    let payment = DeviceKey::new(KeyRole::Payment, PAYMENT, 1);
    let with_payment = vec![pool.descriptor, payment.descriptor];
    assert_eq!(
        validate(&prepare(&transaction, &with_payment)),
        Err(PolicyError::TooManyPaymentFilesWithPoolReg)
    );
}

#[test]
fn assembly_checks_device_body_hash() {
    let payment = DeviceKey::new(KeyRole::Payment, PAYMENT, 1);
    let transaction = tx(simple_body());
    let descriptors = vec![payment.descriptor.clone()];
    let params = prepare(&transaction, &descriptors);

    let signature = DeviceSignature::new(
        payment.descriptor.path().clone(),
        payment.secret.sign(&params.body_hash).to_bytes().to_vec(),
    );
    let response = DeviceResponse {
        signatures: vec![signature.clone()],
        body_hash: Some(params.body_hash),
    };
    let signed = assemble(&params, &response).unwrap();
    let decoded = Transaction::decode(&signed.cbor).unwrap();
    assert_eq!(decoded.body, transaction.body);
    assert!(decoded.witness_set.get(0).is_some());

    // Device hashed a body that differs from ours in one byte
    let mut flipped = transaction.canonical_body();
    let last = flipped.len() - 1;
    flipped[last] ^= 0x01;
    let response = DeviceResponse {
        signatures: vec![signature],
        body_hash: Some(hash(&flipped)),
    };
    assert!(matches!(
        assemble(&params, &response),
        Err(AssemblyError::SerializationMismatch { .. })
    ));
}

#[test]
fn unknown_certificate_tag_fails_decoding() {
    // body {0: [[h'00'*32, 0]], 1: [[addr, 1000000]], 2: 0, 4: [[7, 0]]}
    let hex = format!(
        "83a40081825820{}00018182581d61{}1a000f424002000481820700a0f6",
        "00".repeat(32),
        "11".repeat(28)
    );
    assert_eq!(
        Transaction::from_hex(&hex).unwrap_err(),
        DecodeError::UnsupportedCertificateType(7)
    );
}

#[tokio::test]
async fn device_flow_produces_signed_transaction() {
    let device = FakeDevice::new(vec![DeviceKey::new(KeyRole::Payment, PAYMENT, 1)]);
    let descriptors = device.descriptors();
    let transaction = tx(simple_body());

    let signed = sign_with_device(
        &device,
        &transaction,
        &descriptors,
        SigningPurpose::Sign,
        Network::MAINNET,
    )
    .await
    .unwrap();

    assert_eq!(signed.envelope_type(), "Witnessed Tx AllegraEra");
    let decoded = Transaction::decode(&signed.cbor).unwrap();
    assert_eq!(decoded.canonical_body_hash(), transaction.canonical_body_hash());
}

#[tokio::test]
async fn device_flow_witness_only() {
    let device = FakeDevice::new(vec![DeviceKey::new(KeyRole::Payment, PAYMENT, 1)]);
    let descriptors = device.descriptors();
    let transaction = tx(simple_body());

    let witness = sign_with_device(
        &device,
        &transaction,
        &descriptors,
        SigningPurpose::Witness,
        Network::PREPROD,
    )
    .await
    .unwrap();

    assert_eq!(witness.purpose, SigningPurpose::Witness);
    assert_eq!(witness.text_envelope().envelope_type, "TxWitness AllegraEra");
    // [0, [vkey, signature]]
    assert_eq!(&witness.cbor[..2], &[0x82, 0x00]);
}

#[tokio::test]
async fn device_errors_are_forwarded() {
    let mut device = FakeDevice::new(vec![DeviceKey::new(KeyRole::Payment, PAYMENT, 1)]);
    device.fail = Some(DeviceError::Rejected("user declined".to_string()));
    let descriptors = device.descriptors();
    let transaction = tx(simple_body());

    let err = sign_with_device(
        &device,
        &transaction,
        &descriptors,
        SigningPurpose::Sign,
        Network::MAINNET,
    )
    .await
    .unwrap_err();
    assert_eq!(
        err,
        SignFlowError::Device(DeviceError::Rejected("user declined".to_string()))
    );
}

#[tokio::test]
async fn device_flow_rejects_tampered_hash() {
    let mut device = FakeDevice::new(vec![DeviceKey::new(KeyRole::Payment, PAYMENT, 1)]);
    device.reported_hash = Some([0xee; 32]);
    let descriptors = device.descriptors();
    let transaction = tx(simple_body());

    let err = sign_with_device(
        &device,
        &transaction,
        &descriptors,
        SigningPurpose::Sign,
        Network::MAINNET,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        SignFlowError::Assembly(AssemblyError::SerializationMismatch { .. })
    ));
}

#[tokio::test]
async fn policy_failure_stops_before_device() {
    let mut device = FakeDevice::new(vec![DeviceKey::new(KeyRole::Stake, STAKE, 2)]);
    // Would surface as a device error if the session were reached
    device.fail = Some(DeviceError::Transport("unreachable".to_string()));
    let descriptors = device.descriptors();
    let transaction = tx(simple_body());

    let err = sign_with_device(
        &device,
        &transaction,
        &descriptors,
        SigningPurpose::Sign,
        Network::MAINNET,
    )
    .await
    .unwrap_err();
    assert_eq!(
        err,
        SignFlowError::Policy(PolicyError::MissingPaymentSigningFile)
    );
}
