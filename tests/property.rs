use cardano_hw_signing::codec::{decode, encode_canonical, hash, CborValue};
use cardano_hw_signing::signing::{DerivationPath, PolicyError};
use cardano_hw_signing::tx::{Certificate, OutputAmount, PoolParams, StakeCredential, UnitInterval};
use cardano_hw_signing::{
    classify, validate, HwSigningDescriptor, KeyRole, Network, SigningMode, SigningParameters,
    SigningPurpose, Transaction, TransactionBody, TxInput, TxOutput, WitnessSet,
};
use ed25519_dalek::SigningKey;
use proptest::prelude::*;

fn descriptor(role: KeyRole, path: &str, seed: u8) -> HwSigningDescriptor {
    let secret = SigningKey::from_bytes(&[seed; 32]);
    let mut xpub = secret.verifying_key().to_bytes().to_vec();
    xpub.extend_from_slice(&[seed; 32]);
    HwSigningDescriptor::new(role, DerivationPath::parse(path).expect("valid path"), &xpub)
        .expect("valid descriptor")
}

fn validate_sign(tx: &Transaction, descriptors: &[HwSigningDescriptor]) -> Result<(), PolicyError> {
    let params =
        SigningParameters::prepare(tx, descriptors, SigningPurpose::Sign, Network::MAINNET)
            .expect("transaction classifies");
    validate(&params)
}

fn pool_registration(owner: [u8; 28]) -> Certificate {
    let mut reward_account = vec![0xe1];
    reward_account.extend_from_slice(&[0x21; 28]);
    Certificate::StakepoolRegistration(PoolParams {
        operator: [0x20; 28],
        vrf_key_hash: [0x22; 32],
        pledge: 1_000_000,
        cost: 340_000_000,
        margin: UnitInterval {
            numerator: 1,
            denominator: 100,
        },
        reward_account,
        owners: vec![owner],
        relays: vec![],
        metadata: None,
    })
}

fn any_input() -> impl Strategy<Value = TxInput> {
    (prop::array::uniform32(any::<u8>()), 0u64..64).prop_map(|(h, i)| TxInput::new(h, i))
}

fn any_output() -> impl Strategy<Value = TxOutput> {
    (prop::collection::vec(any::<u8>(), 29), any::<u64>())
        .prop_map(|(address, coin)| TxOutput::new(address, OutputAmount::Coin(coin)))
}

fn any_body() -> impl Strategy<Value = TransactionBody> {
    (
        prop::collection::btree_set(any_input(), 1..4),
        prop::collection::vec(any_output(), 1..4),
        any::<u64>(),
        prop::option::of(any::<u64>()),
    )
        .prop_map(|(inputs, outputs, fee, ttl)| {
            let mut body = TransactionBody::new(inputs.into_iter().collect(), outputs, fee);
            body.ttl = ttl;
            body
        })
}

fn any_scalar() -> impl Strategy<Value = CborValue> {
    prop_oneof![
        any::<i64>().prop_map(|n| CborValue::Int(i128::from(n))),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(CborValue::Bytes),
        "[a-z]{0,12}".prop_map(CborValue::Text),
        any::<bool>().prop_map(CborValue::Bool),
        Just(CborValue::Null),
    ]
}

fn any_value() -> impl Strategy<Value = CborValue> {
    any_scalar().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(CborValue::Array),
            prop::collection::btree_map(any::<u32>(), inner, 0..6).prop_map(|entries| {
                CborValue::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (CborValue::uint(u64::from(k)), v))
                        .collect(),
                )
            }),
        ]
    })
}

proptest! {
    #[test]
    fn transactions_roundtrip(body in any_body()) {
        let tx = Transaction::new(body, WitnessSet::default(), None, None);
        let bytes = tx.encode_canonical();

        let decoded = Transaction::decode(&bytes).expect("canonical bytes decode");
        prop_assert_eq!(&decoded.body, &tx.body);
        prop_assert!(decoded.is_canonical());
        prop_assert_eq!(decoded.body_hash(), tx.canonical_body_hash());
        prop_assert_eq!(decoded.encode_canonical(), bytes);
    }

    #[test]
    fn canonical_encoding_is_idempotent(value in any_value()) {
        let once = encode_canonical(&value);
        let twice = encode_canonical(&decode(&once).expect("own output decodes"));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn hash_ignores_map_insertion_order(
        entries in prop::collection::btree_map(any::<u16>(), any::<u64>(), 1..12),
    ) {
        let forward: Vec<_> = entries
            .iter()
            .map(|(k, v)| (CborValue::uint(u64::from(*k)), CborValue::uint(*v)))
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        prop_assert_eq!(
            hash(&encode_canonical(&CborValue::Map(forward))),
            hash(&encode_canonical(&CborValue::Map(reversed)))
        );
    }

    #[test]
    fn classification_is_total(
        body in any_body(),
        delegate in any::<bool>(),
        roles in prop::collection::vec(0usize..5, 0..5),
    ) {
        let mut body = body;
        if delegate {
            body.certificates = Some(vec![Certificate::Delegation {
                credential: StakeCredential::KeyHash([0x44; 28]),
                pool_key_hash: [0x55; 28],
            }]);
        }
        let catalogue = [
            (KeyRole::Payment, "1852'/1815'/0'/0/0"),
            (KeyRole::Stake, "1852'/1815'/0'/2/0"),
            (KeyRole::PoolCold, "1853'/1815'/0'/0'"),
            (KeyRole::Mint, "1855'/1815'/0'"),
            (KeyRole::MultiSig, "1854'/1815'/0'/0/0"),
        ];
        let descriptors: Vec<_> = roles
            .iter()
            .map(|&i| descriptor(catalogue[i].0, catalogue[i].1, i as u8 + 1))
            .collect();

        // Either outcome is acceptable; reaching this line is the property.
        let _ = classify(&body, &descriptors);
    }

    #[test]
    fn forbidden_role_breaks_valid_ordinary_set(body in any_body(), pick in 0usize..3) {
        let tx = Transaction::new(body, WitnessSet::default(), None, None);
        let mut descriptors = vec![descriptor(KeyRole::Payment, "1852'/1815'/0'/0/0", 1)];
        prop_assert_eq!(validate_sign(&tx, &descriptors), Ok(()));

        let (extra, expected) = match pick {
            0 => (
                descriptor(KeyRole::Stake, "1852'/1815'/0'/2/0", 2),
                PolicyError::UnexpectedStakeSigningFile,
            ),
            1 => (
                descriptor(KeyRole::PoolCold, "1853'/1815'/0'/0'", 3),
                PolicyError::UnexpectedPoolColdSigningFile,
            ),
            _ => (
                descriptor(KeyRole::Mint, "1855'/1815'/0'", 4),
                PolicyError::UnexpectedMintSigningFile,
            ),
        };
        descriptors.push(extra);
        prop_assert_eq!(validate_sign(&tx, &descriptors), Err(expected));
    }

    #[test]
    fn removing_required_role_breaks_valid_set(body in any_body(), drop_stake in any::<bool>()) {
        let stake = descriptor(KeyRole::Stake, "1852'/1815'/0'/2/0", 2);
        let mut body = body;
        body.certificates = Some(vec![Certificate::Delegation {
            credential: StakeCredential::KeyHash(stake.key_hash()),
            pool_key_hash: [0x55; 28],
        }]);
        let tx = Transaction::new(body, WitnessSet::default(), None, None);
        let payment = descriptor(KeyRole::Payment, "1852'/1815'/0'/0/0", 1);

        let full = vec![payment.clone(), stake.clone()];
        prop_assert_eq!(validate_sign(&tx, &full), Ok(()));

        let (reduced, expected) = if drop_stake {
            (vec![payment], PolicyError::MissingStakeSigningFile)
        } else {
            (vec![stake], PolicyError::MissingPaymentSigningFile)
        };
        prop_assert_eq!(validate_sign(&tx, &reduced), Err(expected));
    }

    #[test]
    fn forbidden_role_breaks_valid_pool_and_multisig_sets(
        body in any_body(),
        mode in 0usize..3,
        pick in 0usize..4,
    ) {
        let payment = descriptor(KeyRole::Payment, "1852'/1815'/0'/0/0", 1);
        let stake = descriptor(KeyRole::Stake, "1852'/1815'/0'/2/0", 2);
        let pool_cold = descriptor(KeyRole::PoolCold, "1853'/1815'/0'/0'", 3);
        let mint = descriptor(KeyRole::Mint, "1855'/1815'/0'", 4);
        let multisig = descriptor(KeyRole::MultiSig, "1854'/1815'/0'/0/0", 5);

        let mut body = body;
        let (expected_mode, valid, extras) = match mode {
            0 => {
                body.certificates = Some(vec![pool_registration(stake.key_hash())]);
                (
                    SigningMode::PoolRegistrationAsOwner,
                    vec![stake.clone()],
                    [
                        (payment, PolicyError::TooManyPaymentFilesWithPoolReg),
                        // switches to operator mode, where the stake file is foreign
                        (pool_cold, PolicyError::UnexpectedStakeSigningFile),
                        (mint, PolicyError::UnexpectedMintSigningFile),
                        (multisig, PolicyError::UnexpectedMultisigSigningFile),
                    ],
                )
            }
            1 => {
                body.certificates = Some(vec![pool_registration([0x66; 28])]);
                (
                    SigningMode::PoolRegistrationAsOperator,
                    vec![pool_cold.clone()],
                    [
                        (payment, PolicyError::TooManyPaymentFilesWithPoolReg),
                        (stake, PolicyError::UnexpectedStakeSigningFile),
                        (mint, PolicyError::UnexpectedMintSigningFile),
                        (multisig, PolicyError::UnexpectedMultisigSigningFile),
                    ],
                )
            }
            _ => (
                SigningMode::Multisig,
                vec![multisig.clone()],
                [
                    (payment, PolicyError::UnexpectedPaymentSigningFile),
                    (stake, PolicyError::UnexpectedStakeSigningFile),
                    (pool_cold, PolicyError::UnexpectedPoolColdSigningFile),
                    (mint, PolicyError::UnexpectedMintSigningFile),
                ],
            ),
        };
        let tx = Transaction::new(body, WitnessSet::default(), None, None);
        prop_assert_eq!(classify(&tx.body, &valid), Ok(expected_mode));
        prop_assert_eq!(validate_sign(&tx, &valid), Ok(()));

        let (extra, expected) = extras.into_iter().nth(pick).expect("four extras per mode");
        let mut descriptors = valid;
        descriptors.push(extra);
        prop_assert_eq!(validate_sign(&tx, &descriptors), Err(expected));
    }
}
