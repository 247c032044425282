// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::Address;
use fabstir_escrow::codec::{RequestRecord, REQUEST_RECORD_SIZE};
use fabstir_escrow::crypto::{
    generate_keypair, keypair_from_seed, sign_request, sign_requests, verify_request,
};

fn records() -> Vec<RequestRecord> {
    (1..=4)
        .map(|n| {
            RequestRecord::new(
                n,
                u128::from(n) * 1_000,
                Address::repeat_byte(0x11),
                Address::repeat_byte(0x22),
            )
        })
        .collect()
}

#[test]
fn test_record_layout_is_bit_exact() {
    let record = RequestRecord::new(
        0x0102030405060708,
        0x1112131415161718191a1b1c1d1e1f20,
        Address::repeat_byte(0xaa),
        Address::repeat_byte(0xbb),
    );
    let bytes = record.to_bytes();
    assert_eq!(bytes.len(), REQUEST_RECORD_SIZE);
    assert_eq!(&bytes[..8], &0x0102030405060708u64.to_le_bytes());
    assert_eq!(bytes[8], 0x20);
    assert_eq!(bytes[23], 0x11);
    assert_eq!(&bytes[24..44], &[0xaa; 20]);
    assert_eq!(&bytes[44..64], &[0xbb; 20]);
    assert_eq!(RequestRecord::from_bytes(&bytes).unwrap(), record);
}

#[test]
fn test_batch_signing_verifies_each_record() {
    let keys = generate_keypair();
    let records = records();
    let signatures = sign_requests(&records, &keys.private_key).unwrap();
    assert_eq!(signatures.len(), records.len());

    for (record, signature) in records.iter().zip(&signatures) {
        assert!(verify_request(record, signature, &keys.public_key).unwrap());
        assert_eq!(&sign_request(record, &keys.private_key).unwrap(), signature);
    }

    // A signature does not carry over to a different record
    assert!(!verify_request(&records[1], &signatures[0], &keys.public_key).unwrap());
}

#[test]
fn test_signature_bound_to_key() {
    let alice = keypair_from_seed(&[1u8; 32]);
    let bob = keypair_from_seed(&[2u8; 32]);
    let record = records()[0];
    let signature = sign_request(&record, &alice.private_key).unwrap();

    assert!(!verify_request(&record, &signature, &bob.public_key).unwrap());
    assert!(verify_request(&record, &signature[..63], &alice.public_key).is_err());
}

#[test]
fn test_seeded_keys_are_deterministic() {
    let a = keypair_from_seed(&[5u8; 32]);
    let b = keypair_from_seed(&[5u8; 32]);
    assert_eq!(a.public_key, b.public_key);
    assert!(a.public_key.0.iter().all(|w| w.bits() <= 128));
}
