//! Field encryption end to end: token shape, round trip, storage form,
//! masking for read-only roles.

mod common;

use aegis_crypto::{mask, FieldCipher, KeyMode};
use aegis_guard::{DataAction, DataOperation};
use aegis_test::{member_ctx, read_only_ctx, MemorySecretStore};
use regex::Regex;
use serde_json::json;

const SSN: &str = "123-45-6789";

fn token_shape() -> Regex {
    Regex::new(r"^\d+:[A-Za-z0-9+/=]+:[A-Za-z0-9+/=]+:[A-Za-z0-9+/=]+$").unwrap()
}

#[test]
fn token_matches_published_shape() {
    let cipher = FieldCipher::new([7u8; 32]);
    let token = cipher.encrypt(SSN).unwrap();
    assert!(token_shape().is_match(&token), "unexpected token: {token}");
    assert_eq!(cipher.decrypt(&token).unwrap(), SSN);
}

#[test]
fn mask_keeps_last_four() {
    assert_eq!(mask(SSN, 4), "*******6789");
}

#[tokio::test]
async fn dev_key_round_trips_across_instances() {
    let secrets = MemorySecretStore::new();
    let a = FieldCipher::initialize(&secrets, KeyMode::LocalDev).await.unwrap();
    let b = FieldCipher::initialize(&secrets, KeyMode::LocalDev).await.unwrap();
    let token = a.encrypt(SSN).unwrap();
    assert_eq!(b.decrypt(&token).unwrap(), SSN);
}

#[tokio::test]
async fn production_key_comes_from_the_secret_store() {
    let secrets = MemorySecretStore::new();
    secrets.insert("prod/field-key", "ab".repeat(32));
    let cipher = FieldCipher::initialize(
        &secrets,
        KeyMode::Production {
            secret_name: "prod/field-key".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(cipher.decrypt(&cipher.encrypt(SSN).unwrap()).unwrap(), SSN);
}

#[tokio::test]
async fn stored_rows_hold_ciphertext_reads_hold_plaintext() {
    let p = common::pipeline();

    aegis_context::scope(member_ctx("org_A"), async {
        p.client
            .execute(
                DataOperation::new("Document", DataAction::Create)
                    .with_data(json!({"id": "d1", "ssn": SSN, "title": "w2"})),
            )
            .await
            .unwrap();
    })
    .await;

    // At rest: a versioned token, not the plaintext.
    let stored = p.source.rows("Document");
    let at_rest = stored[0]["ssn"].as_str().unwrap();
    assert_ne!(at_rest, SSN);
    assert!(token_shape().is_match(at_rest));

    // Read back through the client: plaintext again.
    let rows = aegis_context::scope(member_ctx("org_A"), async {
        p.client
            .execute(DataOperation::new("Document", DataAction::FindMany))
            .await
            .unwrap()
            .rows
    })
    .await;
    assert_eq!(rows[0]["ssn"], json!(SSN));
    assert_eq!(rows[0]["title"], json!("w2"));
}

#[tokio::test]
async fn read_only_roles_see_masked_values() {
    let p = common::pipeline();

    aegis_context::scope(member_ctx("org_A"), async {
        p.client
            .execute(
                DataOperation::new("Document", DataAction::Create)
                    .with_data(json!({"id": "d1", "ssn": SSN})),
            )
            .await
            .unwrap();
    })
    .await;

    let rows = aegis_context::scope(read_only_ctx("org_A"), async {
        p.client
            .execute(DataOperation::new("Document", DataAction::FindMany))
            .await
            .unwrap()
            .rows
    })
    .await;
    assert_eq!(rows[0]["ssn"], json!("*******6789"));
}

#[tokio::test]
async fn upsert_encrypts_both_branches() {
    let p = common::pipeline();

    let op = || {
        DataOperation::new("Document", DataAction::Upsert)
            .with_filter(json!({"id": "d1"}))
            .with_create(json!({"id": "d1", "ssn": SSN}))
            .with_update(json!({"ssn": "987-65-4321"}))
    };

    aegis_context::scope(member_ctx("org_A"), async {
        p.client.execute(op()).await.unwrap();
        p.client.execute(op()).await.unwrap();
    })
    .await;

    let stored = p.source.rows("Document");
    assert_eq!(stored.len(), 1);
    let at_rest = stored[0]["ssn"].as_str().unwrap();
    assert!(token_shape().is_match(at_rest));

    let rows = aegis_context::scope(member_ctx("org_A"), async {
        p.client
            .execute(DataOperation::new("Document", DataAction::FindMany))
            .await
            .unwrap()
            .rows
    })
    .await;
    assert_eq!(rows[0]["ssn"], json!("987-65-4321"));
}
