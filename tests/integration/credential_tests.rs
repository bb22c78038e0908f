//! Credential store behaviour as seen by the data-model layer.

use boltlock::config::{MAX_CREDENTIAL_LEN, MAX_CREDENTIALS_PER_TYPE, MAX_USERS};
use boltlock::error::StoreError;
use boltlock::lock::credentials::{
    AssetSource, CredentialRef, CredentialRule, CredentialStore, CredentialType, Status,
    UserType, UserUpdate,
};

fn cred(credential_type: CredentialType, index: u16) -> CredentialRef {
    CredentialRef { credential_type, index }
}

fn update<'a>(name: &'a str, credentials: &'a [CredentialRef]) -> UserUpdate<'a> {
    UserUpdate {
        creator: 1,
        modifier: 1,
        name,
        unique_id: 0xdead_beef,
        status: Status::Occupied,
        user_type: UserType::Unrestricted,
        credential_rule: CredentialRule::Single,
        credentials,
    }
}

#[test]
fn every_in_range_index_is_readable() {
    let store = CredentialStore::new();
    for i in 1..=MAX_USERS as u16 {
        assert_eq!(store.get_user(i).unwrap().status, Status::Available);
    }
    for ty in [
        CredentialType::Pin,
        CredentialType::Rfid,
        CredentialType::Fingerprint,
        CredentialType::FingerVein,
    ] {
        for i in 1..=MAX_CREDENTIALS_PER_TYPE as u16 {
            assert!(store.get_credential(i, ty).is_ok());
        }
        assert_eq!(store.get_credential(0, ty), Err(StoreError::IndexOutOfRange));
    }
}

#[test]
fn user_with_mixed_credentials_is_partitioned_by_type() {
    let mut store = CredentialStore::new();
    let creds = [
        cred(CredentialType::Pin, 1),
        cred(CredentialType::Rfid, 4),
        cred(CredentialType::Pin, 2),
        cred(CredentialType::Fingerprint, 7),
    ];
    store.set_user(2, &update("alice", &creds)).unwrap();

    let user = store.get_user(2).unwrap();
    assert_eq!(user.name.as_str(), "alice");
    assert_eq!(user.unique_id, 0xdead_beef);
    assert_eq!(user.credentials.as_slice(), &creds[..]);
    assert_eq!(user.provenance.creation_source, AssetSource::DataModel);

    let pins = store.user_credentials_of_type(2, CredentialType::Pin).unwrap();
    assert_eq!(pins.as_slice(), &[creds[0], creds[2]][..]);
    let rfid = store.user_credentials_of_type(2, CredentialType::Rfid).unwrap();
    assert_eq!(rfid.as_slice(), &[creds[1]][..]);
}

#[test]
fn per_type_overflow_leaves_name_written() {
    let mut store = CredentialStore::new();
    let creds = [
        cred(CredentialType::Pin, 1),
        cred(CredentialType::Pin, 2),
        cred(CredentialType::Pin, 3),
    ];
    assert_eq!(
        store.set_user(1, &update("bob", &creds)),
        Err(StoreError::TypeCapacityExceeded(CredentialType::Pin))
    );
    let user = store.get_user(1).unwrap();
    assert_eq!(user.name.as_str(), "bob");
    assert_eq!(user.status, Status::Available);

    // A complete overwrite repairs the record.
    store.set_user(1, &update("bob", &creds[..2])).unwrap();
    assert_eq!(store.get_user(1).unwrap().status, Status::Occupied);
}

#[test]
fn biometric_types_share_one_table() {
    let mut store = CredentialStore::new();
    store
        .set_credential(5, 1, 1, Status::Occupied, CredentialType::FingerVein, &[9, 9])
        .unwrap();
    let seen = store.get_credential(5, CredentialType::Fingerprint).unwrap();
    assert_eq!(seen.credential_type, CredentialType::FingerVein);
    assert_eq!(seen.secret.as_slice(), &[9, 9]);
}

#[test]
fn oversized_secret_keeps_previous_slot() {
    let mut store = CredentialStore::new();
    store
        .set_credential(1, 1, 1, Status::Occupied, CredentialType::Rfid, b"tag-01")
        .unwrap();
    let long = [0x55; MAX_CREDENTIAL_LEN + 1];
    assert_eq!(
        store.set_credential(1, 2, 2, Status::Available, CredentialType::Rfid, &long),
        Err(StoreError::SecretTooLong)
    );
    let kept = store.get_credential(1, CredentialType::Rfid).unwrap();
    assert_eq!(kept.status, Status::Occupied);
    assert_eq!(kept.secret.as_slice(), b"tag-01");
    assert_eq!(kept.provenance.last_modified_by, 1);
}

#[test]
fn rfid_secret_never_validates_as_pin() {
    let mut store = CredentialStore::new();
    store
        .set_credential(1, 1, 1, Status::Occupied, CredentialType::Rfid, b"1234")
        .unwrap();
    assert_eq!(store.validate_pin(Some(&b"1234"[..])), Err(StoreError::InvalidCredential));
}

#[test]
fn pin_in_last_slot_validates() {
    let mut store = CredentialStore::new();
    store
        .set_credential(
            MAX_CREDENTIALS_PER_TYPE as u16,
            1,
            1,
            Status::Occupied,
            CredentialType::Pin,
            b"987654",
        )
        .unwrap();
    assert_eq!(store.validate_pin(Some(&b"987654"[..])), Ok(()));
    assert_eq!(store.validate_pin(None), Ok(()));
}
