//! Fuzz target: `CredentialStore`
//!
//! Interprets the input as a stream of store operations with arbitrary
//! indices, names and secrets.  The store must never panic, must reject
//! every out-of-range index, and a PIN that was accepted by
//! `set_credential` must validate until its slot is overwritten.
//!
//! cargo fuzz run fuzz_credential_store

#![no_main]

use boltlock::config::{
    MAX_CREDENTIAL_LEN, MAX_CREDENTIALS_PER_TYPE, MAX_CREDENTIALS_PER_USER, MAX_USER_NAME_LEN,
};
use boltlock::error::StoreError;
use boltlock::lock::credentials::{
    CredentialRef, CredentialRule, CredentialStore, CredentialType, Status, UserType, UserUpdate,
};
use libfuzzer_sys::fuzz_target;

fn credential_type(b: u8) -> CredentialType {
    match b % 4 {
        0 => CredentialType::Pin,
        1 => CredentialType::Rfid,
        2 => CredentialType::Fingerprint,
        _ => CredentialType::FingerVein,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut store = CredentialStore::new();
    let mut rest = data;

    while let [op, index, len, tail @ ..] = rest {
        let index = u16::from(*index);
        let len = usize::from(*len).min(tail.len());
        let (payload, tail) = tail.split_at(len);
        rest = tail;

        match op % 4 {
            0 => {
                let ty = credential_type(*op >> 2);
                let status = if op & 0x80 != 0 { Status::Occupied } else { Status::Available };
                let result = store.set_credential(index, 1, 1, status, ty, payload);
                if payload.len() > MAX_CREDENTIAL_LEN {
                    assert!(result.is_err());
                }
                if result.is_ok() && ty == CredentialType::Pin && status == Status::Occupied {
                    assert_eq!(store.validate_pin(Some(payload)), Ok(()));
                }
            }
            1 => {
                let ty = credential_type(*op >> 2);
                let result = store.get_credential(index, ty);
                assert_eq!(result.is_ok(), (1..=MAX_CREDENTIALS_PER_TYPE as u16).contains(&index));
            }
            2 => {
                let name = core::str::from_utf8(payload).unwrap_or("");
                let refs: Vec<CredentialRef> = payload
                    .iter()
                    .map(|b| CredentialRef {
                        credential_type: credential_type(*b),
                        index: u16::from(*b >> 2),
                    })
                    .collect();
                let update = UserUpdate {
                    creator: 1,
                    modifier: 2,
                    name,
                    unique_id: u32::from(index),
                    status: Status::Occupied,
                    user_type: UserType::Unrestricted,
                    credential_rule: CredentialRule::Single,
                    credentials: &refs,
                };
                if store.set_user(index, &update) == Err(StoreError::IndexOutOfRange) {
                    assert!(store.get_user(index).is_err());
                }
                if let Ok(user) = store.get_user(index) {
                    assert!(user.name.len() <= MAX_USER_NAME_LEN);
                    assert!(user.credentials.len() <= MAX_CREDENTIALS_PER_USER);
                }
            }
            _ => {
                let _ = store.validate_pin(Some(payload));
            }
        }
    }
});
