//! Lock users and credentials.
//!
//! Fixed-capacity tables, no heap:
//!
//! ```text
//!  users       [User; MAX_USERS]                     index 1..=MAX_USERS
//!  pin         [Credential; MAX_CREDENTIALS_PER_TYPE] index 1..=MAX_CREDENTIALS_PER_TYPE
//!  rfid        [Credential; MAX_CREDENTIALS_PER_TYPE]
//!  biometric   [Credential; MAX_CREDENTIALS_PER_TYPE] (fingerprint + finger vein)
//! ```
//!
//! External indices are 1-based and index 0 is rejected by every accessor.
//! Callers only ever receive copies of stored records.
//!
//! `set_user` is not atomic.  The name is written first and the credential
//! references are partitioned by type one at a time; if a per-type limit is
//! hit the call fails with the record half-written.  A failed `set_user`
//! must be followed by a complete overwrite.

use heapless::{String, Vec};
use log::{debug, info};

use crate::config::{
    MAX_CREDENTIAL_LEN, MAX_CREDENTIALS_PER_TYPE, MAX_CREDENTIALS_PER_USER,
    MAX_CREDENTIALS_PER_USER_PER_TYPE, MAX_USER_NAME_LEN, MAX_USERS,
};
use crate::error::StoreError;

/// Fabric that created or last modified a record.  0 means none.
pub type FabricIndex = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialType {
    Pin,
    Rfid,
    Fingerprint,
    FingerVein,
}

impl CredentialType {
    /// Backing table; both biometric types share one.
    const fn table(self) -> usize {
        match self {
            Self::Pin => 0,
            Self::Rfid => 1,
            Self::Fingerprint | Self::FingerVein => 2,
        }
    }
}

const TABLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Available,
    Occupied,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
        }
    }
}

/// Where a record change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetSource {
    #[default]
    Unspecified,
    /// Written through the data-model interaction layer.
    DataModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserType {
    #[default]
    Unrestricted,
    YearDaySchedule,
    WeekDaySchedule,
    Programming,
    NonAccess,
    Forced,
    Disposable,
    Expiring,
    ScheduleRestricted,
    RemoteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialRule {
    #[default]
    Single,
    Dual,
    Tri,
}

/// Reference from a user to one credential slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialRef {
    pub credential_type: CredentialType,
    pub index: u16,
}

/// Creator / modifier bookkeeping shared by users and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Provenance {
    pub creation_source: AssetSource,
    pub created_by: FabricIndex,
    pub modification_source: AssetSource,
    pub last_modified_by: FabricIndex,
}

impl Provenance {
    fn data_model(creator: FabricIndex, modifier: FabricIndex) -> Self {
        Self {
            creation_source: AssetSource::DataModel,
            created_by: creator,
            modification_source: AssetSource::DataModel,
            last_modified_by: modifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub name: String<MAX_USER_NAME_LEN>,
    pub unique_id: u32,
    pub status: Status,
    pub user_type: UserType,
    pub credential_rule: CredentialRule,
    pub provenance: Provenance,
    pub credentials: Vec<CredentialRef, MAX_CREDENTIALS_PER_USER>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub status: Status,
    pub credential_type: CredentialType,
    pub secret: Vec<u8, MAX_CREDENTIAL_LEN>,
    pub provenance: Provenance,
}

impl Credential {
    fn empty(credential_type: CredentialType) -> Self {
        Self {
            status: Status::Available,
            credential_type,
            secret: Vec::new(),
            provenance: Provenance::default(),
        }
    }
}

/// Everything `set_user` writes besides the name.
#[derive(Debug, Clone, Copy)]
pub struct UserUpdate<'a> {
    pub creator: FabricIndex,
    pub modifier: FabricIndex,
    pub name: &'a str,
    pub unique_id: u32,
    pub status: Status,
    pub user_type: UserType,
    pub credential_rule: CredentialRule,
    pub credentials: &'a [CredentialRef],
}

#[derive(Debug, Clone, Default)]
struct UserSlot {
    user: User,
    /// Per-table partition of `user.credentials`.
    by_type: [Vec<CredentialRef, MAX_CREDENTIALS_PER_USER_PER_TYPE>; TABLES],
}

pub struct CredentialStore {
    users: [UserSlot; MAX_USERS],
    tables: [[Credential; MAX_CREDENTIALS_PER_TYPE]; TABLES],
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Every user and credential slot starts out `Available`.
    pub fn new() -> Self {
        let seed = [
            CredentialType::Pin,
            CredentialType::Rfid,
            CredentialType::Fingerprint,
        ];
        Self {
            users: core::array::from_fn(|_| UserSlot::default()),
            tables: core::array::from_fn(|t| core::array::from_fn(|_| Credential::empty(seed[t]))),
        }
    }

    // ── Users ─────────────────────────────────────────────────

    pub fn get_user(&self, index: u16) -> Result<User, StoreError> {
        let slot = &self.users[user_slot(index)?];
        info!("Getting lock user {}: {}", index, slot.user.status.label());
        Ok(slot.user.clone())
    }

    /// Write a user record.  See the module docs for the failure contract.
    pub fn set_user(&mut self, index: u16, update: &UserUpdate<'_>) -> Result<(), StoreError> {
        let slot = &mut self.users[user_slot(index)?];

        if update.name.len() > MAX_USER_NAME_LEN {
            return Err(StoreError::NameTooLong);
        }
        if update.credentials.len() > MAX_CREDENTIALS_PER_USER {
            return Err(StoreError::TooManyCredentials);
        }

        slot.user.name.clear();
        slot.user
            .name
            .push_str(update.name)
            .map_err(|()| StoreError::NameTooLong)?;

        let mut counts = [0usize; TABLES];
        for cred in update.credentials {
            let table = cred.credential_type.table();
            let pos = counts[table];
            if pos >= MAX_CREDENTIALS_PER_USER_PER_TYPE {
                return Err(StoreError::TypeCapacityExceeded(cred.credential_type));
            }
            let part = &mut slot.by_type[table];
            if pos < part.len() {
                part[pos] = *cred;
            } else {
                part.push(*cred)
                    .map_err(|_| StoreError::TypeCapacityExceeded(cred.credential_type))?;
            }
            counts[table] += 1;
        }
        for (part, &n) in slot.by_type.iter_mut().zip(counts.iter()) {
            part.truncate(n);
        }

        let user = &mut slot.user;
        user.credentials.clear();
        for cred in update.credentials {
            user.credentials
                .push(*cred)
                .map_err(|_| StoreError::TooManyCredentials)?;
        }
        user.unique_id = update.unique_id;
        user.status = update.status;
        user.user_type = update.user_type;
        user.credential_rule = update.credential_rule;
        user.provenance = Provenance::data_model(update.creator, update.modifier);

        info!("Setting lock user {}: {}", index, update.status.label());
        Ok(())
    }

    /// Credentials of one type referenced by a user, in the order given to
    /// the last `set_user`.
    pub fn user_credentials_of_type(
        &self,
        index: u16,
        credential_type: CredentialType,
    ) -> Result<Vec<CredentialRef, MAX_CREDENTIALS_PER_USER_PER_TYPE>, StoreError> {
        let slot = &self.users[user_slot(index)?];
        Ok(slot.by_type[credential_type.table()].clone())
    }

    // ── Credentials ───────────────────────────────────────────

    pub fn get_credential(
        &self,
        index: u16,
        credential_type: CredentialType,
    ) -> Result<Credential, StoreError> {
        let stored = &self.tables[credential_type.table()][credential_slot(index)?];
        info!("Getting lock credential {}: {}", index, stored.status.label());
        Ok(stored.clone())
    }

    /// Validates everything before touching the slot, so a rejected call
    /// leaves it unchanged.  The secret is copied before the metadata.
    pub fn set_credential(
        &mut self,
        index: u16,
        creator: FabricIndex,
        modifier: FabricIndex,
        status: Status,
        credential_type: CredentialType,
        secret: &[u8],
    ) -> Result<(), StoreError> {
        let pos = credential_slot(index)?;
        if secret.len() > MAX_CREDENTIAL_LEN {
            return Err(StoreError::SecretTooLong);
        }
        let stored = &mut self.tables[credential_type.table()][pos];

        stored.secret.clear();
        stored
            .secret
            .extend_from_slice(secret)
            .map_err(|()| StoreError::SecretTooLong)?;

        stored.status = status;
        stored.credential_type = credential_type;
        stored.provenance = Provenance::data_model(creator, modifier);

        info!("Setting lock credential {}: {}", index, status.label());
        Ok(())
    }

    /// No PIN means the caller already decided a PIN is optional.
    pub fn validate_pin(&self, pin: Option<&[u8]>) -> Result<(), StoreError> {
        let Some(pin) = pin else {
            return Ok(());
        };

        let matched = self.tables[CredentialType::Pin.table()]
            .iter()
            .filter(|c| c.status == Status::Occupied)
            .any(|c| c.secret.as_slice() == pin);

        if matched {
            debug!("Valid lock PIN code provided");
            Ok(())
        } else {
            debug!("Invalid lock PIN code provided");
            Err(StoreError::InvalidCredential)
        }
    }
}

fn user_slot(index: u16) -> Result<usize, StoreError> {
    checked_slot(index, MAX_USERS)
}

fn credential_slot(index: u16) -> Result<usize, StoreError> {
    checked_slot(index, MAX_CREDENTIALS_PER_TYPE)
}

fn checked_slot(index: u16, capacity: usize) -> Result<usize, StoreError> {
    let index = index as usize;
    if index == 0 || index > capacity {
        return Err(StoreError::IndexOutOfRange);
    }
    Ok(index - 1)
}
