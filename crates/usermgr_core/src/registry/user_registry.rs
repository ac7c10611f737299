//! User registry contracts and implementation.
//!
//! # Responsibility
//! - Provide add/edit/remove/query APIs over an ordered user list.
//! - Load the list from, and persist it to, a single JSON blob.
//!
//! # Invariants
//! - Insertion order is preserved; `edit` keeps the user's position.
//! - Every successful mutation is followed by a full-list persist.
//! - Persist failures never roll back in-memory state.
//! - Log lines carry counts and status only, never names or emails.

use crate::model::user::{emails_match, User, UserDraft, UserId};
use crate::store::{KeyValueStore, StoreError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key of the serialized user list.
pub const USERS_STORAGE_KEY: &str = "@users_list";

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Semantic and persistence errors surfaced by registry operations.
#[derive(Debug)]
pub enum RegistryError {
    /// Another user already owns this email (case-insensitive).
    DuplicateEmail(String),
    NotFound(UserId),
    Serialize(serde_json::Error),
    Store(StoreError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail(email) => write!(f, "user with email `{email}` already exists"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::Serialize(err) => write!(f, "failed to serialize users: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateEmail(_) | Self::NotFound(_) => None,
            Self::Serialize(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Outcome of the most recent persist attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// No mutation has been persisted since construction.
    NotAttempted,
    Synced,
    /// Last write failed; the message is the adapter error text.
    Failed(String),
}

/// Result of [`UserRegistry::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(User),
    /// No user had this ID; nothing changed.
    Absent,
}

/// Ordered user collection backed by a key-value store.
pub struct UserRegistry<S: KeyValueStore> {
    store: S,
    users: Vec<User>,
    persist_status: PersistStatus,
}

impl<S: KeyValueStore> UserRegistry<S> {
    /// Creates an empty registry. Call [`Self::load`] to hydrate it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            users: Vec::new(),
            persist_status: PersistStatus::NotAttempted,
        }
    }

    /// Creates a registry and loads any previously stored users.
    pub fn open(store: S) -> Self {
        let mut registry = Self::new(store);
        registry.load();
        registry
    }

    /// Replaces in-memory state with the stored user list.
    ///
    /// Read failures, absent blobs and blobs that are not a well-formed user
    /// array all yield an empty registry. Returns the loaded user count.
    pub fn load(&mut self) -> usize {
        self.users = match self.store.read(USERS_STORAGE_KEY) {
            Ok(Some(json)) => decode_users(&json),
            Ok(None) => {
                debug!("event=users_load module=registry status=empty reason=absent");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=users_load module=registry status=recovered reason=read_failed error={err}"
                );
                Vec::new()
            }
        };

        info!(
            "event=users_load module=registry status=ok count={}",
            self.users.len()
        );
        self.users.len()
    }

    /// Returns whether `email` is owned by a user other than `exclude_id`.
    pub fn is_duplicate_email(&self, email: &str, exclude_id: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|user| emails_match(&user.email, email) && Some(user.id) != exclude_id)
    }

    /// Appends a new user with a generated ID.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateEmail` when the email is taken; the list is
    ///   unchanged.
    pub fn add(&mut self, draft: UserDraft) -> RegistryResult<UserId> {
        if self.is_duplicate_email(&draft.email, None) {
            debug!("event=user_add module=registry status=rejected reason=duplicate_email");
            return Err(RegistryError::DuplicateEmail(draft.email));
        }

        let user = User::new(draft);
        let id = user.id;
        self.users.push(user);
        info!(
            "event=user_add module=registry status=ok count={}",
            self.users.len()
        );
        self.sync();
        Ok(id)
    }

    /// Appends every draft whose email is free, then persists once.
    ///
    /// Drafts are checked in order, including against earlier drafts of the
    /// same batch; duplicates are skipped. Returns the IDs that were added.
    pub fn add_many(&mut self, drafts: impl IntoIterator<Item = UserDraft>) -> Vec<UserId> {
        let mut added = Vec::new();
        for draft in drafts {
            if self.is_duplicate_email(&draft.email, None) {
                continue;
            }
            let user = User::new(draft);
            added.push(user.id);
            self.users.push(user);
        }

        if !added.is_empty() {
            info!(
                "event=users_add_many module=registry status=ok added={} count={}",
                added.len(),
                self.users.len()
            );
            self.sync();
        }
        added
    }

    /// Replaces the editable fields of an existing user in place.
    ///
    /// The duplicate-email check runs before the ID lookup, so an unknown
    /// `id` paired with a taken email reports `DuplicateEmail`.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateEmail` when another user owns the email.
    /// - `RegistryError::NotFound` when no user has `id`.
    pub fn edit(&mut self, id: UserId, draft: UserDraft) -> RegistryResult<()> {
        if self.is_duplicate_email(&draft.email, Some(id)) {
            debug!("event=user_edit module=registry status=rejected reason=duplicate_email");
            return Err(RegistryError::DuplicateEmail(draft.email));
        }

        let Some(user) = self.users.iter_mut().find(|user| user.id == id) else {
            debug!("event=user_edit module=registry status=rejected reason=not_found");
            return Err(RegistryError::NotFound(id));
        };

        user.apply(draft);
        info!("event=user_edit module=registry status=ok");
        self.sync();
        Ok(())
    }

    /// Removes the user with `id` when present.
    ///
    /// Absent IDs are a no-op and do not touch the store.
    pub fn remove(&mut self, id: UserId) -> RemoveOutcome {
        let Some(position) = self.users.iter().position(|user| user.id == id) else {
            debug!("event=user_remove module=registry status=noop reason=not_found");
            return RemoveOutcome::Absent;
        };

        let removed = self.users.remove(position);
        info!(
            "event=user_remove module=registry status=ok count={}",
            self.users.len()
        );
        self.sync();
        RemoveOutcome::Removed(removed)
    }

    /// Removes every user and returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.users.len();
        self.users.clear();
        info!("event=users_clear module=registry status=ok removed={removed}");
        self.sync();
        removed
    }

    /// Serializes the full list and writes it to the store.
    ///
    /// Updates [`Self::persist_status`] with the outcome.
    ///
    /// # Errors
    /// - `RegistryError::Serialize` if encoding fails.
    /// - `RegistryError::Store` if the adapter rejects the write.
    pub fn persist(&mut self) -> RegistryResult<()> {
        let result = encode_users(&self.users).and_then(|json| {
            self.store
                .write(USERS_STORAGE_KEY, &json)
                .map_err(RegistryError::from)
        });

        self.persist_status = match &result {
            Ok(()) => PersistStatus::Synced,
            Err(err) => PersistStatus::Failed(err.to_string()),
        };
        result
    }

    /// Persists after a mutation; failures are logged and recorded only.
    fn sync(&mut self) {
        if let Err(err) = self.persist() {
            warn!("event=users_persist module=registry status=error error={err}");
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    /// Finds a user by email using case-insensitive comparison.
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|user| emails_match(&user.email, email))
    }

    pub fn persist_status(&self) -> &PersistStatus {
        &self.persist_status
    }
}

/// Encodes users as the persisted JSON array.
pub fn encode_users(users: &[User]) -> RegistryResult<String> {
    Ok(serde_json::to_string(users)?)
}

/// Decodes a persisted JSON array, treating malformed input as empty.
pub fn decode_users(json: &str) -> Vec<User> {
    if json.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<User>>(json) {
        Ok(users) => users,
        Err(err) => {
            warn!(
                "event=users_load module=registry status=recovered reason=decode_failed error_line={} error_column={}",
                err.line(),
                err.column()
            );
            Vec::new()
        }
    }
}
