//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose user-screen use-cases to Dart via FRB.
//! - Own the single process-wide `UserService` (composition root).
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - User APIs called before `init_app` fail fast with a wiring error.
//! - Response messages never echo user names or emails into logs.

use log::error;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use usermgr_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, PageWindow, PersistStatus, RegistryError, RemoveOutcome, SqliteKvStore, User,
    UserDraft, UserId, UserService, UserServiceError, DEFAULT_PAGE_SIZE,
};
use uuid::Uuid;

const NOT_PROVISIONED: &str = "user registry accessed before init_app";
const BATCH_MAX: u32 = 1_000;

static APP: OnceLock<AppState> = OnceLock::new();

struct AppState {
    db_path: PathBuf,
    service: Mutex<UserService<SqliteKvStore>>,
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the user store and provisions the process-wide registry.
///
/// `db_path` may be empty, in which case `USERMGR_DB_PATH` or the temp-dir
/// default is used.
///
/// # FFI contract
/// - Idempotent for the same path; a different path is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app(db_path: String) -> String {
    let path = resolve_db_path(&db_path);
    match provision(&APP, &path) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Paginated, filtered user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListResponse {
    pub ok: bool,
    pub items: Vec<UserItem>,
    pub total_matches: u32,
    pub has_more: bool,
    pub message: String,
}

/// Generic action envelope for user mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActionResponse {
    /// Whether the mutation was applied.
    pub ok: bool,
    /// Affected user ID, when there is exactly one.
    pub user_id: Option<String>,
    /// Stable error code (`missing_fields|invalid_email|duplicate_email|not_found|invalid_id|not_provisioned|internal`).
    pub error_code: Option<String>,
    /// Whether the latest state reached durable storage.
    pub persisted: bool,
    /// User-visible message.
    pub message: String,
}

impl UserActionResponse {
    fn success(message: impl Into<String>, user_id: Option<UserId>, persisted: bool) -> Self {
        Self {
            ok: true,
            user_id: user_id.map(|id| id.to_string()),
            error_code: None,
            persisted,
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            user_id: None,
            error_code: Some(code.to_string()),
            persisted: false,
            message: message.into(),
        }
    }
}

/// Lists users whose full name contains `query`, showing `visible` rows.
///
/// # FFI contract
/// - `visible = None` or `Some(0)` shows the first page.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn user_list(query: String, visible: Option<u32>) -> UserListResponse {
    list_in(&APP, &query, visible)
}

/// Validates and saves the add/edit form.
///
/// # FFI contract
/// - `editing_id = None` adds a user; `Some(id)` edits that user.
/// - Validation failures return `ok=false` with the inline message.
#[flutter_rust_bridge::frb(sync)]
pub fn user_submit(
    editing_id: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
) -> UserActionResponse {
    let draft = UserDraft::new(first_name, last_name, email);
    submit_in(&APP, editing_id.as_deref(), &draft)
}

/// Deletes one user by ID; unknown IDs succeed as a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn user_delete(id: String) -> UserActionResponse {
    delete_in(&APP, &id)
}

/// Deletes every user.
#[flutter_rust_bridge::frb(sync)]
pub fn user_delete_all() -> UserActionResponse {
    delete_all_in(&APP)
}

/// Adds up to `count` users with random emails (capped per call).
#[flutter_rust_bridge::frb(sync)]
pub fn user_add_random(count: u32) -> UserActionResponse {
    add_random_in(&APP, count)
}

/// Seeds `First{i} Last{i} test{i}@example.com` sample users on first run.
///
/// # FFI contract
/// - Adds nothing when the registry already holds users.
/// - `count` is capped per call, like `user_add_random`.
#[flutter_rust_bridge::frb(sync)]
pub fn user_seed_samples(count: u32) -> UserActionResponse {
    seed_samples_in(&APP, count)
}

/// Returns whether `email` collides with a user other than `exclude_id`.
///
/// Returns `None` when the registry is not provisioned or the ID is invalid.
#[flutter_rust_bridge::frb(sync)]
pub fn user_check_duplicate(email: String, exclude_id: Option<String>) -> Option<bool> {
    check_duplicate_in(&APP, &email, exclude_id.as_deref())
}

fn list_in(slot: &OnceLock<AppState>, query: &str, visible: Option<u32>) -> UserListResponse {
    let window = match visible {
        Some(count) if count > 0 => PageWindow::with_visible(count as usize, DEFAULT_PAGE_SIZE),
        _ => PageWindow::default(),
    };

    match with_service(slot, |service| service.search(query, &window)) {
        Ok(page) => UserListResponse {
            ok: true,
            message: if page.items.is_empty() {
                "No users found".to_string()
            } else {
                format!("Showing {} of {} user(s).", page.items.len(), page.total_matches)
            },
            total_matches: u32::try_from(page.total_matches).unwrap_or(u32::MAX),
            has_more: page.has_more,
            items: page.items.into_iter().map(to_user_item).collect(),
        },
        Err(message) => UserListResponse {
            ok: false,
            items: Vec::new(),
            total_matches: 0,
            has_more: false,
            message,
        },
    }
}

fn submit_in(
    slot: &OnceLock<AppState>,
    editing_id: Option<&str>,
    draft: &UserDraft,
) -> UserActionResponse {
    let editing = match editing_id.map(parse_user_id).transpose() {
        Ok(editing) => editing,
        Err(response) => return response,
    };

    let result = with_service(slot, |service| {
        service
            .submit(editing, draft)
            .map(|id| (id, is_persisted(service)))
    });
    match result {
        Ok(Ok((id, persisted))) => {
            let message = if editing.is_some() {
                "User updated successfully!"
            } else {
                "User added successfully!"
            };
            UserActionResponse::success(message, Some(id), persisted)
        }
        Ok(Err(err)) => service_failure(&err),
        Err(message) => UserActionResponse::failure("not_provisioned", message),
    }
}

fn delete_in(slot: &OnceLock<AppState>, raw_id: &str) -> UserActionResponse {
    let id = match parse_user_id(raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match with_service(slot, |service| {
        (service.delete_user(id), is_persisted(service))
    }) {
        Ok((RemoveOutcome::Removed(_), persisted)) => {
            UserActionResponse::success("User deleted.", Some(id), persisted)
        }
        Ok((RemoveOutcome::Absent, persisted)) => {
            UserActionResponse::success("User already removed.", None, persisted)
        }
        Err(message) => UserActionResponse::failure("not_provisioned", message),
    }
}

fn delete_all_in(slot: &OnceLock<AppState>) -> UserActionResponse {
    match with_service(slot, |service| (service.delete_all(), is_persisted(service))) {
        Ok((removed, persisted)) => {
            UserActionResponse::success(format!("Deleted {removed} user(s)."), None, persisted)
        }
        Err(message) => UserActionResponse::failure("not_provisioned", message),
    }
}

fn add_random_in(slot: &OnceLock<AppState>, count: u32) -> UserActionResponse {
    let count = count.min(BATCH_MAX) as usize;
    match with_service(slot, |service| {
        (service.add_random_users(count).len(), is_persisted(service))
    }) {
        Ok((added, persisted)) => {
            UserActionResponse::success(format!("Added {added} user(s)."), None, persisted)
        }
        Err(message) => UserActionResponse::failure("not_provisioned", message),
    }
}

fn seed_samples_in(slot: &OnceLock<AppState>, count: u32) -> UserActionResponse {
    let count = count.min(BATCH_MAX) as usize;
    match with_service(slot, |service| {
        (service.seed_sample_users(count), is_persisted(service))
    }) {
        Ok((added, persisted)) => {
            UserActionResponse::success(format!("Seeded {added} user(s)."), None, persisted)
        }
        Err(message) => UserActionResponse::failure("not_provisioned", message),
    }
}

fn check_duplicate_in(
    slot: &OnceLock<AppState>,
    email: &str,
    exclude_id: Option<&str>,
) -> Option<bool> {
    let exclude = exclude_id
        .map(|raw| Uuid::parse_str(raw.trim()))
        .transpose()
        .ok()?;
    with_service(slot, |service| service.check_duplicate(email, exclude)).ok()
}

fn resolve_db_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        AppConfig::from_env().db_path
    } else {
        PathBuf::from(trimmed)
    }
}

fn provision(slot: &OnceLock<AppState>, path: &Path) -> Result<(), String> {
    if slot.get().is_none() {
        let store = SqliteKvStore::open(path).map_err(|err| format!("init_app failed: {err}"))?;
        // A concurrent init may win the race; the loser's store is dropped.
        let _ = slot.set(AppState {
            db_path: path.to_path_buf(),
            service: Mutex::new(UserService::open(store)),
        });
    }

    match slot.get() {
        Some(state) if state.db_path == path => Ok(()),
        Some(state) => Err(format!(
            "init_app already provisioned at `{}`; refusing to switch to `{}`",
            state.db_path.display(),
            path.display()
        )),
        None => Err("init_app failed: registry was not provisioned".to_string()),
    }
}

fn with_service<T>(
    slot: &OnceLock<AppState>,
    f: impl FnOnce(&mut UserService<SqliteKvStore>) -> T,
) -> Result<T, String> {
    let Some(state) = slot.get() else {
        error!("event=ffi_call module=ffi status=error error_code=not_provisioned");
        return Err(NOT_PROVISIONED.to_string());
    };
    // Poisoned locks are tolerated; no registry mutation panics halfway.
    let mut service = state
        .service
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(f(&mut service))
}

fn is_persisted(service: &UserService<SqliteKvStore>) -> bool {
    !matches!(service.registry().persist_status(), PersistStatus::Failed(_))
}

fn parse_user_id(raw: &str) -> Result<UserId, UserActionResponse> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| UserActionResponse::failure("invalid_id", format!("invalid user id `{raw}`")))
}

fn service_failure(err: &UserServiceError) -> UserActionResponse {
    match err {
        UserServiceError::Form(form) => UserActionResponse::failure(form.code(), form.to_string()),
        UserServiceError::Registry(RegistryError::NotFound(_)) => {
            UserActionResponse::failure("not_found", "User not found")
        }
        UserServiceError::Registry(RegistryError::DuplicateEmail(_)) => {
            UserActionResponse::failure("duplicate_email", "User with this email already exists")
        }
        UserServiceError::Registry(other) => {
            UserActionResponse::failure("internal", format!("user_submit failed: {other}"))
        }
    }
}

fn to_user_item(user: User) -> UserItem {
    UserItem {
        id: user.id.to_string(),
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_random_in, check_duplicate_in, core_version, delete_all_in, delete_in,
        init_app_logging, list_in, ping, provision, seed_samples_in, submit_in, user_submit,
        with_service, AppState, NOT_PROVISIONED,
    };
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use usermgr_core::db::open_db;
    use usermgr_core::UserDraft;

    fn provisioned_slot(dir: &tempfile::TempDir) -> OnceLock<AppState> {
        let slot = OnceLock::new();
        provision(&slot, &db_path(dir)).expect("provision should succeed");
        slot
    }

    fn db_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("users.db")
    }

    fn add(slot: &OnceLock<AppState>, first: &str, last: &str, email: &str) -> String {
        let response = submit_in(slot, None, &UserDraft::new(first, last, email));
        assert!(response.ok, "{}", response.message);
        response.user_id.expect("add should return user_id")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_app_logging_rejects_bad_input() {
        assert!(!init_app_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_app_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn user_calls_before_provisioning_fail_fast() {
        let slot = OnceLock::new();
        let err = with_service(&slot, |service| service.registry().len()).unwrap_err();
        assert_eq!(err, NOT_PROVISIONED);

        let list = list_in(&slot, "", None);
        assert!(!list.ok);
        assert_eq!(list.message, NOT_PROVISIONED);

        for response in [
            submit_in(&slot, None, &UserDraft::new("Ann", "Lee", "ann@x.com")),
            delete_all_in(&slot),
            add_random_in(&slot, 3),
            seed_samples_in(&slot, 3),
        ] {
            assert!(!response.ok);
            assert_eq!(response.error_code.as_deref(), Some("not_provisioned"));
        }
        assert_eq!(check_duplicate_in(&slot, "ann@x.com", None), None);
    }

    #[test]
    fn provision_is_idempotent_and_rejects_other_paths() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);

        provision(&slot, &db_path(&dir)).expect("same path should be accepted");
        let err = provision(&slot, &dir.path().join("other.db")).unwrap_err();
        assert!(err.contains("refusing to switch"));
    }

    #[test]
    fn submit_add_then_edit_reports_ids_and_messages() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);

        let added = submit_in(&slot, None, &UserDraft::new("Ann", "Lee", "Ann@X.com"));
        assert!(added.ok);
        assert!(added.persisted);
        assert_eq!(added.message, "User added successfully!");
        let id = added.user_id.unwrap();

        let edited = submit_in(&slot, Some(&id), &UserDraft::new("Anna", "Lee", "ann@x.com"));
        assert!(edited.ok, "{}", edited.message);
        assert_eq!(edited.user_id.as_deref(), Some(id.as_str()));
        assert_eq!(edited.message, "User updated successfully!");

        let list = list_in(&slot, "anna", None);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].id, id);
        assert_eq!(list.items[0].email, "ann@x.com");
    }

    #[test]
    fn submit_maps_failures_to_error_codes() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);
        add(&slot, "Ann", "Lee", "ann@x.com");

        let duplicate = submit_in(&slot, None, &UserDraft::new("Bob", "Roe", "ANN@x.com"));
        assert!(!duplicate.ok);
        assert_eq!(duplicate.error_code.as_deref(), Some("duplicate_email"));
        assert_eq!(duplicate.message, "User with this email already exists");

        let missing = submit_in(&slot, None, &UserDraft::new("Bob", "", "bob@x.com"));
        assert_eq!(missing.error_code.as_deref(), Some("missing_fields"));
        assert_eq!(missing.message, "Please fill all fields");

        let invalid = submit_in(&slot, None, &UserDraft::new("Bob", "Roe", "bob-at-x"));
        assert_eq!(invalid.error_code.as_deref(), Some("invalid_email"));

        let unknown = uuid::Uuid::new_v4().to_string();
        let not_found = submit_in(&slot, Some(&unknown), &UserDraft::new("Bob", "Roe", "bob@x.com"));
        assert!(!not_found.ok);
        assert_eq!(not_found.error_code.as_deref(), Some("not_found"));
        assert_eq!(not_found.user_id, None);

        assert_eq!(list_in(&slot, "", None).total_matches, 1);
    }

    #[test]
    fn submit_rejects_malformed_editing_id_before_touching_registry() {
        let response = user_submit(
            Some("not-a-uuid".to_string()),
            "Ann".to_string(),
            "Lee".to_string(),
            "ann@x.com".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_id"));
    }

    #[test]
    fn list_pages_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);
        assert!(seed_samples_in(&slot, 25).ok);

        let first_page = list_in(&slot, "", None);
        assert!(first_page.ok);
        assert_eq!(first_page.items.len(), 10);
        assert_eq!(first_page.total_matches, 25);
        assert!(first_page.has_more);
        assert_eq!(first_page.message, "Showing 10 of 25 user(s).");

        let zero = list_in(&slot, "", Some(0));
        assert_eq!(zero.items.len(), 10);

        let widened = list_in(&slot, "", Some(30));
        assert_eq!(widened.items.len(), 25);
        assert!(!widened.has_more);

        let filtered = list_in(&slot, "LAST2", Some(20));
        assert_eq!(filtered.total_matches, 7);
        assert_eq!(filtered.items[0].first_name, "First2");

        let empty = list_in(&slot, "nobody", None);
        assert!(empty.ok);
        assert!(empty.items.is_empty());
        assert_eq!(empty.message, "No users found");
    }

    #[test]
    fn delete_existing_absent_and_malformed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);
        let id = add(&slot, "Ann", "Lee", "ann@x.com");

        let deleted = delete_in(&slot, &id);
        assert!(deleted.ok);
        assert_eq!(deleted.user_id.as_deref(), Some(id.as_str()));
        assert_eq!(deleted.message, "User deleted.");

        let again = delete_in(&slot, &id);
        assert!(again.ok);
        assert_eq!(again.user_id, None);
        assert_eq!(again.message, "User already removed.");

        let malformed = delete_in(&slot, "nope");
        assert!(!malformed.ok);
        assert_eq!(malformed.error_code.as_deref(), Some("invalid_id"));
        assert_eq!(list_in(&slot, "", None).total_matches, 0);
    }

    #[test]
    fn delete_all_and_random_batches() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);

        let random = add_random_in(&slot, 12);
        assert!(random.ok);
        assert!(random.persisted);
        assert_eq!(random.message, "Added 12 user(s).");
        assert_eq!(list_in(&slot, "", None).total_matches, 12);

        let capped = add_random_in(&slot, 5_000);
        assert_eq!(capped.message, "Added 1000 user(s).");

        let cleared = delete_all_in(&slot);
        assert!(cleared.ok);
        assert_eq!(cleared.message, "Deleted 1012 user(s).");
        assert_eq!(list_in(&slot, "", None).total_matches, 0);
    }

    #[test]
    fn seed_samples_only_on_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);

        let seeded = seed_samples_in(&slot, 100);
        assert!(seeded.ok);
        assert_eq!(seeded.message, "Seeded 100 user(s).");
        assert_eq!(check_duplicate_in(&slot, "TEST1@example.com", None), Some(true));

        let second = seed_samples_in(&slot, 100);
        assert_eq!(second.message, "Seeded 0 user(s).");
        assert_eq!(list_in(&slot, "", None).total_matches, 100);
    }

    #[test]
    fn check_duplicate_honors_exclude_id() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);
        let id = add(&slot, "Ann", "Lee", "ann@x.com");

        assert_eq!(check_duplicate_in(&slot, "ANN@x.com", None), Some(true));
        assert_eq!(check_duplicate_in(&slot, "ann@x.com", Some(&id)), Some(false));
        assert_eq!(check_duplicate_in(&slot, "bob@x.com", None), Some(false));
        assert_eq!(check_duplicate_in(&slot, "ann@x.com", Some("bad")), None);
    }

    #[test]
    fn persisted_flag_reports_failed_store_writes() {
        let dir = tempfile::tempdir().unwrap();
        let slot = provisioned_slot(&dir);
        add(&slot, "Ann", "Lee", "ann@x.com");

        open_db(db_path(&dir))
            .unwrap()
            .execute_batch("DROP TABLE kv_store;")
            .unwrap();

        let response = submit_in(&slot, None, &UserDraft::new("Bob", "Roe", "bob@x.com"));
        assert!(response.ok);
        assert!(!response.persisted);
        assert_eq!(list_in(&slot, "", None).total_matches, 2);
    }

    #[test]
    fn provisioned_service_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let slot = provisioned_slot(&dir);
            add(&slot, "Ann", "Lee", "ann@x.com")
        };

        let reopened = provisioned_slot(&dir);
        let list = list_in(&reopened, "", None);
        assert_eq!(list.total_matches, 1);
        assert_eq!(list.items[0].id, id);
    }
}
