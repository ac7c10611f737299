//! User management use-case service.
//!
//! # Responsibility
//! - Provide submit/search/delete entry points used by the user screens.
//! - Run form validation before any registry mutation.
//! - Offer bulk helpers for demo data (sample seed, random users).
//!
//! # Invariants
//! - Service APIs never bypass registry invariants.
//! - Submitted drafts are normalized (trimmed, email lower-cased) first.

use crate::form::validation::{validate_user_form, FormError};
use crate::model::user::{User, UserDraft, UserId};
use crate::registry::user_registry::{RegistryError, RemoveOutcome, UserRegistry};
use crate::search::filter::filter_users;
use crate::search::page::PageWindow;
use crate::store::KeyValueStore;
use log::info;
use rand::Rng;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const RANDOM_EMAIL_SPACE: u32 = 100_000;
const RANDOM_EMAIL_MAX_ATTEMPTS: usize = 64;

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Input rejected before reaching the registry.
    Form(FormError),
    Registry(RegistryError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Form(err) => Some(err),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<FormError> for UserServiceError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}

impl From<RegistryError> for UserServiceError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// One page of name-search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    /// Visible prefix of the matches, in registry order.
    pub items: Vec<User>,
    pub total_matches: usize,
    pub has_more: bool,
}

/// Use-case service wrapping one user registry.
pub struct UserService<S: KeyValueStore> {
    registry: UserRegistry<S>,
}

impl<S: KeyValueStore> UserService<S> {
    /// Creates a service around an already loaded registry.
    pub fn new(registry: UserRegistry<S>) -> Self {
        Self { registry }
    }

    /// Opens a registry over `store`, loading any persisted users.
    pub fn open(store: S) -> Self {
        Self::new(UserRegistry::open(store))
    }

    pub fn registry(&self) -> &UserRegistry<S> {
        &self.registry
    }

    /// Validates and applies an add (`editing = None`) or edit form.
    ///
    /// # Contract
    /// - The duplicate check ignores the user being edited.
    /// - Returns the created or edited user ID.
    pub fn submit(
        &mut self,
        editing: Option<UserId>,
        draft: &UserDraft,
    ) -> UserServiceResult<UserId> {
        let draft = draft.normalized();
        validate_user_form(&draft, |email| self.registry.is_duplicate_email(email, editing))?;

        match editing {
            Some(id) => {
                self.registry.edit(id, draft)?;
                Ok(id)
            }
            None => Ok(self.registry.add(draft)?),
        }
    }

    /// Returns whether `email` would collide, ignoring `exclude_id`.
    pub fn check_duplicate(&self, email: &str, exclude_id: Option<UserId>) -> bool {
        self.registry.is_duplicate_email(email, exclude_id)
    }

    /// Filters users by name and applies the pagination window.
    pub fn search(&self, query: &str, window: &PageWindow) -> SearchPage {
        let matches = filter_users(self.registry.users(), query);
        SearchPage {
            items: window.apply(&matches).iter().map(|&user| user.clone()).collect(),
            total_matches: matches.len(),
            has_more: window.has_more(matches.len()),
        }
    }

    /// Deletes one user; unknown IDs are a no-op.
    pub fn delete_user(&mut self, id: UserId) -> RemoveOutcome {
        self.registry.remove(id)
    }

    /// Deletes every user and returns how many were removed.
    pub fn delete_all(&mut self) -> usize {
        self.registry.clear()
    }

    /// Seeds `First{i} Last{i} test{i}@example.com` rows into an empty registry.
    ///
    /// Returns the number of users added; a non-empty registry is left as is.
    /// The batch is persisted with a single write.
    pub fn seed_sample_users(&mut self, count: usize) -> usize {
        if !self.registry.is_empty() {
            return 0;
        }
        let drafts = (1..=count).map(|i| {
            UserDraft::new(
                format!("First{i}"),
                format!("Last{i}"),
                format!("test{i}@example.com"),
            )
        });
        let added = self.registry.add_many(drafts).len();
        info!("event=users_seed module=service status=ok added={added}");
        added
    }

    /// Adds `count` users with random, non-colliding `random{n}@example.com` emails.
    ///
    /// Returns the IDs of the users that were added. The batch is persisted
    /// with a single write.
    pub fn add_random_users(&mut self, count: usize) -> Vec<UserId> {
        let mut rng = rand::thread_rng();
        let mut taken = HashSet::with_capacity(count);
        let mut drafts = Vec::with_capacity(count);

        for i in 1..=count {
            let email = (0..RANDOM_EMAIL_MAX_ATTEMPTS)
                .map(|_| {
                    format!(
                        "random{}@example.com",
                        rng.gen_range(0..RANDOM_EMAIL_SPACE)
                    )
                })
                .find(|email| {
                    !taken.contains(email) && !self.registry.is_duplicate_email(email, None)
                })
                .unwrap_or_else(|| {
                    format!("random-{}@example.com", uuid::Uuid::new_v4().simple())
                });
            taken.insert(email.clone());
            drafts.push(UserDraft::new(format!("First{i}"), format!("Last{i}"), email));
        }

        let added = self.registry.add_many(drafts);
        info!(
            "event=users_add_random module=service status=ok requested={count} added={}",
            added.len()
        );
        added
    }
}

#[cfg(test)]
mod tests {
    use super::{UserService, UserServiceError};
    use crate::form::validation::FormError;
    use crate::model::user::UserDraft;
    use crate::registry::user_registry::UserRegistry;
    use crate::search::page::PageWindow;
    use crate::store::MemoryStore;

    #[test]
    fn submit_normalizes_email_and_rejects_case_duplicates() {
        let mut service = UserService::open(MemoryStore::new());
        let id = service
            .submit(None, &UserDraft::new("Ann", "Lee", "Ann@X.com"))
            .unwrap();
        assert_eq!(service.registry().get(id).unwrap().email, "ann@x.com");

        let err = service
            .submit(None, &UserDraft::new("Bob", "Roe", "ANN@x.COM"))
            .unwrap_err();
        assert!(matches!(
            err,
            UserServiceError::Form(FormError::DuplicateEmail)
        ));
        assert_eq!(service.registry().len(), 1);
    }

    #[test]
    fn edit_submit_may_keep_own_email() {
        let mut service = UserService::open(MemoryStore::new());
        let id = service
            .submit(None, &UserDraft::new("Ann", "Lee", "ann@x.com"))
            .unwrap();

        service
            .submit(Some(id), &UserDraft::new("Anna", "Lee", "ann@x.com"))
            .unwrap();
        assert_eq!(service.registry().get(id).unwrap().first_name, "Anna");
    }

    #[test]
    fn submit_rejects_incomplete_form() {
        let mut service = UserService::open(MemoryStore::new());
        let err = service
            .submit(None, &UserDraft::new("Ann", "  ", "ann@x.com"))
            .unwrap_err();
        assert!(matches!(
            err,
            UserServiceError::Form(FormError::MissingFields)
        ));
    }

    #[test]
    fn seed_only_fills_empty_registry() {
        let mut service = UserService::open(MemoryStore::new());
        assert_eq!(service.seed_sample_users(100), 100);
        assert_eq!(service.registry().users()[0].email, "test1@example.com");
        assert_eq!(service.registry().users()[99].first_name, "First100");
        assert_eq!(service.seed_sample_users(5), 0);
        assert_eq!(service.registry().len(), 100);
    }

    #[test]
    fn random_users_have_unique_emails() {
        let mut service = UserService::open(MemoryStore::new());
        service.seed_sample_users(10);

        let added = service.add_random_users(100);
        assert_eq!(added.len(), 100);
        assert_eq!(service.registry().len(), 110);

        let mut emails: Vec<_> = service
            .registry()
            .users()
            .iter()
            .map(|user| user.email.clone())
            .collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 110);
    }

    #[test]
    fn search_pages_matches() {
        let mut service = UserService::open(MemoryStore::new());
        service.seed_sample_users(25);

        let mut window = PageWindow::default();
        let page = service.search("first", &window);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_matches, 25);
        assert!(page.has_more);

        window.reveal_more();
        window.reveal_more();
        let page = service.search("FIRST", &window);
        assert_eq!(page.items.len(), 25);
        assert!(!page.has_more);

        let page = service.search("first2", &window);
        let names: Vec<_> = page.items.iter().map(|user| user.full_name()).collect();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "First2 Last2");
        assert_eq!(names[1], "First20 Last20");
        assert_eq!(names[6], "First25 Last25");
    }

    #[test]
    fn bulk_helpers_persist_each_batch_once() {
        let store = MemoryStore::new();
        let mut service = UserService::new(UserRegistry::new(&store));

        assert_eq!(service.seed_sample_users(100), 100);
        assert_eq!(store.write_count(), 1);

        assert_eq!(service.add_random_users(1000).len(), 1000);
        assert_eq!(store.write_count(), 2);
        assert_eq!(service.registry().len(), 1100);

        let reloaded = UserRegistry::open(&store);
        assert_eq!(reloaded.users(), service.registry().users());
    }

    #[test]
    fn delete_all_empties_registry() {
        let mut service = UserService::open(MemoryStore::new());
        service.seed_sample_users(3);
        assert_eq!(service.delete_all(), 3);
        assert!(service.registry().is_empty());
    }
}
