//! Case-insensitive substring search over user full names.

use crate::model::user::User;

/// Returns whether `query` occurs in `"{first_name} {last_name}"`.
///
/// Blank queries match every user.
pub fn matches_name(user: &User, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    user.full_name().to_lowercase().contains(&needle)
}

/// Filters users by name, preserving input order.
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    users
        .iter()
        .filter(|user| matches_name(user, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_users, matches_name};
    use crate::model::user::{User, UserDraft};

    fn user(first: &str, last: &str) -> User {
        User::new(UserDraft::new(first, last, format!("{first}@x.com")))
    }

    #[test]
    fn matches_across_first_and_last_name() {
        let ann = user("Ann", "Lee");
        assert!(matches_name(&ann, "ann l"));
        assert!(matches_name(&ann, "LEE"));
        assert!(matches_name(&ann, "n L"));
        assert!(!matches_name(&ann, "bob"));
    }

    #[test]
    fn blank_query_matches_all_in_order() {
        let users = vec![user("Ann", "Lee"), user("Bob", "Roe")];
        let hits = filter_users(&users, "  ");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].first_name, "Ann");
        assert_eq!(hits[1].first_name, "Bob");
    }

    #[test]
    fn search_does_not_look_at_email() {
        let users = vec![User::new(UserDraft::new("Ann", "Lee", "zed@x.com"))];
        assert!(filter_users(&users, "zed").is_empty());
    }
}
