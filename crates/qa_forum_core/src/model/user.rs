//! User entity.

use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
pub type UserId = i64;

/// Forum member. Names are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// `None` until the first save.
    pub id: Option<UserId>,
    pub fname: String,
    pub lname: String,
}

impl User {
    /// Creates an unsaved user.
    pub fn new(fname: impl Into<String>, lname: impl Into<String>) -> Self {
        Self {
            id: None,
            fname: fname.into(),
            lname: lname.into(),
        }
    }

    /// Returns whether the user already has a store row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Display name in `first last` form.
    pub fn full_name(&self) -> String {
        format_full_name(&self.fname, &self.lname)
    }
}

pub(crate) fn format_full_name(fname: &str, lname: &str) -> String {
    format!("{fname} {lname}")
}

#[cfg(test)]
mod tests {
    use super::User;

    #[test]
    fn new_user_is_not_persisted() {
        let user = User::new("Ada", "Lovelace");
        assert_eq!(user.id, None);
        assert!(!user.is_persisted());
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
