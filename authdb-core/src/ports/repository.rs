//! Repository port - user storage abstraction

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Criteria, FieldValue, User, UserUpdate};

/// User storage abstraction
///
/// The only way callers read or write user records. Implementations own
/// their storage connection; nothing else touches it.
pub trait UserRepository: Send + Sync {
    /// Insert a new user with no session and no reset token, committing
    /// before returning the stored record (with its assigned id).
    fn add_user(&self, email: &str, hashed_password: &str) -> Result<User>;

    /// First user (lowest id) matching every criterion, or `NotFound`
    fn find_user(&self, criteria: &Criteria) -> Result<User>;

    /// Apply all changes to user `user_id` in a single commit.
    ///
    /// Fails with `NotFound` if the user does not exist; nothing is written
    /// on any failure.
    fn update_user_fields(&self, user_id: i64, update: &UserUpdate) -> Result<()>;

    /// Drop and recreate the users table. Destroys every record.
    fn reset(&self) -> Result<()>;

    /// Look a user up by caller-supplied `(column, value)` pairs
    fn find_user_by<I, K, V>(&self, criteria: I) -> Result<User>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let criteria = Criteria::parse(criteria)?;
        self.find_user(&criteria)
    }

    /// Update a user from caller-supplied `(column, value)` pairs.
    ///
    /// A missing user is reported as `NotFound` even when the pairs are
    /// also invalid.
    fn update_user<I, K, V>(&self, user_id: i64, attributes: I) -> Result<()>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        match UserUpdate::parse(attributes) {
            Ok(update) => self.update_user_fields(user_id, &update),
            Err(invalid) => {
                self.find_user(&Criteria::by_id(user_id))?;
                Err(invalid)
            }
        }
    }
}

/// Column of the live users table, as reported by storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}
