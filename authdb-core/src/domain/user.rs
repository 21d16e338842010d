//! User domain model
//!
//! The `users` table has exactly five columns. `UserField` is the closed set
//! of their names; every caller-supplied lookup or update key is parsed into
//! a `UserField` before anything reaches storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Name of the table backing [`User`]
pub const USERS_TABLE: &str = "users";

/// Maximum length of every text column
pub const MAX_TEXT_LEN: usize = 250;

/// A persisted user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Already hashed by the caller, never exposed in JSON
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
}

impl User {
    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn has_pending_reset(&self) -> bool {
        self.reset_token.is_some()
    }

    /// Current value of `field` on this record
    pub fn get(&self, field: UserField) -> FieldValue {
        match field {
            UserField::Id => FieldValue::Integer(self.id),
            UserField::Email => FieldValue::Text(self.email.clone()),
            UserField::HashedPassword => FieldValue::Text(self.hashed_password.clone()),
            UserField::SessionId => self.session_id.clone().into(),
            UserField::ResetToken => self.reset_token.clone().into(),
        }
    }
}

/// Column of the `users` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Id,
    Email,
    HashedPassword,
    SessionId,
    ResetToken,
}

impl UserField {
    /// All columns in table order
    pub const ALL: [UserField; 5] = [
        UserField::Id,
        UserField::Email,
        UserField::HashedPassword,
        UserField::SessionId,
        UserField::ResetToken,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::HashedPassword => "hashed_password",
            UserField::SessionId => "session_id",
            UserField::ResetToken => "reset_token",
        }
    }

    /// Declared SQL type, as written in the schema migration
    pub fn sql_type(self) -> &'static str {
        match self {
            UserField::Id => "BIGINT",
            _ => "VARCHAR(250)",
        }
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, UserField::SessionId | UserField::ResetToken)
    }

    /// `id` is assigned by storage and never changes
    pub fn is_mutable(self) -> bool {
        self != UserField::Id
    }

    /// Whether `value` has the right kind for this column.
    ///
    /// `Null` is accepted for every column; NOT NULL is left to storage.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) => true,
            (UserField::Id, FieldValue::Integer(_)) => true,
            (UserField::Id, FieldValue::Text(_)) => false,
            (_, FieldValue::Text(_)) => true,
            (_, FieldValue::Integer(_)) => false,
        }
    }

    /// Parse raw text (e.g. from the command line) into a value for this column
    pub fn parse_value(self, raw: &str) -> Result<FieldValue> {
        match self {
            UserField::Id => raw.trim().parse::<i64>().map(FieldValue::Integer).map_err(|_| {
                Error::invalid_argument(format!("id must be an integer, got '{}'", raw))
            }),
            _ => Ok(FieldValue::Text(raw.to_string())),
        }
    }

    fn check_value(self, value: &FieldValue) -> Result<()> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "{} expects {}, got {}",
                self,
                if self == UserField::Id { "an integer" } else { "text" },
                value.kind_name()
            )))
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for UserField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UserField::ALL
            .into_iter()
            .find(|field| field.column_name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = UserField::ALL.iter().map(|f| f.column_name()).collect();
                Error::invalid_argument(format!(
                    "unknown user field '{}' (valid fields: {})",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// A value for one column, in a lookup or an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "an integer",
            FieldValue::Text(_) => "text",
            FieldValue::Null => "null",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Text(s) => write!(f, "'{}'", s),
            FieldValue::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Parse `(key, value)` pairs into typed pairs, rejecting unknown keys and
/// values of the wrong kind.
fn parse_pairs<I, K, V>(pairs: I) -> Result<Vec<(UserField, FieldValue)>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| {
            let field: UserField = key.as_ref().parse()?;
            let value = value.into();
            field.check_value(&value)?;
            Ok((field, value))
        })
        .collect()
}

/// Conjunctive lookup criteria: every pair must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pairs: Vec<(UserField, FieldValue)>,
}

impl Criteria {
    /// Parse caller-supplied criteria.
    ///
    /// Fails with `InvalidArgument` if there are no pairs, a key is not a
    /// column name, or a value has the wrong kind.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let pairs = parse_pairs(pairs)?;
        if pairs.is_empty() {
            return Err(Error::invalid_argument("no lookup criteria provided"));
        }
        Ok(Self { pairs })
    }

    pub fn by_id(id: i64) -> Self {
        Self {
            pairs: vec![(UserField::Id, FieldValue::Integer(id))],
        }
    }

    /// Add another condition
    pub fn and(mut self, field: UserField, value: impl Into<FieldValue>) -> Result<Self> {
        let value = value.into();
        field.check_value(&value)?;
        self.pairs.push((field, value));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(UserField, FieldValue)> {
        self.pairs.iter()
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .pairs
            .iter()
            .map(|(field, value)| match field {
                // Only the id is safe to echo back in messages
                UserField::Id => format!("{} = {}", field, value),
                _ if value.is_null() => format!("{} IS NULL", field),
                _ => format!("{} = <redacted>", field),
            })
            .collect();
        f.write_str(&parts.join(" AND "))
    }
}

/// A set of column changes for one user. Never touches `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    changes: Vec<(UserField, FieldValue)>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse caller-supplied updates. An empty set is valid.
    ///
    /// Fails with `InvalidArgument` for unknown keys, for `id`, and for
    /// values of the wrong kind. A repeated key keeps its last value.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        parse_pairs(pairs)?
            .into_iter()
            .try_fold(Self::new(), |update, (field, value)| update.set(field, value))
    }

    pub fn set(mut self, field: UserField, value: impl Into<FieldValue>) -> Result<Self> {
        if !field.is_mutable() {
            return Err(Error::invalid_argument(format!("{} cannot be updated", field)));
        }
        let value = value.into();
        field.check_value(&value)?;
        match self.changes.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.changes.push((field, value)),
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(UserField, FieldValue)> {
        self.changes.iter()
    }

    /// Names of the columns being changed, for logging
    pub fn fields(&self) -> Vec<UserField> {
        self.changes.iter().map(|(field, _)| *field).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "a@x.com".to_string(),
            hashed_password: "h1".to_string(),
            session_id: None,
            reset_token: Some("tok".to_string()),
        }
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in UserField::ALL {
            assert_eq!(field.column_name().parse::<UserField>().unwrap(), field);
        }
        assert_eq!(
            UserField::ALL.map(|f| f.column_name()),
            ["id", "email", "hashed_password", "session_id", "reset_token"]
        );
    }

    #[test]
    fn test_unknown_field_is_invalid_argument() {
        let err = "hashedPassword".parse::<UserField>().unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("hashedPassword"));
    }

    #[test]
    fn test_nullability() {
        assert!(!UserField::Id.is_nullable());
        assert!(!UserField::Email.is_nullable());
        assert!(!UserField::HashedPassword.is_nullable());
        assert!(UserField::SessionId.is_nullable());
        assert!(UserField::ResetToken.is_nullable());
    }

    #[test]
    fn test_criteria_rejects_empty() {
        let err = Criteria::parse(Vec::<(&str, FieldValue)>::new()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_criteria_rejects_lookalike_key() {
        let err = Criteria::parse([("emails", "a@x.com")]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_criteria_rejects_text_id() {
        let err = Criteria::parse([("id", "7")]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_criteria_display_redacts_secrets() {
        let criteria = Criteria::by_id(3)
            .and(UserField::SessionId, "s3cr3t")
            .unwrap()
            .and(UserField::ResetToken, None::<String>)
            .unwrap();
        let shown = criteria.to_string();
        assert_eq!(shown, "id = 3 AND session_id = <redacted> AND reset_token IS NULL");
    }

    #[test]
    fn test_update_rejects_id() {
        let err = UserUpdate::parse([("id", 5)]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_update_allows_empty_and_keeps_last_value() {
        assert!(UserUpdate::parse(Vec::<(&str, &str)>::new()).unwrap().is_empty());

        let update = UserUpdate::parse([("session_id", "s1"), ("session_id", "s2")]).unwrap();
        assert_eq!(update.fields(), vec![UserField::SessionId]);
        assert_eq!(
            update.iter().next().unwrap().1,
            FieldValue::Text("s2".to_string())
        );
    }

    #[test]
    fn test_update_accepts_null_for_any_text_column() {
        // NOT NULL is enforced by storage, not here
        let update = UserUpdate::new().set(UserField::Email, FieldValue::Null).unwrap();
        assert_eq!(update.fields(), vec![UserField::Email]);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(UserField::Id.parse_value(" 42 ").unwrap(), FieldValue::Integer(42));
        assert!(UserField::Id.parse_value("abc").unwrap_err().is_invalid_argument());
        assert_eq!(
            UserField::Email.parse_value("42").unwrap(),
            FieldValue::Text("42".to_string())
        );
    }

    #[test]
    fn test_user_get_and_json_hides_password() {
        let user = sample_user();
        assert_eq!(user.get(UserField::SessionId), FieldValue::Null);
        assert_eq!(user.get(UserField::ResetToken), FieldValue::Text("tok".to_string()));
        assert!(!user.has_session());
        assert!(user.has_pending_reset());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert_eq!(json["email"], "a@x.com");
    }
}
