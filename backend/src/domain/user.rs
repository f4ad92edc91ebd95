//! User identity primitives.
//!
//! Account lifecycle (registration, password verification) belongs to the
//! auth collaborator; the domain only carries the identity reference it
//! needs for ownership checks, plus the username shown on login.

use std::fmt;

use uuid::Uuid;

/// Error returned when parsing a [`UserId`] from raw text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user id must be a valid UUID")]
pub struct UserIdParseError;

/// Opaque identity of an account holder.
///
/// # Examples
/// ```
/// use backend::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse an identity from its canonical string form.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserIdParseError> {
        Uuid::parse_str(raw.as_ref())
            .map(Self)
            .map_err(|_| UserIdParseError)
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID for persistence adapters.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors raised when constructing a [`Username`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameValidationError {
    /// Username was blank once trimmed.
    #[error("username must not be empty")]
    Empty,
    /// Username exceeded the storage limit.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// The enforced maximum length.
        max: usize,
    },
}

/// Validated account username.
///
/// ## Invariants
/// - Trimmed, non-empty, and at most 150 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MAX_LEN: usize = 150;

    /// Construct a username from raw input, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UsernameValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UsernameValidationError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(UsernameValidationError::TooLong { max: Self::MAX_LEN });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A known account: identity plus its unique username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
}

impl User {
    /// Assemble a user from validated parts.
    pub const fn new(id: UserId, username: Username) -> Self {
        Self { id, username }
    }

    /// Construct from raw strings, validating both parts.
    pub fn try_from_strings(id: &str, username: &str) -> Result<Self, String> {
        let id = UserId::new(id).map_err(|err| err.to_string())?;
        let username = Username::new(username).map_err(|err| err.to_string())?;
        Ok(Self::new(id, username))
    }

    /// Account identity.
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Account username.
    pub const fn username(&self) -> &Username {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for identity parsing and username validation.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("not-a-uuid")]
    #[case("")]
    #[case("3fa85f64-5717-4562-b3fc")]
    fn invalid_user_ids_are_rejected(#[case] raw: &str) {
        assert_eq!(UserId::new(raw), Err(UserIdParseError));
    }

    #[rstest]
    fn user_id_round_trips_through_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(UserId::new(uuid.to_string()), Ok(id));
    }

    #[rstest]
    #[case("", UsernameValidationError::Empty)]
    #[case("   ", UsernameValidationError::Empty)]
    fn blank_usernames_are_rejected(#[case] raw: &str, #[case] expected: UsernameValidationError) {
        assert_eq!(Username::new(raw), Err(expected));
    }

    #[rstest]
    fn overlong_username_is_rejected() {
        let raw = "x".repeat(151);
        assert_eq!(
            Username::new(raw),
            Err(UsernameValidationError::TooLong { max: 150 })
        );
    }

    #[rstest]
    fn username_is_trimmed() {
        let username = Username::new("  ram  ").expect("valid username");
        assert_eq!(username.as_str(), "ram");
    }
}
