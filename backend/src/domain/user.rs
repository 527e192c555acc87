//! User identity as seen by the reservation core.
//!
//! User management lives elsewhere; the reservation flow only needs a stable
//! identifier and the contact address copied into notification jobs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "requester email must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap a UUID that is already known to be valid (e.g. loaded from the
    /// database).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// The authenticated caller of a reservation operation.
///
/// The transport layer resolves both fields from the session before invoking
/// the domain, so the reservation flow never reaches into user storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    user_id: UserId,
    email: String,
}

impl Requester {
    /// Build a requester, rejecting a blank contact address.
    pub fn new(user_id: UserId, email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into().trim().to_owned();
        if email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        Ok(Self { user_id, email })
    }

    /// Identifier of the requesting user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Contact address used for notification payloads.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    fn user_id_rejects_malformed_input(#[case] input: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(input), Err(expected));
    }

    #[rstest]
    fn user_id_keeps_raw_representation() {
        let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
        assert_eq!(UserId::from_uuid(*id.as_uuid()), id);
    }

    #[rstest]
    fn requester_trims_and_requires_email() {
        let user_id = UserId::random();
        let requester = Requester::new(user_id.clone(), "  ada@example.test ").expect("valid");
        assert_eq!(requester.email(), "ada@example.test");
        assert_eq!(requester.user_id(), &user_id);

        assert_eq!(
            Requester::new(user_id, "   "),
            Err(UserValidationError::EmptyEmail)
        );
    }
}
