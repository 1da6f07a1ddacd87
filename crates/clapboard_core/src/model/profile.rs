//! Profile (account) entity.
//!
//! # Responsibility
//! - Hold one validated account: handle, email, credentials, activation state.
//! - Project the account to its redacted wire form.
//!
//! # Invariants
//! - A `Profile` value is always fully valid; setters validate before assigning.
//! - `activation_token`, `credential_hash` and `credential_salt` never appear in
//!   the wire form or in `Debug` output.
//! - Handle/email uniqueness is left to the store.

use crate::model::validate::{
    bounded_text, normalize_hex, validate_uuid, UuidInput, ValidationError, ValidationResult,
};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable profile identifier.
pub type ProfileId = Uuid;

pub const HANDLE_MAX_CHARS: usize = 32;
pub const EMAIL_MAX_CHARS: usize = 128;
pub const ACTIVATION_TOKEN_LEN: usize = 32;
pub const CREDENTIAL_HASH_LEN: usize = 128;
pub const CREDENTIAL_SALT_LEN: usize = 64;

/// Validated account profile.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ProfileWire")]
pub struct Profile {
    id: ProfileId,
    activation_token: Option<String>,
    handle: String,
    email: String,
    credential_hash: String,
    credential_salt: String,
}

/// Redacted JSON projection of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileWire {
    pub id: ProfileId,
    pub handle: String,
    pub email: String,
}

impl Profile {
    /// Creates a profile with a freshly generated id.
    pub fn new(
        activation_token: Option<&str>,
        handle: &str,
        email: &str,
        credential_hash: &str,
        credential_salt: &str,
    ) -> ValidationResult<Self> {
        Self::with_id(
            Uuid::new_v4(),
            activation_token,
            handle,
            email,
            credential_hash,
            credential_salt,
        )
    }

    /// Creates a profile with a caller-provided id.
    ///
    /// Fields are validated in this order: id, activation token, email,
    /// handle, hash, salt. The first failure is returned.
    pub fn with_id<'a>(
        id: impl Into<UuidInput<'a>>,
        activation_token: Option<&str>,
        handle: &str,
        email: &str,
        credential_hash: &str,
        credential_salt: &str,
    ) -> ValidationResult<Self> {
        let id = validate_uuid(id).map_err(|err| err.in_field("profile_id"))?;
        let activation_token = validate_activation_token(activation_token)?;
        let email = validate_email(email)?;
        let handle = validate_handle(handle)?;
        let credential_hash = validate_credential_hash(credential_hash)?;
        let credential_salt = validate_credential_salt(credential_salt)?;

        Ok(Self {
            id,
            activation_token,
            handle,
            email,
            credential_hash,
            credential_salt,
        })
    }

    /// Rebuilds a profile from its wire form plus the secrets it omits.
    pub fn from_wire(
        wire: &ProfileWire,
        activation_token: Option<&str>,
        credential_hash: &str,
        credential_salt: &str,
    ) -> ValidationResult<Self> {
        Self::with_id(
            wire.id,
            activation_token,
            &wire.handle,
            &wire.email,
            credential_hash,
            credential_salt,
        )
    }

    pub fn id(&self) -> ProfileId {
        self.id
    }

    pub fn activation_token(&self) -> Option<&str> {
        self.activation_token.as_deref()
    }

    /// Returns whether the account has completed activation.
    pub fn is_activated(&self) -> bool {
        self.activation_token.is_none()
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }

    pub fn credential_salt(&self) -> &str {
        &self.credential_salt
    }

    /// Sets or clears the activation token.
    pub fn set_activation_token(&mut self, token: Option<&str>) -> ValidationResult<()> {
        self.activation_token = validate_activation_token(token)?;
        Ok(())
    }

    pub fn set_handle(&mut self, handle: &str) -> ValidationResult<()> {
        self.handle = validate_handle(handle)?;
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> ValidationResult<()> {
        self.email = validate_email(email)?;
        Ok(())
    }

    pub fn set_credential_hash(&mut self, hash: &str) -> ValidationResult<()> {
        self.credential_hash = validate_credential_hash(hash)?;
        Ok(())
    }

    pub fn set_credential_salt(&mut self, salt: &str) -> ValidationResult<()> {
        self.credential_salt = validate_credential_salt(salt)?;
        Ok(())
    }

    /// Projects the profile to its wire form, dropping every secret.
    pub fn to_wire(&self) -> ProfileWire {
        ProfileWire {
            id: self.id,
            handle: self.handle.clone(),
            email: self.email.clone(),
        }
    }
}

impl From<Profile> for ProfileWire {
    fn from(value: Profile) -> Self {
        Self {
            id: value.id,
            handle: value.handle,
            email: value.email,
        }
    }
}

impl Debug for Profile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("activated", &self.is_activated())
            .field("handle", &self.handle)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Validates an optional activation token.
///
/// `None` means the account is already active. Any present value must be 32
/// hex characters after trim/lowercase; everything else is a range violation.
pub fn validate_activation_token(token: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(raw) = token else {
        return Ok(None);
    };
    let value = raw.trim().to_ascii_lowercase();
    if value.len() != ACTIVATION_TOKEN_LEN || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::range_violation(
            "activation_token",
            format!("must be exactly {ACTIVATION_TOKEN_LEN} hex characters"),
        ));
    }
    Ok(Some(value))
}

/// Trims and strips unsafe characters, then bounds the handle length.
pub fn validate_handle(handle: &str) -> ValidationResult<String> {
    bounded_text(handle, "handle", HANDLE_MAX_CHARS)
}

/// Trims and checks address syntax, then bounds the email length.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let value = normalize_email(email);
    if value.is_empty() {
        return Err(ValidationError::invalid_format("email", "value is empty"));
    }
    // The parser also accepts `Name <addr>` display forms; only bare
    // addresses are stored.
    let has_display_text = value
        .chars()
        .any(|c| c.is_whitespace() || c == '<' || c == '>');
    if has_display_text || EmailAddress::from_str(value).is_err() {
        return Err(ValidationError::invalid_format(
            "email",
            "value is not a valid email address",
        ));
    }
    let length = value.chars().count();
    if length > EMAIL_MAX_CHARS {
        return Err(ValidationError::range_violation(
            "email",
            format!("{length} characters exceeds maximum of {EMAIL_MAX_CHARS}"),
        ));
    }
    Ok(value.to_string())
}

pub fn validate_credential_hash(hash: &str) -> ValidationResult<String> {
    normalize_hex(hash, "credential_hash", CREDENTIAL_HASH_LEN)
}

pub fn validate_credential_salt(salt: &str) -> ValidationResult<String> {
    normalize_hex(salt, "credential_salt", CREDENTIAL_SALT_LEN)
}

/// Email sanitization shared by `set_email` and email lookups.
pub(crate) fn normalize_email(email: &str) -> &str {
    email.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn hash() -> String {
        "ab".repeat(CREDENTIAL_HASH_LEN / 2)
    }

    fn salt() -> String {
        "cd".repeat(CREDENTIAL_SALT_LEN / 2)
    }

    #[test]
    fn validation_order_reports_email_before_handle() {
        let err = Profile::new(None, "", "not-an-email", &hash(), &salt()).unwrap_err();
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn setters_leave_value_untouched_on_failure() {
        let mut profile =
            Profile::new(None, "birdwatcher", "bird@example.com", &hash(), &salt()).unwrap();

        let err = profile.set_handle(&"h".repeat(HANDLE_MAX_CHARS + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RangeViolation);
        assert_eq!(profile.handle(), "birdwatcher");

        profile.set_handle("  <i>owl</i>fan ").unwrap();
        assert_eq!(profile.handle(), "owlfan");
    }

    #[test]
    fn activation_token_is_normalized_and_clearable() {
        let mut profile = Profile::new(
            Some(" 0123456789ABCDEF0123456789ABCDEF "),
            "birdwatcher",
            "bird@example.com",
            &hash(),
            &salt(),
        )
        .unwrap();
        assert_eq!(
            profile.activation_token(),
            Some("0123456789abcdef0123456789abcdef")
        );
        assert!(!profile.is_activated());

        profile.set_activation_token(None).unwrap();
        assert!(profile.is_activated());
    }

    #[test]
    fn activation_token_failures_are_range_violations() {
        for bad in ["abc", "zz23456789abcdef0123456789abcdef", ""] {
            let err = validate_activation_token(Some(bad)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RangeViolation, "token `{bad}`");
        }
    }

    #[test]
    fn email_rejects_display_name_forms() {
        let err = validate_email("Gloria <gloria@example.com>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(
            validate_email("  gloria@example.com ").unwrap(),
            "gloria@example.com"
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let profile =
            Profile::new(None, "birdwatcher", "bird@example.com", &hash(), &salt()).unwrap();
        let rendered = format!("{profile:?}");
        assert!(!rendered.contains(&hash()));
        assert!(!rendered.contains(&salt()));
    }
}
