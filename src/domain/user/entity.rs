//! User entity and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    validate_date_of_birth, validate_email, validate_first_name, validate_gender,
    validate_last_name, validate_phone_number, UserValidationError,
};
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// User identifier - a hyphenated UUID, assigned at creation and never reused
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an identifier received from a caller
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        let uuid = Uuid::parse_str(id)
            .map_err(|_| DomainError::invalid_argument(format!("Invalid user ID '{}'", id)))?;

        Ok(Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for UserId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of accepted genders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(UserValidationError::InvalidGender),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Changes to a user's contact details; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactUpdate {
    pub fn phone(phone: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone.into()),
            email: None,
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            phone_number: None,
            email: Some(email.into()),
        }
    }
}

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    /// Kept as received so validation can report an unknown value
    gender: String,
    /// `None` is the unset date and never passes validation
    date_of_birth: Option<DateTime<Utc>>,
    phone_number: String,
    email: String,
    #[serde(default)]
    is_blocked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a generated ID; does not validate
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        gender: impl Into<String>,
        date_of_birth: Option<DateTime<Utc>>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: UserId::generate(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender: gender.into(),
            date_of_birth,
            phone_number: phone_number.into(),
            email: email.into(),
            is_blocked: false,
            created_at: now,
            updated_at: now,
        }
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn date_of_birth(&self) -> Option<DateTime<Utc>> {
        self.date_of_birth
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Check every field, reporting the first failure in declaration order:
    /// first name, last name, gender, date of birth, phone, email.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if !validate_first_name(&self.first_name) {
            return Err(UserValidationError::InvalidFirstName);
        }

        if !validate_last_name(&self.last_name) {
            return Err(UserValidationError::InvalidLastName);
        }

        if !validate_gender(&self.gender) {
            return Err(UserValidationError::InvalidGender);
        }

        if !validate_date_of_birth(self.date_of_birth, Utc::now()) {
            return Err(UserValidationError::InvalidDateOfBirth);
        }

        if !validate_phone_number(&self.phone_number) {
            return Err(UserValidationError::InvalidPhoneNumber);
        }

        if !validate_email(&self.email) {
            return Err(UserValidationError::InvalidEmail);
        }

        Ok(())
    }

    // Mutators

    /// Replace the profile fields unconditionally
    pub fn apply_update(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        gender: impl Into<String>,
        date_of_birth: Option<DateTime<Utc>>,
    ) {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self.gender = gender.into();
        self.date_of_birth = date_of_birth;
        self.touch();
    }

    /// Overwrite whichever contact fields are present
    pub fn apply_contact_update(&mut self, update: ContactUpdate) {
        if let Some(phone) = update.phone_number {
            self.phone_number = phone;
        }

        if let Some(email) = update.email {
            self.email = email;
        }

        self.touch();
    }

    /// Block the user; not idempotency-checked here
    pub fn block(&mut self) {
        self.is_blocked = true;
        self.touch();
    }

    pub fn unblock(&mut self) {
        self.is_blocked = false;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = self.updated_at.max(Utc::now());
    }
}

impl StorageEntity for User {
    type Key = UserId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// Key of a secondary index table: a phone number or an email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKey(String);

impl IndexKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for IndexKey {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IndexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phone number -> user ID mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneIndexEntry {
    pub phone_number: IndexKey,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl PhoneIndexEntry {
    pub fn new(phone_number: &str, user_id: UserId) -> Self {
        Self {
            phone_number: IndexKey::new(phone_number),
            user_id,
            created_at: Utc::now(),
        }
    }
}

impl StorageEntity for PhoneIndexEntry {
    type Key = IndexKey;

    fn key(&self) -> &Self::Key {
        &self.phone_number
    }
}

/// Email -> user ID mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailIndexEntry {
    pub email: IndexKey,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl EmailIndexEntry {
    pub fn new(email: &str, user_id: UserId) -> Self {
        Self {
            email: IndexKey::new(email),
            user_id,
            created_at: Utc::now(),
        }
    }
}

impl StorageEntity for EmailIndexEntry {
    type Key = IndexKey;

    fn key(&self) -> &Self::Key {
        &self.email
    }
}
