//! User domain
//!
//! User records, their lookup index entries, field validation and the
//! repository contract that keeps records and indexes consistent.

mod entity;
mod repository;
mod validation;

pub use entity::{
    ContactUpdate, EmailIndexEntry, Gender, IndexKey, PhoneIndexEntry, User, UserId,
};
pub use repository::{
    normalize_page_size, UserPage, UserRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use validation::{
    validate_date_of_birth, validate_email, validate_first_name, validate_gender,
    validate_last_name, validate_phone_number, UserValidationError,
};

#[cfg(test)]
pub use repository::MockUserRepository;
