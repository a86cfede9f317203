//! Core category domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    error::ValidationErrors,
    payload::{FieldReader, NOT_BLANK_MESSAGE, REQUIRED_MESSAGE},
};

/// The maximum number of characters in a category name.
pub const CATEGORY_NAME_MAX_LENGTH: usize = 50;

/// A validated, non-blank category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] on the field `name`
    /// if `name` is blank or longer than [CATEGORY_NAME_MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::Validation(ValidationErrors::single(
                "name",
                NOT_BLANK_MESSAGE,
            )));
        }

        if name.chars().count() > CATEGORY_NAME_MAX_LENGTH {
            return Err(Error::Validation(ValidationErrors::single(
                "name",
                format!("Ensure this field has no more than {CATEGORY_NAME_MAX_LENGTH} characters."),
            )));
        }

        Ok(Self(name.to_string()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not blank and not too long.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariants are violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// A category that groups a user's transactions, e.g. 'Groceries' or 'Salary'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category, unique among the categories of its owner.
    pub name: CategoryName,
    /// When the category was created.
    #[serde(with = "crate::serde_format::timestamp")]
    pub created_at: OffsetDateTime,
}

/// Read the category name from a create or update request body.
///
/// Returns `None` only for a partial update that leaves the name out.
///
/// # Errors
///
/// Returns an [Error::Validation] if the name is missing, null, blank or too long.
pub fn parse_category_payload(
    payload: &Map<String, Value>,
    partial: bool,
) -> Result<Option<CategoryName>, Error> {
    let mut reader = FieldReader::new(payload, partial);

    let name = match reader.string("name") {
        Some(name) => reader.collect(CategoryName::new(&name))?,
        None => None,
    };

    reader.finish()?;

    Ok(name)
}

/// Read the name of a new category from a request body.
///
/// # Errors
///
/// Returns an [Error::Validation] if the name is missing, null, blank or too long.
pub fn parse_new_category(payload: &Map<String, Value>) -> Result<CategoryName, Error> {
    parse_category_payload(payload, false)?
        .ok_or_else(|| Error::Validation(ValidationErrors::single("name", REQUIRED_MESSAGE)))
}
