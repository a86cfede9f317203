//! Validation of the request bodies for creating and updating transactions.

use rusqlite::Connection;
use serde_json::{Map, Value};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category_owner},
    error::ValidationErrors,
    payload::{FieldReader, REQUIRED_MESSAGE},
    serde_format::date::DATE_FORMAT,
    transaction::{Amount, TransactionBuilder, TransactionType},
};

/// The maximum number of characters in a transaction description.
pub const DESCRIPTION_MAX_LENGTH: usize = 200;

const INVALID_DATE_MESSAGE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const INVALID_CATEGORY_MESSAGE: &str = "Invalid category.";

/// The validated fields of a transaction request body.
///
/// A field is `None` when it was left out of a partial update, or when it is
/// the optional description and was left out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionPayload {
    pub date: Option<Date>,
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<Amount>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl TransactionPayload {
    /// Overwrite the fields of `builder` with the fields present in this payload.
    pub fn apply_to(self, mut builder: TransactionBuilder) -> TransactionBuilder {
        if let Some(date) = self.date {
            builder.date = date;
        }

        if let Some(transaction_type) = self.transaction_type {
            builder.transaction_type = transaction_type;
        }

        if let Some(amount) = self.amount {
            builder.amount = amount;
        }

        if let Some(description) = self.description {
            builder.description = description;
        }

        if let Some(category_id) = self.category_id {
            builder.category_id = category_id;
        }

        builder
    }

    /// Build a new transaction, with an empty description if none was given.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for each required field that is missing,
    /// which only happens if the payload was parsed as a partial update.
    pub fn into_builder(self) -> Result<TransactionBuilder, Error> {
        match (
            self.category_id,
            self.date,
            self.transaction_type,
            self.amount,
        ) {
            (Some(category_id), Some(date), Some(transaction_type), Some(amount)) => {
                Ok(TransactionBuilder {
                    category_id,
                    date,
                    transaction_type,
                    amount,
                    description: self.description.unwrap_or_default(),
                })
            }
            (category_id, date, transaction_type, amount) => {
                let mut errors = ValidationErrors::new();

                for (field, missing) in [
                    ("category_id", category_id.is_none()),
                    ("date", date.is_none()),
                    ("type", transaction_type.is_none()),
                    ("amount", amount.is_none()),
                ] {
                    if missing {
                        errors.add(field, REQUIRED_MESSAGE);
                    }
                }

                Err(Error::Validation(errors))
            }
        }
    }
}

/// Validate a transaction request body for `user_id`.
///
/// Every field is checked and all errors are reported together. When
/// `partial` is true, fields that are left out are not required.
/// Any `user` or `user_id` keys are ignored.
///
/// # Errors
///
/// Returns an [Error::Validation] with the errors for every invalid field,
/// or an [Error::SqlError] if the category could not be looked up.
pub fn parse_transaction_payload(
    payload: &Map<String, Value>,
    partial: bool,
    user_id: UserID,
    connection: &Connection,
) -> Result<TransactionPayload, Error> {
    let mut reader = FieldReader::new(payload, partial);

    let date = reader
        .string("date")
        .and_then(|raw| reader.check("date", parse_date(&raw)));

    let transaction_type = reader
        .string("type")
        .and_then(|raw| reader.check("type", raw.parse::<TransactionType>()));

    let amount = reader
        .value("amount")
        .and_then(|raw| reader.check("amount", Amount::parse(raw)));

    let description = reader
        .optional_string("description")
        .and_then(|raw| reader.check("description", parse_description(&raw)));

    let category_id = match reader.value("category_id") {
        Some(raw) => match parse_category_id(raw) {
            Ok(category_id) => {
                let owner_check = check_category_owner(category_id, user_id, connection)?;
                reader.check("category_id", owner_check.map(|()| category_id))
            }
            Err(message) => {
                reader.add_error("category_id", message);
                None
            }
        },
        None => None,
    };

    reader.finish()?;

    Ok(TransactionPayload {
        date,
        transaction_type,
        amount,
        description,
        category_id,
    })
}

/// Parse a date written exactly as "YYYY-MM-DD".
fn parse_date(raw: &str) -> Result<Date, String> {
    let is_well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(index, byte)| match index {
            4 | 7 => byte == b'-',
            _ => byte.is_ascii_digit(),
        });

    if !is_well_formed {
        return Err(INVALID_DATE_MESSAGE.to_owned());
    }

    match Date::parse(raw, DATE_FORMAT) {
        Ok(date) if date.year() >= 1 => Ok(date),
        _ => Err(INVALID_DATE_MESSAGE.to_owned()),
    }
}

fn parse_description(raw: &str) -> Result<String, String> {
    let description = raw.trim();

    if description.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {DESCRIPTION_MAX_LENGTH} characters."
        ));
    }

    Ok(description.to_owned())
}

/// Read a category ID from an integer or a string of digits.
fn parse_category_id(raw: &Value) -> Result<CategoryId, String> {
    let type_name = match raw {
        Value::Number(number) => match number.as_i64() {
            Some(category_id) => return Ok(category_id),
            None if number.is_f64() => "float",
            None => return Err(does_not_exist_message(number)),
        },
        Value::String(text) => match text.trim().parse::<CategoryId>() {
            Ok(category_id) => return Ok(category_id),
            Err(_) => "str",
        },
        Value::Bool(_) => "bool",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
        Value::Null => "NoneType",
    };

    Err(format!(
        "Incorrect type. Expected pk value, received {type_name}."
    ))
}

/// Check that `category_id` refers to a category owned by `user_id`.
///
/// The outer result carries database errors, the inner result the
/// validation message.
fn check_category_owner(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Result<(), String>, Error> {
    match get_category_owner(category_id, connection) {
        Ok(owner) if owner == user_id => Ok(Ok(())),
        Ok(_) => Ok(Err(INVALID_CATEGORY_MESSAGE.to_owned())),
        Err(Error::NotFound) => Ok(Err(does_not_exist_message(category_id))),
        Err(error) => Err(error),
    }
}

fn does_not_exist_message(category_id: impl std::fmt::Display) -> String {
    format!("Invalid pk \"{category_id}\" - object does not exist.")
}
