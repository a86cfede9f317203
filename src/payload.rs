//! Reads the fields of JSON request bodies and collects field-level errors.
//!
//! All fields of a request are checked before anything is rejected so that
//! a client gets every problem with its request in a single response.

use serde_json::{Map, Value};

use crate::{Error, error::ValidationErrors};

/// The error for a field that is absent from a request that needs it.
pub const REQUIRED_MESSAGE: &str = "This field is required.";
/// The error for a field that is explicitly `null`.
pub const NOT_NULL_MESSAGE: &str = "This field may not be null.";
/// The error for a text field that is empty or only whitespace.
pub const NOT_BLANK_MESSAGE: &str = "This field may not be blank.";

const NOT_A_STRING_MESSAGE: &str = "Not a valid string.";

/// Reads fields from a JSON object, recording an error for each field that
/// is missing, `null`, or fails validation.
///
/// In partial mode, which is used for PATCH requests, missing fields are
/// skipped without an error.
#[derive(Debug)]
pub struct FieldReader<'a> {
    payload: &'a Map<String, Value>,
    partial: bool,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over `payload`.
    pub fn new(payload: &'a Map<String, Value>, partial: bool) -> Self {
        Self {
            payload,
            partial,
            errors: ValidationErrors::new(),
        }
    }

    /// Get the value of a required field.
    ///
    /// Returns `None` if the field is missing or `null`. An error is recorded
    /// for a `null` field, and for a missing field unless the reader is partial.
    pub fn value(&mut self, field: &str) -> Option<&'a Value> {
        match self.payload.get(field) {
            None => {
                if !self.partial {
                    self.errors.add(field, REQUIRED_MESSAGE);
                }

                None
            }
            Some(Value::Null) => {
                self.errors.add(field, NOT_NULL_MESSAGE);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Get the value of a field that may be left out, even in a full update.
    pub fn optional_value(&mut self, field: &str) -> Option<&'a Value> {
        match self.payload.get(field) {
            None => None,
            Some(Value::Null) => {
                self.errors.add(field, NOT_NULL_MESSAGE);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// Get a required text field.
    ///
    /// Numbers and booleans are converted to text, other JSON values are rejected.
    pub fn string(&mut self, field: &str) -> Option<String> {
        let value = self.value(field)?;
        self.coerce_string(field, value)
    }

    /// Get a text field that may be left out.
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        let value = self.optional_value(field)?;
        self.coerce_string(field, value)
    }

    fn coerce_string(&mut self, field: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => {
                self.errors.add(field, NOT_A_STRING_MESSAGE);
                None
            }
        }
    }

    /// Record `message` against `field`.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Keep the value of `result`, or record its error message against `field`.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.errors.add(field, message);
                None
            }
        }
    }

    /// Keep the value of `result`, or record its validation errors.
    ///
    /// # Errors
    ///
    /// Errors other than [Error::Validation] are returned as is.
    pub fn collect<T>(&mut self, result: Result<T, Error>) -> Result<Option<T>, Error> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(Error::Validation(errors)) => {
                self.errors.merge(errors);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Finish reading.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] with every recorded error, if any.
    pub fn finish(self) -> Result<(), Error> {
        self.errors.into_result()
    }
}

#[cfg(test)]
mod field_reader_tests {
    use serde_json::{Map, Value, json};

    use crate::Error;

    use super::{FieldReader, NOT_NULL_MESSAGE, REQUIRED_MESSAGE};

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    #[track_caller]
    fn assert_field_error(result: Result<(), Error>, field: &str, message: &str) {
        let Err(Error::Validation(errors)) = result else {
            panic!("expected validation errors, got {result:?}");
        };

        assert_eq!(errors.get(field), Some(&[message.to_owned()][..]));
    }

    #[test]
    fn missing_field_is_required() {
        let payload = as_map(json!({}));
        let mut reader = FieldReader::new(&payload, false);

        assert_eq!(reader.string("name"), None);
        assert_field_error(reader.finish(), "name", REQUIRED_MESSAGE);
    }

    #[test]
    fn missing_field_is_skipped_when_partial() {
        let payload = as_map(json!({}));
        let mut reader = FieldReader::new(&payload, true);

        assert_eq!(reader.string("name"), None);
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn null_is_rejected_even_when_partial() {
        let payload = as_map(json!({"name": null}));
        let mut reader = FieldReader::new(&payload, true);

        assert_eq!(reader.string("name"), None);
        assert_field_error(reader.finish(), "name", NOT_NULL_MESSAGE);
    }

    #[test]
    fn optional_field_may_be_missing() {
        let payload = as_map(json!({}));
        let mut reader = FieldReader::new(&payload, false);

        assert_eq!(reader.optional_string("description"), None);
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn numbers_are_read_as_text() {
        let payload = as_map(json!({"name": 42}));
        let mut reader = FieldReader::new(&payload, false);

        assert_eq!(reader.string("name"), Some("42".to_owned()));
    }

    #[test]
    fn objects_are_not_text() {
        let payload = as_map(json!({"name": {"first": "a"}}));
        let mut reader = FieldReader::new(&payload, false);

        assert_eq!(reader.string("name"), None);
        assert_field_error(reader.finish(), "name", "Not a valid string.");
    }

    #[test]
    fn booleans_are_not_text() {
        let payload = as_map(json!({"name": true, "description": false}));
        let mut reader = FieldReader::new(&payload, false);

        assert_eq!(reader.string("name"), None);
        assert_eq!(reader.optional_string("description"), None);

        let Err(Error::Validation(errors)) = reader.finish() else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.get("name"), Some(&["Not a valid string.".to_owned()][..]));
        assert_eq!(
            errors.get("description"),
            Some(&["Not a valid string.".to_owned()][..])
        );
    }

    #[test]
    fn collects_errors_from_all_fields() {
        let payload = as_map(json!({"b": null}));
        let mut reader = FieldReader::new(&payload, false);

        reader.string("a");
        reader.string("b");
        reader.add_error("c", "Bad.");

        let Err(Error::Validation(errors)) = reader.finish() else {
            panic!("expected validation errors");
        };
        assert!(errors.get("a").is_some());
        assert!(errors.get("b").is_some());
        assert!(errors.get("c").is_some());
    }
}
