//! Specifies how dates and timestamps are written to and read from JSON.
//!
//! Dates use the ISO 8601 calendar date format, e.g. "2024-01-15", and
//! timestamps use RFC 3339, e.g. "2024-01-15T09:30:00.5Z".

/// (De)serialize a [time::Date] as "YYYY-MM-DD".
pub mod date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    /// The calendar date format used by the API, e.g. "2024-01-15".
    pub const DATE_FORMAT: &[BorrowedFormatItem] =
        format_description!("[year]-[month repr:numerical padding:zero]-[day padding:zero]");

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// (De)serialize a [time::OffsetDateTime] as an RFC 3339 string.
pub mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(timestamp: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = timestamp
            .format(&Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::{Date, OffsetDateTime, macros::date, macros::datetime};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        #[serde(with = "super::date")]
        date: Date,
        #[serde(with = "super::timestamp")]
        created_at: OffsetDateTime,
    }

    #[test]
    fn serializes_date_and_timestamp() {
        let record = Record {
            date: date!(2024 - 01 - 05),
            created_at: datetime!(2024-01-05 00:00:00 UTC),
        };

        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"date":"2024-01-05","created_at":"2024-01-05T00:00:00Z"}"#
        );
    }

    #[test]
    fn deserializes_what_it_serializes() {
        let record = Record {
            date: date!(1999 - 12 - 31),
            created_at: datetime!(1999-12-31 23:59:59.5 UTC),
        };

        let json = serde_json::to_string(&record).unwrap();
        let got: Record = serde_json::from_str(&json).unwrap();

        assert_eq!(got, record);
    }
}
