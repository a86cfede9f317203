//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName},
    database_id::DatabaseId,
    transaction::Amount,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money was earned.
    Income,
    /// Money was spent.
    Expense,
}

impl TransactionType {
    /// The name of the type as used in JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    /// Parse the exact, lowercase name of a transaction type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("\"{other}\" is not a valid choice.")),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An income or expense recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(with = "crate::serde_format::date")]
    pub date: Date,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money earned or spent.
    pub amount: Amount,
    /// A text description of what the transaction was for. May be empty.
    pub description: String,
    /// The category the transaction belongs to.
    pub category: Category,
    /// When the transaction was recorded.
    #[serde(with = "crate::serde_format::timestamp")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        category_id: CategoryId,
        date: Date,
        transaction_type: TransactionType,
        amount: Amount,
    ) -> TransactionBuilder {
        TransactionBuilder {
            category_id,
            date,
            transaction_type,
            amount,
            description: String::new(),
        }
    }
}

/// The fields of a transaction that a user sets when creating or updating it.
///
/// The description defaults to an empty string.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Amount, Transaction, TransactionType};
///
/// let builder = Transaction::build(
///         category.id,
///         date!(2025-01-15),
///         TransactionType::Expense,
///         Amount::from_cents(4599),
///     )
///     .description("Coffee shop purchase");
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The category of the transaction. Must belong to the same user as the transaction.
    pub category_id: CategoryId,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
    /// The amount of money, always positive for well-behaved clients.
    pub amount: Amount,
    /// A human-readable description of at most 200 characters.
    pub description: String,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

impl From<&Transaction> for TransactionBuilder {
    fn from(transaction: &Transaction) -> Self {
        Self {
            category_id: transaction.category.id,
            date: transaction.date,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            description: transaction.description.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns read by [map_transaction_row], for a query on `"transaction" t`
/// joined with `category c`.
pub(crate) const TRANSACTION_COLUMNS: &str = "t.id, t.date, t.type, t.amount, t.description, \
    t.created_at, c.id, c.name, c.created_at";

/// Create a new transaction owned by `user_id` from a builder.
///
/// The caller should check that the category belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id: TransactionId = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, category_id, date, type, amount, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.category_id,
                builder.date,
                builder.transaction_type,
                builder.amount.cents(),
                builder.description,
                OffsetDateTime::now_utc(),
            ),
            |row| row.get(0),
        )
        .map_err(map_foreign_key_violation)?;

    get_transaction(id, user_id, connection)
}

/// Retrieve a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t \
            INNER JOIN category c ON t.category_id = c.id \
            WHERE t.id = :id AND t.user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Replace the fields of a transaction owned by `user_id`.
///
/// The caller should check that the category belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
             SET category_id = ?1, date = ?2, type = ?3, amount = ?4, description = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                builder.category_id,
                builder.date,
                builder.transaction_type,
                builder.amount.cents(),
                builder.description,
                id,
                user_id.as_i64(),
            ),
        )
        .map_err(map_foreign_key_violation)?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(id, user_id, connection)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            amount INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

fn map_foreign_key_violation(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::NotFound,
        error => error.into(),
    }
}

/// Map a database row selected with [TRANSACTION_COLUMNS] to a Transaction.
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let date = row.get(1)?;
    let transaction_type = row.get(2)?;
    let amount = Amount::from_cents(row.get(3)?);
    let description = row.get(4)?;
    let created_at = row.get(5)?;
    let category_id = row.get(6)?;
    let raw_category_name: String = row.get(7)?;
    let category_created_at = row.get(8)?;

    Ok(Transaction {
        id,
        date,
        transaction_type,
        amount,
        description,
        category: Category {
            id: category_id,
            name: CategoryName::new_unchecked(&raw_category_name),
            created_at: category_created_at,
        },
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod transaction_type_tests {
    use super::TransactionType;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("income".parse(), Ok(TransactionType::Income));
        assert_eq!("expense".parse(), Ok(TransactionType::Expense));
        assert_eq!(
            "Income".parse::<TransactionType>(),
            Err("\"Income\" is not a valid choice.".to_owned())
        );
    }
}
