//! Filtering, sorting and searching of a user's transactions.
//!
//! The query string parameters are:
//! - `type`: `income` or `expense`, other values are ignored.
//! - `category`: a category ID made of ASCII digits, other values are ignored.
//! - `month`: a month in the form `YYYY-MM`, invalid values are rejected.
//! - `sort`: one of `date_desc`, `date_asc`, `amount_desc` or `amount_asc`,
//!   invalid values are rejected.
//! - `q`: text to search for in the description, ignoring case.

use std::str::FromStr;

use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use crate::{
    Error,
    auth::UserID,
    category::CategoryId,
    db::CASEFOLD_FUNCTION,
    error::ValidationErrors,
    transaction::{Transaction, TransactionType, core::TRANSACTION_COLUMNS, map_transaction_row},
};

const INVALID_MONTH_MESSAGE: &str = "Invalid format. Use YYYY-MM.";
const INVALID_SORT_MESSAGE: &str = "Invalid sort.";

/// The raw query string parameters for listing transactions.
///
/// Built from the query string pairs, where the last value of a repeated
/// parameter wins and unknown parameters are ignored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionQueryParams {
    /// Only include income or expenses.
    pub transaction_type: Option<String>,
    /// Only include transactions in this category.
    pub category: Option<String>,
    /// Only include transactions in this month, e.g. "2024-01".
    pub month: Option<String>,
    /// The order to list transactions in.
    pub sort: Option<String>,
    /// Only include transactions whose description contains this text.
    pub q: Option<String>,
}

impl FromIterator<(String, String)> for TransactionQueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut params = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "type" => params.transaction_type = Some(value),
                "category" => params.category = Some(value),
                "month" => params.month = Some(value),
                "sort" => params.sort = Some(value),
                "q" => params.q = Some(value),
                _ => {}
            }
        }

        params
    }
}

impl TransactionQueryParams {
    /// The filters that are applied without validation.
    ///
    /// Values that cannot be understood are ignored. `month` is not included.
    pub fn lenient_filter(&self) -> TransactionFilter {
        let transaction_type = self
            .transaction_type
            .as_deref()
            .and_then(|raw| raw.parse().ok());

        let category_id = self
            .category
            .as_deref()
            .filter(|raw| !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit()))
            .and_then(|raw| raw.parse().ok());

        let search = self.q.clone().filter(|q| !q.is_empty());

        TransactionFilter {
            transaction_type,
            category_id,
            month: None,
            search,
        }
    }

    /// The filters and sort order for listing transactions.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] on the field `month` if the month is not
    /// a valid `YYYY-MM` month, otherwise on the field `sort` if the sort
    /// order is unknown.
    pub fn list_query(&self) -> Result<(TransactionFilter, Option<SortOrder>), Error> {
        let mut filter = self.lenient_filter();

        if let Some(raw_month) = &self.month {
            let month = raw_month.parse::<YearMonth>().map_err(|_| {
                Error::Validation(ValidationErrors::single("month", INVALID_MONTH_MESSAGE))
            })?;
            filter.month = Some(month);
        }

        let sort = match &self.sort {
            Some(raw_sort) => Some(raw_sort.parse::<SortOrder>().map_err(|_| {
                Error::Validation(ValidationErrors::single("sort", INVALID_SORT_MESSAGE))
            })?),
            None => None,
        };

        Ok((filter, sort))
    }
}

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    /// The year, which may be any integer.
    pub year: i64,
    /// The month in the range 1 to 12.
    pub month: u8,
}

impl FromStr for YearMonth {
    type Err = ();

    /// Parse a month from text such as "2024-01".
    ///
    /// The text is split on the first hyphen and both parts are read as
    /// integers, allowing surrounding whitespace and a leading sign.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (raw_year, raw_month) = s.split_once('-').ok_or(())?;
        let year = raw_year.trim().parse::<i64>().map_err(|_| ())?;
        let month = raw_month.trim().parse::<i64>().map_err(|_| ())?;

        if !(1..=12).contains(&month) {
            return Err(());
        }

        Ok(Self {
            year,
            month: month as u8,
        })
    }
}

/// The order to list transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first.
    DateDescending,
    /// Oldest first.
    DateAscending,
    /// Largest amount first.
    AmountDescending,
    /// Smallest amount first.
    AmountAscending,
}

impl SortOrder {
    fn order_clause(&self) -> &'static str {
        match self {
            SortOrder::DateDescending => "ORDER BY t.date DESC",
            SortOrder::DateAscending => "ORDER BY t.date ASC",
            SortOrder::AmountDescending => "ORDER BY t.amount DESC",
            SortOrder::AmountAscending => "ORDER BY t.amount ASC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_desc" => Ok(SortOrder::DateDescending),
            "date_asc" => Ok(SortOrder::DateAscending),
            "amount_desc" => Ok(SortOrder::AmountDescending),
            "amount_asc" => Ok(SortOrder::AmountAscending),
            _ => Err(()),
        }
    }
}

/// Restrictions on which of a user's transactions to include.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only include income or expenses.
    pub transaction_type: Option<TransactionType>,
    /// Only include transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Only include transactions in this month.
    pub month: Option<YearMonth>,
    /// Only include transactions whose description contains this text, ignoring case.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Build the WHERE clause and its parameters for the transactions of `user_id`.
    fn where_clause(&self, user_id: UserID) -> (String, Vec<SqlValue>) {
        let mut conditions = vec!["t.user_id = ?".to_owned()];
        let mut params = vec![SqlValue::Integer(user_id.as_i64())];

        if let Some(transaction_type) = self.transaction_type {
            conditions.push("t.type = ?".to_owned());
            params.push(SqlValue::Text(transaction_type.as_str().to_owned()));
        }

        if let Some(category_id) = self.category_id {
            conditions.push("t.category_id = ?".to_owned());
            params.push(SqlValue::Integer(category_id));
        }

        if let Some(YearMonth { year, month }) = self.month {
            conditions.push(
                "CAST(strftime('%Y', t.date) AS INTEGER) = ? \
                AND CAST(strftime('%m', t.date) AS INTEGER) = ?"
                    .to_owned(),
            );
            params.push(SqlValue::Integer(year));
            params.push(SqlValue::Integer(month.into()));
        }

        if let Some(search) = &self.search {
            conditions.push(format!(
                "instr({CASEFOLD_FUNCTION}(t.description), {CASEFOLD_FUNCTION}(?)) > 0"
            ));
            params.push(SqlValue::Text(search.clone()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Get the transactions of `user_id` that match `filter`.
///
/// Transactions are ordered by `sort`, or by date and then ID if `sort` is `None`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    sort: Option<SortOrder>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, params) = filter.where_clause(user_id);
    let order_clause = sort
        .map(|sort| sort.order_clause())
        .unwrap_or("ORDER BY t.date ASC, t.id ASC");

    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t \
        INNER JOIN category c ON t.category_id = c.id \
        {where_clause} {order_clause}"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get the distinct months, as "YYYY-MM", of the transactions of `user_id`
/// that match `filter`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_transaction_months(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    let (where_clause, params) = filter.where_clause(user_id);

    let query = format!(
        "SELECT DISTINCT strftime('%Y-%m', t.date) AS month FROM \"transaction\" t \
        {where_clause} ORDER BY month DESC"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| row.get(0))?
        .map(|month_result| month_result.map_err(Error::from))
        .collect()
}
