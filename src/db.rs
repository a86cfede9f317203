//! Sets up the application's SQLite database.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{
    Connection, Transaction as SqlTransaction, TransactionBehavior, functions::FunctionFlags,
};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    transaction::create_transaction_table,
};

/// The SQL function that lowercases text with Unicode case rules, e.g.
/// `casefold('CRÈME') = 'crème'`. SQLite's own `lower` and `LIKE` only fold ASCII letters.
pub const CASEFOLD_FUNCTION: &str = "casefold";

/// Create the tables for the domain models if they do not exist.
///
/// Foreign key enforcement is switched on and [CASEFOLD_FUNCTION] is registered
/// for `connection`, so this should be called on every new connection before it is used.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.pragma_update(None, "foreign_keys", true)?;
    register_casefold(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn register_casefold(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.create_scalar_function(
        CASEFOLD_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
/// Returns an [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{CASEFOLD_FUNCTION, initialize};

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialization failed");
        initialize(&connection).expect("second initialization failed");
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let foreign_keys: bool = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();

        assert!(foreign_keys);
    }

    #[test]
    fn casefold_lowercases_non_ascii_letters() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let folded: String = connection
            .query_row(&format!("SELECT {CASEFOLD_FUNCTION}('Café CRÈME')"), [], |row| {
                row.get(0)
            })
            .unwrap();

        assert_eq!(folded, "café crème");
    }
}
