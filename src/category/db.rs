//! Database operations for categories.
//!
//! Every operation that reads or changes a category takes the ID of the
//! user that owns it. Categories owned by other users are treated as if
//! they do not exist.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategoryName] if the user already has a
/// category called `name`.
pub fn create_category(
    name: CategoryName,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO category (user_id, name, created_at) VALUES (?1, ?2, ?3);",
            (user_id.as_i64(), name.as_ref(), created_at),
        )
        .map_err(map_unique_violation)?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        created_at,
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, created_at FROM category WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's categories ordered alphabetically by name.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, created_at FROM category WHERE user_id = :user_id ORDER BY name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Get the ID of the user that owns a category.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no category has the ID `category_id`.
pub fn get_category_owner(category_id: CategoryId, connection: &Connection) -> Result<UserID, Error> {
    connection
        .query_row(
            "SELECT user_id FROM category WHERE id = ?1;",
            [category_id],
            |row| row.get(0).map(UserID::new),
        )
        .map_err(|error| error.into())
}

/// Rename a category owned by `user_id` and return the updated category.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the category does not exist or belongs to
/// another user, or [Error::DuplicateCategoryName] if the user has another
/// category called `new_name`.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1 WHERE id = ?2 AND user_id = ?3",
            (new_name.as_ref(), category_id, user_id.as_i64()),
        )
        .map_err(map_unique_violation)?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_category(category_id, user_id, connection)
}

/// Count the transactions that refer to a category.
pub fn count_category_transactions(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = ?1;",
            [category_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Delete a category owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the category does not exist or belongs to
/// another user, or [Error::CategoryInUse] if any transactions refer to it.
/// Nothing is deleted when an error is returned.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    get_category(category_id, user_id, &transaction)?;

    let transaction_count = count_category_transactions(category_id, &transaction)?;

    if transaction_count > 0 {
        return Err(Error::CategoryInUse(transaction_count));
    }

    transaction.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    transaction.commit()?;

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

fn map_unique_violation(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategoryName,
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let created_at = row.get(2)?;

    Ok(Category {
        id,
        name,
        created_at,
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::{User, UserID},
        category::{
            CategoryName, create_category, delete_category, get_all_categories, get_category,
            get_category_owner, update_category,
        },
        test_utils::{get_test_connection, insert_test_user},
        transaction::{Amount, Transaction, TransactionType, create_transaction},
    };

    use super::count_category_transactions;

    fn get_test_db() -> (Connection, User) {
        let connection = get_test_connection();
        let user = insert_test_user("alice", &connection);

        (connection, user)
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, user) = get_test_db();
        let name = CategoryName::new("Terrifically a category").unwrap();

        let category = create_category(name.clone(), user.id, &connection);

        let got_category = category.expect("Could not create category");
        assert!(got_category.id > 0);
        assert_eq!(got_category.name, name);
    }

    #[test]
    fn create_category_fails_on_duplicate_name() {
        let (connection, user) = get_test_db();
        create_category(CategoryName::new_unchecked("Food"), user.id, &connection).unwrap();

        let result = create_category(CategoryName::new_unchecked("Food"), user.id, &connection);

        assert_eq!(result, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn users_may_share_category_names() {
        let (connection, alice) = get_test_db();
        let bob = insert_test_user("bob", &connection);
        create_category(CategoryName::new_unchecked("Food"), alice.id, &connection).unwrap();

        let result = create_category(CategoryName::new_unchecked("Food"), bob.id, &connection);

        assert!(result.is_ok());
    }

    #[test]
    fn get_category_succeeds() {
        let (connection, user) = get_test_db();
        let inserted_category =
            create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();

        let selected_category = get_category(inserted_category.id, user.id, &connection);

        assert_eq!(Ok(inserted_category), selected_category);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let (connection, user) = get_test_db();
        let inserted_category =
            create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();

        let selected_category = get_category(inserted_category.id + 123, user.id, &connection);

        assert_eq!(selected_category, Err(Error::NotFound));
    }

    #[test]
    fn get_category_of_other_user_returns_not_found() {
        let (connection, alice) = get_test_db();
        let bob = insert_test_user("bob", &connection);
        let category =
            create_category(CategoryName::new_unchecked("Foo"), alice.id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, bob.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_category_owner(category.id, &connection), Ok(alice.id));
    }

    #[test]
    fn get_all_categories_is_ordered_by_name_and_scoped_to_user() {
        let (connection, alice) = get_test_db();
        let bob = insert_test_user("bob", &connection);
        let zoo = create_category(CategoryName::new_unchecked("Zoo"), alice.id, &connection)
            .unwrap();
        let bar = create_category(CategoryName::new_unchecked("Bar"), alice.id, &connection)
            .unwrap();
        create_category(CategoryName::new_unchecked("Baz"), bob.id, &connection).unwrap();

        let categories = get_all_categories(alice.id, &connection).unwrap();

        assert_eq!(categories, vec![bar, zoo]);
    }

    #[test]
    fn update_category_succeeds() {
        let (connection, user) = get_test_db();
        let category =
            create_category(CategoryName::new_unchecked("Original"), user.id, &connection)
                .unwrap();

        let new_name = CategoryName::new_unchecked("Updated");
        let updated_category =
            update_category(category.id, user.id, new_name.clone(), &connection).unwrap();

        assert_eq!(updated_category.name, new_name);
        assert_eq!(updated_category.id, category.id);
        assert_eq!(updated_category.created_at, category.created_at);
    }

    #[test]
    fn update_category_of_other_user_returns_not_found() {
        let (connection, alice) = get_test_db();
        let bob = insert_test_user("bob", &connection);
        let category =
            create_category(CategoryName::new_unchecked("Foo"), alice.id, &connection).unwrap();

        let result = update_category(
            category.id,
            bob.id,
            CategoryName::new_unchecked("Bar"),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(
            get_category(category.id, alice.id, &connection).unwrap().name,
            CategoryName::new_unchecked("Foo")
        );
    }

    #[test]
    fn update_category_fails_on_duplicate_name() {
        let (connection, user) = get_test_db();
        create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();
        let bar =
            create_category(CategoryName::new_unchecked("Bar"), user.id, &connection).unwrap();

        let result = update_category(
            bar.id,
            user.id,
            CategoryName::new_unchecked("Foo"),
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn delete_category_succeeds() {
        let (connection, user) = get_test_db();
        let category =
            create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();

        delete_category(category.id, user.id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, user.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_category_with_invalid_id_returns_not_found() {
        let (connection, user) = get_test_db();

        let result = delete_category(999999, user.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_category_of_other_user_returns_not_found() {
        let (connection, alice) = get_test_db();
        let bob = insert_test_user("bob", &connection);
        let category =
            create_category(CategoryName::new_unchecked("Foo"), alice.id, &connection).unwrap();

        let result = delete_category(category.id, bob.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
        assert!(get_category(category.id, alice.id, &connection).is_ok());
    }

    #[test]
    fn delete_category_in_use_fails() {
        let (connection, user) = get_test_db();
        let category =
            create_category(CategoryName::new_unchecked("Foo"), user.id, &connection).unwrap();
        let transaction = create_transaction(
            Transaction::build(
                category.id,
                date!(2024 - 01 - 15),
                TransactionType::Expense,
                Amount::from_cents(1250),
            ),
            user.id,
            &connection,
        )
        .unwrap();

        let result = delete_category(category.id, user.id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse(1)));
        assert_eq!(count_category_transactions(category.id, &connection), Ok(1));
        assert!(get_category(category.id, user.id, &connection).is_ok());
        assert!(transaction.id > 0);
    }

    #[test]
    fn category_owner_of_unknown_id_is_not_found() {
        let (connection, _) = get_test_db();

        assert_eq!(
            get_category_owner(42, &connection),
            Err::<UserID, Error>(Error::NotFound)
        );
    }
}
