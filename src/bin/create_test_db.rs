use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month};

use fintrack_rs::{
    Amount, CategoryName, PasswordHash, Transaction, TransactionType, Username, ValidatedPassword,
    create_category, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the JSON API server of fintrack_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let transaction = conn.transaction()?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new("test1234")?,
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(Username::new("test")?, password_hash, &transaction)?;

    println!("Creating categories and transactions...");

    let salary = create_category(CategoryName::new("Salary")?, user.id, &transaction)?;
    let groceries = create_category(CategoryName::new("Groceries")?, user.id, &transaction)?;
    let rent = create_category(CategoryName::new("Rent")?, user.id, &transaction)?;

    for month in [Month::November, Month::December] {
        let year = 2023;
        create_transaction(
            Transaction::build(
                salary.id,
                Date::from_calendar_date(year, month, 1)?,
                TransactionType::Income,
                Amount::from_cents(520_000),
            )
            .description("Monthly pay"),
            user.id,
            &transaction,
        )?;
        create_transaction(
            Transaction::build(
                rent.id,
                Date::from_calendar_date(year, month, 3)?,
                TransactionType::Expense,
                Amount::from_cents(180_000),
            )
            .description("Rent"),
            user.id,
            &transaction,
        )?;
    }

    for (day, cents, description) in [
        (6, 8_245, "Supermarket"),
        (13, 2_350, "Farmers market"),
        (20, 11_090, "Supermarket"),
    ] {
        create_transaction(
            Transaction::build(
                groceries.id,
                Date::from_calendar_date(2024, Month::January, day)?,
                TransactionType::Expense,
                Amount::from_cents(cents),
            )
            .description(description),
            user.id,
            &transaction,
        )?;
    }

    transaction.commit()?;

    println!("Success! Log in with the username \"test\" and the password \"test1234\".");

    Ok(())
}
