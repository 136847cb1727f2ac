use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use expense_tracker::{
    PasswordHash, ValidatedPassword,
    category::{CategoryName, create_category},
    expense::{Amount, ExpenseData, ExpenseType, create_expense},
    initialize_db,
    user::{Username, create_user, parse_email},
};

/// A utility for creating a test database for the REST API server of expense_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// The number of days of transactions to generate, counting back from today.
const DAYS_OF_DATA: i64 = 60;

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user...");

    let password_hash =
        PasswordHash::new(ValidatedPassword::new("test")?, PasswordHash::DEFAULT_PARAMS)?;
    let user = create_user(
        Username::new("test")?,
        parse_email("test@example.com")?,
        password_hash,
        &connection,
    )?;

    println!("Creating categories...");

    let mut categories = Vec::new();
    for name in ["Food", "Rent", "Transport", "Salary"] {
        categories.push(create_category(CategoryName::new(name)?, user.id, &connection)?);
    }
    let [food, rent, transport, salary] = [
        categories[0].id,
        categories[1].id,
        categories[2].id,
        categories[3].id,
    ];

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc();
    let mut count = 0;
    for days_ago in 0..DAYS_OF_DATA {
        let date = today - Duration::days(days_ago);

        let mut add = |cents: i64, description: &str, expense_type, category_id| {
            count += 1;
            create_expense(
                ExpenseData {
                    amount: Amount::from_cents(cents),
                    description: description.to_owned(),
                    date: Some(date),
                    expense_type,
                    category_id,
                },
                user.id,
                &connection,
            )
        };

        add(1250 + days_ago * 17 % 900, "Lunch", ExpenseType::Expense, food)?;

        if days_ago % 3 == 0 {
            add(450, "Bus fare", ExpenseType::Expense, transport)?;
        }

        if days_ago % 14 == 0 {
            add(250_000, "Salary", ExpenseType::Income, salary)?;
        }

        if days_ago % 30 == 0 {
            add(165_000, "Rent", ExpenseType::Expense, rent)?;
        }
    }

    println!(
        "Created {count} transactions totalling {} in expenses.",
        total_expenses(&connection)?
    );
    println!("Success! Log in with the username 'test' and password 'test'.");

    Ok(())
}

fn total_expenses(connection: &Connection) -> Result<Decimal, rusqlite::Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expense WHERE type = 'expense'",
        [],
        |row| row.get(0),
    )?;

    Ok(Amount::from_cents(cents).to_decimal())
}
