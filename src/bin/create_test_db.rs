use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use pocketbook::{
    AccountForm, Frequency, NewTransaction, PasswordHash, Username, ValidatedPassword,
    create_account, create_transaction, create_user, get_categories, initialize_db,
};

/// A utility for creating a test database for the pocketbook server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_PASSWORD: &str = "test";

/// Amount, category name, days ago, description and frequency.
const SAMPLE_TRANSACTIONS: [(f64, Option<&str>, i64, &str, Frequency); 7] = [
    (3200.0, Some("Salary"), 28, "Monthly pay", Frequency::Monthly),
    (-1450.0, Some("Housing"), 27, "Rent", Frequency::Monthly),
    (-182.35, Some("Food & Groceries"), 20, "Weekly shop", Frequency::Weekly),
    (-64.9, Some("Food & Groceries"), 13, "Farmers market", Frequency::None),
    (-45.0, Some("Entertainment"), 9, "Concert tickets", Frequency::None),
    (150.0, Some("Gifts"), 5, "Birthday money", Frequency::None),
    (-12.5, None, 1, "Parking", Frequency::None),
];

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
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users 'admin' and 'user' with the password '{TEST_PASSWORD}'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;

    create_user(&Username::new("admin")?, password_hash.clone(), true, &conn)?;
    let user = create_user(&Username::new("user")?, password_hash, false, &conn)?;

    println!("Creating accounts...");

    let everyday = create_account(
        user.id,
        &AccountForm {
            name: "Everyday".to_owned(),
            balance: 1250.0,
            currency_id: 1,
            account_type_id: 1,
        },
        &conn,
    )?;
    create_account(
        user.id,
        &AccountForm {
            name: "Rainy Day".to_owned(),
            balance: 8000.0,
            currency_id: 1,
            account_type_id: 2,
        },
        &conn,
    )?;

    println!("Creating transactions...");

    let categories = get_categories(&conn)?;
    let today = OffsetDateTime::now_utc().date();

    for (amount, category_name, days_ago, description, frequency) in SAMPLE_TRANSACTIONS {
        let category_id = category_name.and_then(|name| {
            categories
                .iter()
                .find(|category| category.name == name)
                .map(|category| category.id)
        });

        create_transaction(
            everyday.id,
            user.id,
            &NewTransaction {
                amount,
                category_id,
                date: today - Duration::days(days_ago),
                description: description.to_owned(),
                frequency,
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
