use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use time::{Duration, OffsetDateTime};

use finance_tracker::{Transaction, TransactionStore, TransactionType, open_store, setup_logging};

/// A utility for creating a test database for the finance tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many transactions to create.
    #[arg(long, short, default_value_t = 30)]
    count: u32,
}

const SAMPLE_TRANSACTIONS: [(f64, &str, &str, TransactionType); 6] = [
    (2500.0, "Salary", "Work", TransactionType::Income),
    (42.5, "Groceries", "Food", TransactionType::Expense),
    (12.0, "Lunch", "Food", TransactionType::Expense),
    (350.0, "Rent", "Home", TransactionType::Expense),
    (80.0, "Power bill", "Utilities", TransactionType::Expense),
    (150.0, "Freelance work", "Work", TransactionType::Income),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

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
    let store = open_store(output_path)?;

    println!("Creating {} test transactions...", args.count);
    let now = OffsetDateTime::now_utc();
    for (i, (amount, description, category, transaction_type)) in
        SAMPLE_TRANSACTIONS.iter().cycle().take(args.count as usize).enumerate()
    {
        let builder = Transaction::build(*amount, description, category, *transaction_type)
            .date(now - Duration::days(i as i64))
            .recurring(matches!(*description, "Salary" | "Rent"));

        store.insert(builder)?;
    }

    println!(
        "Total income: {:.2}, total expense: {:.2}",
        store.total_by_type(TransactionType::Income)?,
        store.total_by_type(TransactionType::Expense)?
    );
    println!("Success!");

    Ok(())
}
