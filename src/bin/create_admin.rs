use std::{error::Error, io, process::exit};

use clap::Parser;
use rusqlite::Connection;

use dealership_rs::{
    NewCustomer, PasswordHash, Role, ValidatedPassword, create_customer, initialize_db,
};

/// A utility for creating an admin account.
///
/// Registration through the API always creates customer accounts, so the
/// first admin has to be created with this tool.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// The admin's display name.
    #[arg(long)]
    name: String,

    /// The email address the admin logs in with.
    #[arg(long)]
    email: String,

    /// The admin's phone number.
    #[arg(long)]
    phone: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let password = match get_new_password_hash(&[&args.name, &args.email, &args.phone]) {
        Some(password) => password,
        None => return Ok(()),
    };

    let connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    let admin = match create_customer(
        NewCustomer {
            name: args.name,
            email: args.email,
            password,
            phone: args.phone,
            role: Role::Admin,
        },
        &connection,
    ) {
        Ok(admin) => admin,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    println!("Created admin {} with code {}", admin.email, admin.code);

    Ok(())
}

fn get_new_password_hash(user_inputs: &[&str]) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = read_password("Enter a password: ")?;

        let validated_password = match ValidatedPassword::new(&first_password, user_inputs) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = read_password("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
            }
        }
    }
}

/// Prompt for a password, returning `None` if stdin is closed or unreadable.
fn read_password(prompt: &str) -> Option<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
