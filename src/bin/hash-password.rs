//! Prints a bcrypt hash in the format stored on user records, for seeding an
//! admin account directly in MongoDB.

use bcrypt::{hash, verify, DEFAULT_COST};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(password) = args.next() else {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
        return ExitCode::FAILURE;
    };
    let cost = match args.next().map(|c| c.parse::<u32>()) {
        None => DEFAULT_COST,
        Some(Ok(c)) if (4..=31).contains(&c) => c,
        Some(_) => {
            eprintln!("COST must be a number between 4 and 31");
            return ExitCode::FAILURE;
        }
    };

    if password.chars().count() < 8 {
        eprintln!("Warning: the admin API rejects passwords shorter than 8 characters");
    }

    let hashed = match hash(&password, cost) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !matches!(verify(&password, &hashed), Ok(true)) {
        eprintln!("Generated hash did not verify");
        return ExitCode::FAILURE;
    }

    println!("Cost : {}", cost);
    println!("Hash : {}", hashed);
    println!();
    println!("# Insert into the users collection, e.g. with mongosh:");
    println!(
        "db.users.insertOne({{ username: \"admin\", email: \"admin@example.com\", password: \"{}\", role: \"admin\", createdAt: new Date() }})",
        hashed
    );
    ExitCode::SUCCESS
}
