//! Prints a bcrypt hash for the env-credential admin fallback.
//!
//! Usage: `hash-password <PASSWORD>` or pipe the password on stdin.

use bcrypt::{hash, DEFAULT_COST};
use std::io::{self, BufRead};

const MIN_PASSWORD_LEN: usize = 8;

fn read_password() -> io::Result<String> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg);
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() {
    let password = match read_password() {
        Ok(p) if !p.is_empty() => p,
        Ok(_) => {
            eprintln!("Usage: hash-password <PASSWORD>  (or pass it on stdin)");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to read password: {}", e);
            std::process::exit(1);
        }
    };

    if password.len() < MIN_PASSWORD_LEN {
        eprintln!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        );
        std::process::exit(1);
    }

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("Cost : {}", DEFAULT_COST);
            println!("Hash : {}\n", hashed);
            println!("# Add to .env to enable admin login without a database:");
            println!("ADMIN_USERNAME=poet");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
