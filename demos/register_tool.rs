//! Interactive registration tool.
//!
//! Asks for a phone number. Without a stored identity it requests a code
//! (by SMS or voice), asks for the received code and registers it. With a
//! stored identity it checks the existing credentials instead.
//!
//! # Running
//!
//! ```bash
//! WA_TABLES_DIR=./data WA_REQUEST_TOKEN=your_token cargo run --example register_tool
//! ```
//!
//! Optional variables: `WA_DATA_DIR` (identity directory, default `wadata`),
//! `WA_CARRIER` (carrier name for the network code) and `RUST_LOG`.

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wa_registration::{
    CodeMethod, Credentials, EventName, PhoneNumber, ReferenceTables, RegistrationClient,
    RegistrationConfig, RegistrationOutcome, StaticToken,
};

fn prompt(question: &str) -> io::Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_credentials(credentials: &Credentials) {
    println!("Your username is: {}", credentials.login);
    println!("Your password is: {}", credentials.expose_password());
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load variables from .env when present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("####################");
    println!("#                  #");
    println!("# WA Register Tool #");
    println!("#                  #");
    println!("####################");

    let tables_dir = env::var("WA_TABLES_DIR").unwrap_or_else(|_| "data".to_string());
    let token = env::var("WA_REQUEST_TOKEN")
        .map_err(|_| "WA_REQUEST_TOKEN environment variable must be set")?;

    let mut config = RegistrationConfig::default();
    if let Ok(data_dir) = env::var("WA_DATA_DIR") {
        config = config.with_data_dir(data_dir);
    }

    let number = prompt("Username (country code + number, do not use + or 00): ")?;
    let number = PhoneNumber::new(&number)
        .map_err(|_| "Wrong number. Do NOT use '+' or '00' before your number")?;

    std::fs::create_dir_all(&config.data_dir)?;
    let identity_exists = config.identity_store().exists(&number);

    let tables = Arc::new(ReferenceTables::load_dir(&tables_dir)?);
    let mut client =
        RegistrationClient::connect(number, tables, StaticToken::new(token), config)?;

    client.on(EventName::DissectPhone, |event| {
        println!("{event:?}");
    });

    if identity_exists {
        let credentials = client.check_credentials().await?;
        print_credentials(&credentials);
        return Ok(());
    }

    let method: CodeMethod = prompt("\nType sms or voice: ")?.parse()?;
    let carrier = env::var("WA_CARRIER").ok();

    match client.request_code(method, carrier.as_deref(), None).await? {
        RegistrationOutcome::AlreadyRegistered(Some(credentials)) => {
            print_credentials(&credentials);
        }
        RegistrationOutcome::AlreadyRegistered(None) => {
            println!("The number is already registered.");
        }
        RegistrationOutcome::CodeSent { length, method } => {
            match length {
                Some(length) => println!("A {length}-digit code was sent by {method}."),
                None => println!("A code was sent by {method}."),
            }
            let code = prompt("\nEnter the received code: ")?;
            let credentials = client.register_code(code).await?;
            print_credentials(&credentials);
        }
    }

    Ok(())
}
