//! Basic usage example for SMS Sessions.
//!
//! Rents a number, polls it until a code arrives or the session expires,
//! and completes the activation.
//!
//! # Running
//!
//! ```bash
//! HERO_SMS_API_KEY=your_api_key cargo run --example basic_usage
//! ```
//!
//! Set `RUST_LOG=sms_sessions=debug` to see the session lifecycle.

use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
use sms_sessions::{PollStatus, SessionManager, SessionManagerConfig, SessionManagerTrait};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key =
        env::var("HERO_SMS_API_KEY").expect("HERO_SMS_API_KEY environment variable must be set");

    let client = HeroSms::with_api_key(api_key)?;
    let provider = HeroSmsProvider::new(client);

    // SMS_* variables override the defaults (mm in Brazil, 50s timeout)
    let config = SessionManagerConfig::from_env()?;
    let manager = SessionManager::builder(provider).config(config).build();

    println!("Balance: {}", manager.balance().await?);

    let handle = manager.acquire_default().await?;
    println!("Got phone number:");
    println!("  Session: {}", handle.session_id);
    println!("  Full number: {}", handle.full_number.with_plus_prefix());
    println!("  Number: {}", handle.phone_number);
    println!("  Price: {}", handle.price);

    println!("\nWaiting for SMS code...");
    loop {
        let report = manager.poll(&handle.session_id).await?;
        match report.status {
            PollStatus::CodeReceived => {
                if let Some(code) = report.code {
                    println!("Received SMS code #{}: {}", report.received_count, code);
                }
                break;
            }
            PollStatus::WaitingForCode | PollStatus::WaitingForNewCode => {}
            PollStatus::Cancelled => {
                println!("Activation was cancelled by the provider");
                return Ok(());
            }
            PollStatus::NotFound => {
                println!("Session expired without a code");
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    manager.finish(&handle.session_id).await;
    println!("\n{:?}", manager.stats());

    Ok(())
}
