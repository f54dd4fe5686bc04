//! Example demonstrating retry callbacks.
//!
//! Wraps the provider with `SmsRetryableProvider` and counts the retries it
//! performs while the session manager works. Balance, price and code polls
//! are retried; acquisitions and status pushes are not.
//!
//! # Running
//!
//! ```bash
//! HERO_SMS_API_KEY=your_api_key cargo run --example retry_callbacks
//! ```

use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
use sms_sessions::{
    CountryId, PollStatus, RetryConfig, Service, SessionManager, SessionManagerConfig,
    SessionManagerTrait, SmsRetryableProvider,
};
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
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

    let retry_count = Arc::new(AtomicU32::new(0));
    let retry_count_clone = Arc::clone(&retry_count);

    let retry_config = RetryConfig::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(10))
        .with_max_retries(5);

    let retryable_provider = SmsRetryableProvider::with_config(provider, retry_config)
        .with_on_retry(move |error, duration| {
            let count = retry_count_clone.fetch_add(1, Ordering::SeqCst) + 1;
            println!(
                "[RETRY #{}] Error: {} | Next retry in: {:.1}s",
                count,
                error,
                duration.as_secs_f64()
            );
        });

    // Short session timeout so an idle number is released quickly
    let manager = SessionManager::new(retryable_provider, SessionManagerConfig::fast());

    let service = Service::Whatsapp;
    let country = CountryId::new(73);
    let price = manager.get_price(&service, country).await;
    println!("Price for {} in {}: {}", service, country, price);

    match manager.acquire(&service, country).await {
        Ok(handle) => {
            println!("\nGot phone number: {}", handle.full_number.with_plus_prefix());
            println!("Session: {}", handle.session_id);

            loop {
                match manager.poll(&handle.session_id).await {
                    Ok(report) if report.status == PollStatus::CodeReceived => {
                        if let Some(code) = report.code {
                            println!("\nReceived SMS code: {}", code);
                        }
                        manager.finish(&handle.session_id).await;
                        break;
                    }
                    Ok(report)
                        if matches!(
                            report.status,
                            PollStatus::NotFound | PollStatus::Cancelled
                        ) =>
                    {
                        println!("\nSession ended without a code ({:?})", report.status);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => println!("Poll failed: {}", e),
                }
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
        Err(e) => {
            println!("\nFailed to get phone number: {}", e);
        }
    }

    println!("\n=== Summary ===");
    println!("Total retry attempts: {}", retry_count.load(Ordering::SeqCst));
    println!("{:?}", manager.stats());

    Ok(())
}
