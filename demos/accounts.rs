//! Creates, fetches and deletes one account against a running accounts API.
//!
//! ```text
//! ACCOUNTAPI_BASE_URL=http://localhost:8080 RUST_LOG=accountapi=debug \
//!     cargo run --example accounts
//! ```

use std::time::Duration;

use accountapi::prelude::{AccountAttributes, AccountData, CallContext, Client, Error};
use accountapi::DEFAULT_BASE_URL;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("accountapi=info")),
        )
        .init();

    let base_url =
        std::env::var("ACCOUNTAPI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
    let client = Client::builder()
        .base_url(base_url)
        .max_attempts(5)
        .request_timeout(Duration::from_secs(5))
        .try_build()?;
    let context = CallContext::new().with_timeout(Duration::from_secs(30));

    let account = AccountData {
        id: "ad27e265-9605-4b4b-a0e5-3003ea9cc4dc".to_owned(),
        organisation_id: "eb0bd6f5-c3f5-44b2-b677-acd23cdde73c".to_owned(),
        kind: "accounts".to_owned(),
        attributes: Some(AccountAttributes {
            country: Some("GB".to_owned()),
            base_currency: "GBP".to_owned(),
            bank_id: "400300".to_owned(),
            bank_id_code: "GBDSC".to_owned(),
            bic: "NWBKGB22".to_owned(),
            name: vec!["Samantha Holder".to_owned()],
            ..AccountAttributes::default()
        }),
        version: None,
    };

    let created = match client.create_account(&context, account).await {
        Ok(created) => created,
        Err(error @ Error::Conflict(_)) => {
            println!("account already exists: {error}");
            client
                .fetch_account(&context, "ad27e265-9605-4b4b-a0e5-3003ea9cc4dc")
                .await?
        }
        Err(error) => return Err(error.into()),
    };
    println!("created account id={} version={:?}", created.id, created.version);

    let fetched = client.fetch_account(&context, &created.id).await?;
    println!("fetched account {fetched:#?}");

    client
        .delete_account(&context, &fetched.id, fetched.version.unwrap_or_default())
        .await?;
    println!("deleted account id={}", fetched.id);
    Ok(())
}
