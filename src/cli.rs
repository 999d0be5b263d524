use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;

use cookie_persist::config::Config;
use cookie_persist::jar::HttpCookieJar;
use cookie_persist::storage::{CookieStorage, StorageError};

#[derive(Parser, Debug)]
#[command(name = "cookie-persist")]
#[command(about = "Cookie-backed storage for persisted application state", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Decode the stored entries out of a `Cookie` header
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (overrides `server.bind_addr`)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Raw `Cookie` header value, e.g. `reduxPersistIndex=%5B%22root%22%5D; root=...`
    #[arg(long)]
    pub cookie: String,
}

/// Print every indexed entry of `cookie` as a JSON object
pub async fn inspect(config: &Config, cookie: &str) -> Result<(), StorageError> {
    let jar = Arc::new(HttpCookieJar::from_cookie_header(cookie));
    let storage = CookieStorage::from_settings(jar, &config.storage);

    let mut entries = Map::new();
    for key in storage.get_all_keys().await? {
        let value = storage.get_item(&key).await?;
        entries.insert(key, value.map(Value::String).unwrap_or(Value::Null));
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(entries))?);
    Ok(())
}
