//! Monarch Money MCP server entry point.
//!
//! Loads configuration from the environment (and an optional `.env` file),
//! then serves MCP tools over stdio. The Monarch client is built lazily from
//! the stored session on the first tool call that needs it.
//!
//! `monarch-mcp import-token` reads an API token from stdin and stores it
//! as the session instead of serving.

mod adapter;
mod api;
mod bridge;
mod config;
mod error;
mod graphql;
mod models;
mod params;
mod response;
mod server;
mod session;
#[cfg(test)]
mod testing;
mod tools;

use chrono::Utc;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use crate::bridge::AuthBridge;
use crate::config::Config;
use crate::graphql::GraphqlConnector;
use crate::server::MonarchMcpServer;
use crate::session::{Session, SessionStore};

/// Subcommand that stores a token read from stdin.
const IMPORT_TOKEN_COMMAND: &str = "import-token";

/// Reads a token from stdin and saves it as the session.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the token cannot be saved.
fn import_token(store: &SessionStore) -> Result<(), Box<dyn core::error::Error>> {
    tracing::info!("reading API token from stdin");
    let input = std::io::read_to_string(std::io::stdin())?;
    save_token(store, &input)
}

/// Saves the trimmed `input` as a new session and checks that it reads back.
///
/// # Errors
///
/// Returns an error if the token is empty, or the session file cannot be
/// written or read back.
fn save_token(store: &SessionStore, input: &str) -> Result<(), Box<dyn core::error::Error>> {
    let token = input.trim();
    if token.is_empty() {
        return Err("no token on stdin; pipe the token copied from the Monarch web app".into());
    }
    store.save(&Session::new(token.to_owned(), Utc::now()))?;
    if !store.exists() {
        return Err(format!(
            "session written to {} could not be read back",
            store.path().display()
        )
        .into());
    }
    tracing::info!(path = %store.path().display(), "token imported");
    Ok(())
}

/// Runs the MCP server, or the `import-token` subcommand.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the subcommand is
/// unknown or fails, or the stdio transport encounters an error.
async fn run() -> Result<(), Box<dyn core::error::Error>> {
    // A missing .env file is fine.
    let _env_file = dotenvy::dotenv().ok();

    // Initialise tracing to stderr (stdout is used for MCP stdio transport).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let store = SessionStore::new(config.session_path.clone());

    match std::env::args().nth(1).as_deref() {
        None => {}
        Some(IMPORT_TOKEN_COMMAND) => return import_token(&store),
        Some(other) => {
            return Err(
                format!("unknown command '{other}'; expected no command or {IMPORT_TOKEN_COMMAND}")
                    .into(),
            );
        }
    }

    tracing::info!(
        session = %config.session_path.display(),
        api_url = %config.api_url,
        "starting Monarch Money MCP server"
    );

    // Create MCP server and serve over stdio.
    let bridge = AuthBridge::new(store, Box::new(GraphqlConnector::from_config(&config)));
    let mcp_server = MonarchMcpServer::new(bridge, config.email);
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = mcp_server.serve(transport).await?;

    tracing::info!("MCP server running on stdio");
    let _quit_reason = service.waiting().await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(%err, "fatal error");
        std::process::exit(1);
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use secrecy::ExposeSecret;

    use super::save_token;
    use crate::session::SessionStore;

    #[test]
    fn imported_token_is_trimmed_and_readable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        save_token(&store, "  tok_123\n").expect("token should save");

        assert!(store.exists());
        let session = store.load().expect("session should load");
        assert_eq!(session.token().expose_secret(), "tok_123");
    }

    #[test]
    fn blank_token_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().join("session.json"));

        let err = save_token(&store, " \n ").expect_err("blank token should fail");
        assert!(err.to_string().contains("no token"));
        assert!(!store.exists());
    }
}
