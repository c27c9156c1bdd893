//! Process-wide MongoDB connection handling.

use anyhow::{Context, Result};
use bson::doc;
use mongodb::{Client, Database};
use tokio::sync::OnceCell;

static CLIENT: OnceCell<Client> = OnceCell::const_new();

/// Name of the database used when the connection string doesn't name one.
const DEFAULT_DATABASE: &str = "chat";

/// Returns the shared MongoDB client, connecting on first use.
///
/// Concurrent first callers all await the same in-flight connection
/// attempt rather than racing to open duplicate connections. A failed
/// attempt leaves the cell empty so a later request can retry.
pub async fn shared_client(uri: &str) -> Result<&'static Client> {
    CLIENT
        .get_or_try_init(|| async {
            let client = Client::with_uri_str(uri)
                .await
                .context("Invalid MongoDB connection string")?;
            // `with_uri_str` doesn't touch the network. Ping so an
            // unreachable server fails here instead of on the first query.
            client
                .database("admin")
                .run_command(doc! {"ping": 1})
                .await
                .context("MongoDB server unreachable")?;
            Ok(client)
        })
        .await
}

/// Returns the database named by the connection string, falling back to
/// [`DEFAULT_DATABASE`].
pub async fn shared_db(uri: &str) -> Result<Database> {
    let client = shared_client(uri).await?;
    Ok(client
        .default_database()
        .unwrap_or_else(|| client.database(DEFAULT_DATABASE)))
}
