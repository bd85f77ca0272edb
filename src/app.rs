//! Application context - The explicitly constructed gateway every operation runs
//! against.
//!
//! `main` builds one [`AppContext`] at startup and closes it at shutdown. Tests build
//! their own over an in-memory database instead of sharing a global handle.

use crate::{
    config::{
        ClubConfig,
        database::{create_connection, create_tables},
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// Database connection plus club settings.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Open connection to the data store
    pub database: DatabaseConnection,
    /// Club settings loaded at startup
    pub club: ClubConfig,
}

impl AppContext {
    /// Connects to `database_url` and makes sure every table exists.
    #[instrument(skip(club))]
    pub async fn connect(database_url: &str, club: ClubConfig) -> Result<Self> {
        let database = create_connection(database_url).await?;
        create_tables(&database).await?;
        info!(club = %club.name, "Application context ready");
        Ok(Self { database, club })
    }

    /// Wraps an existing connection, e.g. one opened by a test.
    #[must_use]
    pub const fn new(database: DatabaseConnection, club: ClubConfig) -> Self {
        Self { database, club }
    }

    /// The store handle passed to the `core` operations.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.database
    }

    /// Closes the database connection.
    pub async fn close(self) -> Result<()> {
        self.database.close().await?;
        info!("Database connection closed");
        Ok(())
    }
}
