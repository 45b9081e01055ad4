use crate::config::MysqlConfig;
use crate::errors::Result;
use crate::model::Sample;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{error, info, warn};

const DEFAULT_PORT: u16 = 3306;

/// Destination for extracted samples.
pub trait Sink {
    async fn store(&self, sample: &Sample) -> Result<()>;
}

/// Appends one row per sample to a pre-existing MySQL table.
///
/// A fresh connection is opened for every call and closed before returning.
pub struct MySqlSink {
    options: MySqlConnectOptions,
    host: String,
    target: String,
    insert: String,
}

impl MySqlSink {
    pub fn new(config: &MysqlConfig) -> Self {
        let (host, port) = split_host_port(&config.server);
        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        Self {
            options,
            host: config.server.clone(),
            target: format!("{}/{}", config.database, config.table),
            insert: insert_statement(&config.table),
        }
    }

    async fn insert(&self, conn: &mut MySqlConnection, sample: &Sample) -> Result<()> {
        let mut tx = conn.begin().await?;

        sqlx::query(&self.insert)
            .bind(sample.current_power)
            .bind(sample.today_energy)
            .bind(sample.total_energy)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl Sink for MySqlSink {
    async fn store(&self, sample: &Sample) -> Result<()> {
        info!("SQL connecting to {}", self.host);
        let mut conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(|e| {
                error!("Database connection error: {}", e);
                e
            })?;

        let result = self.insert(&mut conn, sample).await;

        // Closed on both paths; a failed insert has already rolled back.
        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection cleanly: {}", e);
        } else {
            info!("SQL connection closed");
        }

        match &result {
            Ok(()) => info!("SQL inserted data into {}", self.target),
            Err(e) => error!("Database insert into {} failed: {}", self.target, e),
        }
        result
    }
}

/// `host` or `host:port`. An unparsable port falls back to the default so the
/// connection error names the host the user gave.
fn split_host_port(server: &str) -> (&str, u16) {
    match server.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (server, DEFAULT_PORT),
        },
        _ => (server, DEFAULT_PORT),
    }
}

/// Table names cannot be bound as parameters, so the identifier is quoted.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn insert_statement(table: &str) -> String {
    format!(
        "INSERT INTO {} (current_power, today_energy, total_energy) VALUES (?, ?, ?)",
        quote_identifier(table)
    )
}
