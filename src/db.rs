use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr, TransactionError,
};
use sea_orm_migration::MigratorTrait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(8),
            idle_timeout: Duration::from_secs(300),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("vetclinic_db.max_connections", config.max_connections as f64);

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database connection pool established successfully");
    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs the embedded migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed successfully in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = std::time::Instant::now();
    let result = pool.ping().await.map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            gauge!("vetclinic_db.connection_latency", elapsed.as_millis() as f64);
        }
        Err(e) => {
            error!("Database connection check failed after {:?}: {}", elapsed, e);
            counter!("vetclinic_db.connection_failures", 1);
        }
    }

    result
}

/// Closes the database connection pool
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}

/// Flattens the two failure modes of `TransactionTrait::transaction`.
pub fn map_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// True when the error is a unique index violation reported by the driver.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// A unique violation that escaped a service transaction, worth another attempt.
pub fn is_unique_conflict(err: &ServiceError) -> bool {
    matches!(err, ServiceError::DatabaseError(db_err) if is_unique_violation(db_err))
}

/// Re-runs `attempt` while it fails on a unique index, up to `max_attempts` runs.
///
/// Each run must be a complete transaction. When every run collides the caller
/// gets a `Conflict` naming `what` could not be allocated.
pub async fn retry_on_unique_conflict<T, F, Fut>(
    what: &'static str,
    max_attempts: usize,
    mut attempt: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Err(e) if is_unique_conflict(&e) && tries < max_attempts => {
                warn!(attempt = tries, what, "key taken concurrently, retrying");
                counter!("vetclinic_unique_retries_total", 1, "what" => what);
            }
            Err(e) if is_unique_conflict(&e) => {
                return Err(ServiceError::Conflict(format!(
                    "Could not allocate {}, please retry",
                    what
                )));
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn sqlite_memory_pool_connects_and_migrates() {
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = establish_connection_with_config(&cfg).await.unwrap();
        check_connection(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // second run is a no-op
        run_migrations(&pool).await.unwrap();
        close_pool(pool).await.unwrap();
    }

    #[test]
    fn transaction_errors_keep_service_error() {
        let err = map_transaction_error(TransactionError::Transaction(ServiceError::NotFound(
            "x".into(),
        )));
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = map_transaction_error(TransactionError::Connection(DbErr::Custom("x".into())));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }

    async fn keyed_table() -> DbPool {
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = establish_connection_with_config(&cfg).await.unwrap();
        pool.execute_unprepared("CREATE TABLE tickets (k INTEGER NOT NULL UNIQUE)")
            .await
            .unwrap();
        pool.execute_unprepared("INSERT INTO tickets (k) VALUES (1)")
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn unique_collision_is_retried_until_a_key_is_free() {
        let pool = keyed_table().await;
        let db = &pool;
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;

        // first run collides with the existing key, the second takes 2
        let key = retry_on_unique_conflict("a ticket", 3, || async move {
            let key = calls_ref.fetch_add(1, Ordering::SeqCst) + 1;
            db.execute_unprepared(&format!("INSERT INTO tickets (k) VALUES ({})", key))
                .await?;
            Ok::<_, ServiceError>(key)
        })
        .await
        .unwrap();

        assert_eq!(key, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_a_conflict() {
        let pool = keyed_table().await;
        let db = &pool;
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;

        let err = retry_on_unique_conflict("a ticket", 3, || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            db.execute_unprepared("INSERT INTO tickets (k) VALUES (1)").await?;
            Ok::<_, ServiceError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(ref m) if m.contains("a ticket")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let err = retry_on_unique_conflict::<(), _, _>("a ticket", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::NotFound("gone".into())) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn custom_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&DbErr::Custom("dup".into())));
        assert!(!is_unique_conflict(&ServiceError::Conflict("dup".into())));
    }
}
