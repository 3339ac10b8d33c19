use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 单连接内存库 + 迁移，供测试使用
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = create_pool(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

/// 临时文件库 + 多连接，用于真正并发的事务测试
#[cfg(test)]
pub async fn file_test_pool(path: &std::path::Path, max_connections: u32) -> DbPool {
    use sea_orm::ConnectionTrait;

    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections,
    };
    let pool = create_pool(&config).await.unwrap();
    pool.execute_unprepared("PRAGMA journal_mode=WAL").await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
