use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    // Fail a request when the pool is saturated instead of hanging on it
    options
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5));

    let db = Database::connect(options).await?;

    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create users table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create coin_types dimension table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS coin_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            denomination TEXT NOT NULL,
            series TEXT,
            start_year INTEGER,
            end_year INTEGER,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create mints dimension table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS mints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            mint_mark TEXT NOT NULL UNIQUE,
            location TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create coins table. A coin variety is identified by (year, mint, type).
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS coins (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            mint_id INTEGER NOT NULL,
            type_id INTEGER NOT NULL,
            condition TEXT,
            value REAL,
            notes TEXT,
            image_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(year, mint_id, type_id),
            FOREIGN KEY (mint_id) REFERENCES mints(id),
            FOREIGN KEY (type_id) REFERENCES coin_types(id)
        );
        CREATE INDEX IF NOT EXISTS idx_coins_mint_id ON coins(mint_id);
        CREATE INDEX IF NOT EXISTS idx_coins_type_id ON coins(type_id);
        CREATE INDEX IF NOT EXISTS idx_coins_year ON coins(year);
        "#
        .to_owned(),
    ))
    .await?;

    // Create user_collections ledger table. One row per (user, coin, condition);
    // repeated adds merge by incrementing quantity.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            coin_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            condition TEXT NOT NULL DEFAULT 'Good',
            notes TEXT,
            paid_price REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, coin_id, condition),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (coin_id) REFERENCES coins(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_user_collections_user_id ON user_collections(user_id);
        CREATE INDEX IF NOT EXISTS idx_user_collections_coin_id ON user_collections(coin_id);
        "#
        .to_owned(),
    ))
    .await?;

    // Migration: add image_url to coins (for databases created before it existed).
    // SQLite has no IF NOT EXISTS for ALTER TABLE, so we ignore errors.
    let _ = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            "ALTER TABLE coins ADD COLUMN image_url TEXT".to_owned(),
        ))
        .await;

    Ok(())
}
