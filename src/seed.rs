use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::models::{coin, coin_type, mint, user, user_collection};

/// Seed demo data. Every insert carries an ON CONFLICT DO NOTHING guard so
/// re-running the seed is harmless.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Users
    for (email, name) in [
        ("collector@example.com", "John Collector"),
        ("numismatist@example.com", "Jane Numismatist"),
    ] {
        let new_user = user::ActiveModel {
            email: Set(email.to_owned()),
            name: Set(Some(name.to_owned())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let res = user::Entity::insert(new_user)
            .on_conflict(
                OnConflict::column(user::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        ignore_conflict(res)?;
    }

    // 2. Mints
    for (name, mark, location) in [
        ("Denver", "D", "Denver, Colorado"),
        ("Philadelphia", "P", "Philadelphia, Pennsylvania"),
        ("San Francisco", "S", "San Francisco, California"),
    ] {
        let new_mint = mint::ActiveModel {
            name: Set(name.to_owned()),
            mint_mark: Set(mark.to_owned()),
            location: Set(Some(location.to_owned())),
            active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let res = mint::Entity::insert(new_mint)
            .on_conflict(
                OnConflict::column(mint::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        ignore_conflict(res)?;
    }

    // 3. Coin types
    for (name, denomination, series, start, end) in [
        (
            "Lincoln Cent",
            "Cent",
            Some("Lincoln"),
            Some(1909),
            None::<i32>,
        ),
        (
            "Morgan Dollar",
            "1 Dollar",
            Some("Morgan"),
            Some(1878),
            Some(1921),
        ),
        (
            "Mercury Dime",
            "10 Cents",
            Some("Winged Liberty Head"),
            Some(1916),
            Some(1945),
        ),
    ] {
        let new_type = coin_type::ActiveModel {
            name: Set(name.to_owned()),
            denomination: Set(denomination.to_owned()),
            series: Set(series.map(str::to_owned)),
            start_year: Set(start),
            end_year: Set(end),
            description: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let res = coin_type::Entity::insert(new_type)
            .on_conflict(
                OnConflict::column(coin_type::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        ignore_conflict(res)?;
    }

    // 4. Coin varieties. The dimension ids come from lookups because the
    // inserts above may have been no-ops on an already seeded database.
    let denver = find_mint(db, "Denver").await?;
    let philadelphia = find_mint(db, "Philadelphia").await?;
    let lincoln = find_type(db, "Lincoln Cent").await?;
    let morgan = find_type(db, "Morgan Dollar").await?;

    for (year, mint_id, type_id, value) in [
        (2020, denver, lincoln, Some(0.05)),
        (1943, philadelphia, lincoln, Some(0.85)),
        (1921, philadelphia, morgan, Some(52.0)),
    ] {
        let new_coin = coin::ActiveModel {
            year: Set(year),
            mint_id: Set(mint_id),
            type_id: Set(type_id),
            condition: Set(None),
            value: Set(value),
            notes: Set(None),
            image_url: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let res = coin::Entity::insert(new_coin)
            .on_conflict(
                OnConflict::columns([
                    coin::Column::Year,
                    coin::Column::MintId,
                    coin::Column::TypeId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(db)
            .await;
        ignore_conflict(res)?;
    }

    // 5. A starter ledger row for the first user
    let owner = user::Entity::find()
        .filter(user::Column::Email.eq("collector@example.com"))
        .one(db)
        .await?;
    let morgan_coin = coin::Entity::find()
        .filter(coin::Column::Year.eq(1921))
        .filter(coin::Column::TypeId.eq(morgan))
        .one(db)
        .await?;

    if let (Some(owner), Some(morgan_coin)) = (owner, morgan_coin) {
        let entry = user_collection::ActiveModel {
            user_id: Set(owner.id),
            coin_id: Set(morgan_coin.id),
            quantity: Set(1),
            condition: Set("Very Fine".to_owned()),
            notes: Set(Some("Purchased from local coin shop".to_owned())),
            paid_price: Set(Some(45.0)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        let res = user_collection::Entity::insert(entry)
            .on_conflict(
                OnConflict::columns([
                    user_collection::Column::UserId,
                    user_collection::Column::CoinId,
                    user_collection::Column::Condition,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(db)
            .await;
        ignore_conflict(res)?;
    }

    Ok(())
}

async fn find_mint(db: &DatabaseConnection, name: &str) -> Result<i32, DbErr> {
    mint::Entity::find()
        .filter(mint::Column::Name.eq(name))
        .one(db)
        .await?
        .map(|m| m.id)
        .ok_or_else(|| DbErr::RecordNotFound(format!("seed mint {name} missing")))
}

async fn find_type(db: &DatabaseConnection, name: &str) -> Result<i32, DbErr> {
    coin_type::Entity::find()
        .filter(coin_type::Column::Name.eq(name))
        .one(db)
        .await?
        .map(|t| t.id)
        .ok_or_else(|| DbErr::RecordNotFound(format!("seed coin type {name} missing")))
}

// An ON CONFLICT DO NOTHING insert that matched an existing row surfaces as
// RecordNotInserted; that is the expected re-seed path.
fn ignore_conflict<T>(res: Result<T, DbErr>) -> Result<(), DbErr> {
    match res {
        Ok(_) => Ok(()),
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}
