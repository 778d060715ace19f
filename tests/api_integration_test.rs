use coincollector::db;
use coincollector::services::collection_service::{
    self, AddOutcome, AddToCollectionInput, UpdateCollectionInput,
};
use coincollector::services::{stats_service, ServiceError};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    // In-memory SQLite for testing
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// Helper to create a test user
async fn create_test_user(db: &DatabaseConnection, email: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let user = coincollector::models::user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(Some("Test Collector".to_string())),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = coincollector::models::user::Entity::insert(user)
        .exec(db)
        .await
        .expect("Failed to create user");
    res.last_insert_id
}

// Helper to create a test mint
async fn create_test_mint(db: &DatabaseConnection, name: &str, mark: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let mint = coincollector::models::mint::ActiveModel {
        name: Set(name.to_string()),
        mint_mark: Set(mark.to_string()),
        location: Set(None),
        active: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = coincollector::models::mint::Entity::insert(mint)
        .exec(db)
        .await
        .expect("Failed to create mint");
    res.last_insert_id
}

// Helper to create a test coin type
async fn create_test_type(db: &DatabaseConnection, name: &str, denomination: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let coin_type = coincollector::models::coin_type::ActiveModel {
        name: Set(name.to_string()),
        denomination: Set(denomination.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = coincollector::models::coin_type::Entity::insert(coin_type)
        .exec(db)
        .await
        .expect("Failed to create coin type");
    res.last_insert_id
}

// Helper to create a test coin
async fn create_test_coin(db: &DatabaseConnection, year: i32, mint_id: i32, type_id: i32) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let coin = coincollector::models::coin::ActiveModel {
        year: Set(year),
        mint_id: Set(mint_id),
        type_id: Set(type_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = coincollector::models::coin::Entity::insert(coin)
        .exec(db)
        .await
        .expect("Failed to create coin");
    res.last_insert_id
}

#[tokio::test]
async fn test_user_crud() {
    let db = setup_test_db().await;

    // 1. Create User
    let user_id = create_test_user(&db, "crud@example.com").await;

    // 2. Read User
    let fetched = coincollector::models::user::Entity::find_by_id(user_id)
        .one(&db)
        .await
        .expect("Find failed");
    assert!(fetched.is_some());
    assert_eq!(fetched.unwrap().email, "crud@example.com");

    // 3. Update User
    let mut active: coincollector::models::user::ActiveModel =
        coincollector::models::user::Entity::find_by_id(user_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into();
    active.name = Set(Some("Renamed".to_string()));
    active.update(&db).await.expect("Update failed");

    let updated = coincollector::models::user::Entity::find_by_id(user_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name.as_deref(), Some("Renamed"));

    // 4. Delete User
    coincollector::models::user::Entity::delete_by_id(user_id)
        .exec(&db)
        .await
        .expect("Delete failed");
    let deleted = coincollector::models::user::Entity::find_by_id(user_id)
        .one(&db)
        .await
        .unwrap();
    assert!(deleted.is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let db = setup_test_db().await;

    create_test_user(&db, "dup@example.com").await;

    let now = chrono::Utc::now().to_rfc3339();
    let dup = coincollector::models::user::ActiveModel {
        email: Set("dup@example.com".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let err = coincollector::models::user::Entity::insert(dup)
        .exec(&db)
        .await
        .expect_err("Expected unique violation");

    // Must classify as a conflict, not an opaque database error
    assert!(matches!(
        ServiceError::from(err),
        ServiceError::Conflict(_)
    ));
}

#[tokio::test]
async fn test_coin_identity_triple_is_unique() {
    let db = setup_test_db().await;

    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;
    create_test_coin(&db, 2020, mint_id, type_id).await;

    let now = chrono::Utc::now().to_rfc3339();
    let dup = coincollector::models::coin::ActiveModel {
        year: Set(2020),
        mint_id: Set(mint_id),
        type_id: Set(type_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let err = coincollector::models::coin::Entity::insert(dup)
        .exec(&db)
        .await
        .expect_err("Expected unique violation on (year, mint, type)");

    assert!(matches!(
        ServiceError::from(err),
        ServiceError::Conflict(_)
    ));

    // A different year with the same mint and type is a distinct variety
    create_test_coin(&db, 2021, mint_id, type_id).await;
}

#[tokio::test]
async fn test_add_or_merge_increments_quantity() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "merge@example.com").await;
    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;
    let coin_id = create_test_coin(&db, 2020, mint_id, type_id).await;

    let first = collection_service::add_or_merge(
        &db,
        AddToCollectionInput {
            user_id,
            coin_id,
            quantity: 2,
            condition: "Good".to_string(),
            notes: Some("first batch".to_string()),
            paid_price: Some(1.5),
        },
    )
    .await
    .expect("First add failed");
    assert!(matches!(first, AddOutcome::Created(_)));

    let second = collection_service::add_or_merge(
        &db,
        AddToCollectionInput {
            user_id,
            coin_id,
            quantity: 3,
            condition: "Good".to_string(),
            notes: None,
            paid_price: None,
        },
    )
    .await
    .expect("Second add failed");

    let merged = match second {
        AddOutcome::Merged(row) => row,
        AddOutcome::Created(_) => panic!("Expected a merge, got a new row"),
    };
    assert_eq!(merged.quantity, 5);
    // Absent notes/paidPrice fall back to the stored values
    assert_eq!(merged.notes.as_deref(), Some("first batch"));
    assert_eq!(merged.paid_price, Some(1.5));

    // Still exactly one ledger row
    let count = coincollector::models::user_collection::Entity::find()
        .filter(coincollector::models::user_collection::Column::UserId.eq(user_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_add_with_new_condition_creates_second_row() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "conditions@example.com").await;
    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;
    let coin_id = create_test_coin(&db, 2020, mint_id, type_id).await;

    for condition in ["Good", "Fine"] {
        let outcome = collection_service::add_or_merge(
            &db,
            AddToCollectionInput {
                user_id,
                coin_id,
                quantity: 1,
                condition: condition.to_string(),
                notes: None,
                paid_price: None,
            },
        )
        .await
        .expect("Add failed");
        assert!(matches!(outcome, AddOutcome::Created(_)));
    }

    let count = coincollector::models::user_collection::Entity::find()
        .filter(coincollector::models::user_collection::Column::UserId.eq(user_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_add_rejects_missing_coin_and_bad_quantity() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "invalid@example.com").await;

    let missing = collection_service::add_or_merge(
        &db,
        AddToCollectionInput {
            user_id,
            coin_id: 999,
            quantity: 1,
            condition: "Good".to_string(),
            notes: None,
            paid_price: None,
        },
    )
    .await;
    assert!(matches!(missing, Err(ServiceError::NotFound)));

    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;
    let coin_id = create_test_coin(&db, 2020, mint_id, type_id).await;

    let zero = collection_service::add_or_merge(
        &db,
        AddToCollectionInput {
            user_id,
            coin_id,
            quantity: 0,
            condition: "Good".to_string(),
            notes: None,
            paid_price: None,
        },
    )
    .await;
    assert!(matches!(zero, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_update_and_delete_ledger_row() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "ledger@example.com").await;
    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;
    let coin_id = create_test_coin(&db, 2020, mint_id, type_id).await;

    let created = match collection_service::add_or_merge(
        &db,
        AddToCollectionInput {
            user_id,
            coin_id,
            quantity: 1,
            condition: "Good".to_string(),
            notes: None,
            paid_price: None,
        },
    )
    .await
    .expect("Add failed")
    {
        AddOutcome::Created(row) => row,
        AddOutcome::Merged(_) => panic!("Expected a new row"),
    };

    let updated = collection_service::update_item(
        &db,
        created.id,
        UpdateCollectionInput {
            quantity: Some(4),
            condition: Some("Fine".to_string()),
            notes: Some("regraded".to_string()),
            paid_price: Some(9.99),
        },
    )
    .await
    .expect("Update failed");
    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.condition, "Fine");
    assert_eq!(updated.paid_price, Some(9.99));

    collection_service::delete_item(&db, created.id)
        .await
        .expect("Delete failed");

    let missing = collection_service::delete_item(&db, created.id).await;
    assert!(matches!(missing, Err(ServiceError::NotFound)));
}

#[tokio::test]
async fn test_list_items_pagination() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "pages@example.com").await;
    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;

    for year in 2000..2007 {
        let coin_id = create_test_coin(&db, year, mint_id, type_id).await;
        collection_service::add_or_merge(
            &db,
            AddToCollectionInput {
                user_id,
                coin_id,
                quantity: 1,
                condition: "Good".to_string(),
                notes: None,
                paid_price: None,
            },
        )
        .await
        .expect("Add failed");
    }

    let (first_page, total) = collection_service::list_items(&db, user_id, 1, 5)
        .await
        .expect("List failed");
    assert_eq!(total, 7);
    assert_eq!(first_page.len(), 5);
    // Nested coin data is attached
    assert!(first_page[0].coin.is_some());

    let (second_page, _) = collection_service::list_items(&db, user_id, 2, 5)
        .await
        .expect("List failed");
    assert_eq!(second_page.len(), 2);
}

#[tokio::test]
async fn test_collection_stats_aggregates() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "stats@example.com").await;
    let mint_id = create_test_mint(&db, "Denver", "D").await;
    let type_id = create_test_type(&db, "Lincoln Cent", "Cent").await;
    let coin_a = create_test_coin(&db, 2020, mint_id, type_id).await;
    let coin_b = create_test_coin(&db, 2021, mint_id, type_id).await;

    // coin_a held in two conditions, coin_b in one; one row has no paid price
    for (coin_id, quantity, condition, paid) in [
        (coin_a, 2, "Good", Some(10.0)),
        (coin_a, 1, "Fine", Some(5.5)),
        (coin_b, 3, "Good", None),
    ] {
        collection_service::add_or_merge(
            &db,
            AddToCollectionInput {
                user_id,
                coin_id,
                quantity,
                condition: condition.to_string(),
                notes: None,
                paid_price: paid,
            },
        )
        .await
        .expect("Add failed");
    }

    let stats = stats_service::collection_stats(&db, user_id)
        .await
        .expect("Stats failed");

    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.total_coins, 6);
    // Null paid prices are excluded from the sum
    assert!((stats.total_value - 15.5).abs() < f64::EPSILON);
    assert_eq!(stats.unique_coins, 2);

    let good = stats
        .condition_breakdown
        .iter()
        .find(|b| b.condition == "Good")
        .expect("Good bucket missing");
    assert_eq!(good.count, 2);
    assert_eq!(good.total_quantity, 5);

    let fine = stats
        .condition_breakdown
        .iter()
        .find(|b| b.condition == "Fine")
        .expect("Fine bucket missing");
    assert_eq!(fine.count, 1);
    assert_eq!(fine.total_quantity, 1);
}

#[tokio::test]
async fn test_collection_stats_zero_for_empty_user() {
    let db = setup_test_db().await;

    let user_id = create_test_user(&db, "empty@example.com").await;

    let stats = stats_service::collection_stats(&db, user_id)
        .await
        .expect("Stats failed");

    assert_eq!(stats.total_items, 0);
    assert_eq!(stats.total_coins, 0);
    assert_eq!(stats.total_value, 0.0);
    assert_eq!(stats.unique_coins, 0);
    assert!(stats.coin_breakdown.is_empty());
    assert!(stats.condition_breakdown.is_empty());
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let db = setup_test_db().await;

    coincollector::seed::seed_demo_data(&db)
        .await
        .expect("First seed failed");

    let mints_before = coincollector::models::mint::Entity::find()
        .count(&db)
        .await
        .unwrap();
    let coins_before = coincollector::models::coin::Entity::find()
        .count(&db)
        .await
        .unwrap();

    coincollector::seed::seed_demo_data(&db)
        .await
        .expect("Second seed failed");

    let mints_after = coincollector::models::mint::Entity::find()
        .count(&db)
        .await
        .unwrap();
    let coins_after = coincollector::models::coin::Entity::find()
        .count(&db)
        .await
        .unwrap();

    assert_eq!(mints_before, mints_after);
    assert_eq!(coins_before, coins_after);
}
