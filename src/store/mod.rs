//! Transactional core: cart storage, cart-to-order conversion and the order
//! lifecycle. HTTP handlers stay thin and call into here; everything that
//! touches more than one table in one logical step runs inside a database
//! transaction owned by this layer or by the calling handler.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod errors;
pub mod identity;
pub mod orders;

pub use errors::StoreError;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};

    use crate::entities::{self, post, profile, user};

    /// Fresh in-memory database with the full schema. A single pooled
    /// connection keeps every test statement on the same sqlite instance.
    pub async fn db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options)
            .await
            .expect("Failed to open in-memory database");
        entities::setup_schema(&db).await;
        db
    }

    pub async fn user_with_profile(db: &DatabaseConnection, username: &str) -> (i32, i32) {
        let user_id = user::Entity::insert(user::ActiveModel {
            username: Set(username.to_owned()),
            password: Set("not-a-real-hash".to_owned()),
            role: Set(user::Role::User),
            ..Default::default()
        })
        .exec(db)
        .await
        .expect("Failed to insert test user")
        .last_insert_id;

        let profile_id = profile::Entity::insert(profile::ActiveModel {
            user_id: Set(user_id),
            is_seller: Set(true),
            ..Default::default()
        })
        .exec(db)
        .await
        .expect("Failed to insert test profile")
        .last_insert_id;

        (user_id, profile_id)
    }

    /// A user without any profile row, for UnknownPrincipal cases.
    pub async fn bare_user(db: &DatabaseConnection, username: &str) -> i32 {
        user::Entity::insert(user::ActiveModel {
            username: Set(username.to_owned()),
            password: Set("not-a-real-hash".to_owned()),
            role: Set(user::Role::User),
            ..Default::default()
        })
        .exec(db)
        .await
        .expect("Failed to insert test user")
        .last_insert_id
    }

    pub async fn post_with_price(
        db: &DatabaseConnection,
        profile_id: i32,
        price: Decimal,
    ) -> i32 {
        let now = Utc::now();
        post::Entity::insert(post::ActiveModel {
            title: Set("Test dish".to_owned()),
            description: Set("Test description".to_owned()),
            delivery: Set(true),
            pick_up: Set(false),
            price: Set(price),
            ready_date_time: Set(now),
            servings_available: Set(10),
            location: Set("Test kitchen".to_owned()),
            latitude: Set(0.0),
            longitude: Set(0.0),
            last_update: Set(now),
            profile_id: Set(profile_id),
            ..Default::default()
        })
        .exec(db)
        .await
        .expect("Failed to insert test post")
        .last_insert_id
    }
}
