pub mod cart;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod post;
pub mod post_category;
pub mod profile;
pub mod user;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set, TransactionTrait,
};
use std::sync::Arc;

use crate::entities::{
    cart::Entity as Cart,
    cart_item::Entity as CartItem,
    category::Entity as Category,
    order::Entity as Order,
    order_item::Entity as OrderItem,
    post::Entity as Post,
    post_category::Entity as PostCategory,
    profile::Entity as Profile,
    user::Entity as User,
};

pub async fn setup_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = sea_orm::Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Profile),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Post),
        schema.create_table_from_entity(PostCategory),
        schema.create_table_from_entity(Cart),
        schema.create_table_from_entity(CartItem),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
    ];

    for stmt in statements.iter_mut() {
        stmt.if_not_exists();
        db.execute(backend.build(stmt))
            .await
            .expect("Failed to create table schema");
    }

    //One row per (cart, post): repeated adds must merge, never duplicate.
    let cart_item_unique = Index::create()
        .name("idx_cart_items_cart_token_post_id")
        .table(CartItem)
        .col(cart_item::Column::CartToken)
        .col(cart_item::Column::PostId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&cart_item_unique))
        .await
        .expect("Failed to create cart_items unique index");
}

/// Seeds the admin and a demo seller account on first boot. A reboot against
/// an already seeded database is a no-op.
pub async fn primary_setup(db: Arc<DatabaseConnection>) {
    let existing = User::find()
        .count(&*db)
        .await
        .expect("Failed to query users during primary setup");
    if existing > 0 {
        return;
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password("Secret15".as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    let txn = db
        .begin()
        .await
        .expect("Failed to begin primary setup transaction");

    let admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        password: Set(password_hash.clone()),
        role: Set(user::Role::Admin),
        ..Default::default()
    };
    let admin_id = user::Entity::insert(admin)
        .exec(&txn)
        .await
        .expect("Failed to seed admin user")
        .last_insert_id;

    let demo = user::ActiveModel {
        username: Set("user".to_owned()),
        password: Set(password_hash),
        role: Set(user::Role::User),
        ..Default::default()
    };
    let demo_id = user::Entity::insert(demo)
        .exec(&txn)
        .await
        .expect("Failed to seed demo user")
        .last_insert_id;

    profile::Entity::insert(profile::ActiveModel {
        user_id: Set(admin_id),
        is_seller: Set(false),
        ..Default::default()
    })
    .exec(&txn)
    .await
    .expect("Failed to seed admin profile");

    let seller_profile_id = profile::Entity::insert(profile::ActiveModel {
        user_id: Set(demo_id),
        bio: Set(Some("Home kitchen, weekend batches".to_owned())),
        is_seller: Set(true),
        ..Default::default()
    })
    .exec(&txn)
    .await
    .expect("Failed to seed demo profile")
    .last_insert_id;

    let baked = category::Entity::insert(category::ActiveModel {
        title: Set("Baked goods".to_owned()),
        ..Default::default()
    })
    .exec(&txn)
    .await
    .expect("Failed to seed category")
    .last_insert_id;

    let now = Utc::now();
    let post_id = post::Entity::insert(post::ActiveModel {
        title: Set("Sourdough loaf".to_owned()),
        description: Set("Baked this morning, pick up before six".to_owned()),
        delivery: Set(false),
        pick_up: Set(true),
        price: Set(Decimal::new(899, 2)),
        ready_date_time: Set(now),
        servings_available: Set(8),
        location: Set("Portland, OR".to_owned()),
        latitude: Set(45.5152),
        longitude: Set(-122.6784),
        last_update: Set(now),
        profile_id: Set(seller_profile_id),
        ..Default::default()
    })
    .exec(&txn)
    .await
    .expect("Failed to seed post")
    .last_insert_id;

    post_category::Entity::insert(post_category::ActiveModel {
        post_id: Set(post_id),
        category_id: Set(baked),
        ..Default::default()
    })
    .exec(&txn)
    .await
    .expect("Failed to seed post category");

    txn.commit().await.expect("Failed to commit primary setup");
}
