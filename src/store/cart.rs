//! Cart store. Carts are anonymous rows keyed by an unguessable token;
//! items merge on (cart, post). Totals are derived from live catalog prices
//! at read time and are never persisted.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use uuid::Uuid;

use super::{catalog, errors::StoreError};
use crate::entities::{cart, cart_item, post};

#[derive(Debug, Serialize)]
pub struct CartView {
    pub token: Uuid,
    pub created_at: sea_orm::prelude::DateTimeUtc,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: i32,
    pub post_id: i32,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

pub async fn create_cart<C: ConnectionTrait>(conn: &C) -> Result<cart::Model, StoreError> {
    let new_cart = cart::ActiveModel {
        token: Set(Uuid::new_v4()),
        created_at: Set(Utc::now()),
    };
    Ok(new_cart.insert(conn).await?)
}

/// Merge-add: a second add of the same listing increments the existing row
/// instead of creating a duplicate.
pub async fn add_item<C: ConnectionTrait>(
    conn: &C,
    token: Uuid,
    post_id: i32,
    quantity: i32,
) -> Result<cart_item::Model, StoreError> {
    if quantity < 1 {
        return Err(StoreError::Validation(
            "Quantity must be at least 1".to_owned(),
        ));
    }
    if cart::Entity::find_by_id(token).one(conn).await?.is_none() {
        return Err(StoreError::NotFound("cart"));
    }
    if !catalog::exists(conn, post_id).await? {
        return Err(StoreError::NotFound("post"));
    }

    let existing = cart_item::Entity::find()
        .filter(cart_item::Column::CartToken.eq(token))
        .filter(cart_item::Column::PostId.eq(post_id))
        .one(conn)
        .await?;

    match existing {
        Some(entry) => {
            let merged = entry.quantity + quantity;
            let mut entry: cart_item::ActiveModel = entry.into();
            entry.quantity = Set(merged);
            Ok(entry.update(conn).await?)
        }
        None => {
            let entry = cart_item::ActiveModel {
                cart_token: Set(token),
                post_id: Set(post_id),
                quantity: Set(quantity),
                ..Default::default()
            };
            Ok(entry.insert(conn).await?)
        }
    }
}

pub async fn update_item_quantity<C: ConnectionTrait>(
    conn: &C,
    token: Uuid,
    item_id: i32,
    quantity: i32,
) -> Result<cart_item::Model, StoreError> {
    if quantity < 1 {
        return Err(StoreError::Validation(
            "Quantity must be at least 1".to_owned(),
        ));
    }

    let entry = cart_item::Entity::find_by_id(item_id)
        .filter(cart_item::Column::CartToken.eq(token))
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound("cart item"))?;

    let mut entry: cart_item::ActiveModel = entry.into();
    entry.quantity = Set(quantity);
    Ok(entry.update(conn).await?)
}

/// Idempotent: removing an item that is already gone is not an error.
pub async fn remove_item<C: ConnectionTrait>(
    conn: &C,
    token: Uuid,
    item_id: i32,
) -> Result<(), StoreError> {
    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartToken.eq(token))
        .filter(cart_item::Column::Id.eq(item_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Idempotent: deletes the cart and everything in it.
pub async fn delete_cart<C: ConnectionTrait>(conn: &C, token: Uuid) -> Result<(), StoreError> {
    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartToken.eq(token))
        .exec(conn)
        .await?;
    cart::Entity::delete_by_id(token).exec(conn).await?;
    Ok(())
}

pub async fn load_cart<C: ConnectionTrait>(
    conn: &C,
    token: Uuid,
) -> Result<CartView, StoreError> {
    let cart = cart::Entity::find_by_id(token)
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound("cart"))?;

    let lines = cart_item::Entity::find()
        .filter(cart_item::Column::CartToken.eq(token))
        .find_also_related(post::Entity)
        .all(conn)
        .await?;

    let mut items = Vec::with_capacity(lines.len());
    let mut total_price = Decimal::ZERO;
    for (entry, listing) in lines {
        let listing = listing.ok_or(StoreError::NotFound("post"))?;
        let line_total = listing.price * Decimal::from(entry.quantity);
        total_price += line_total;
        items.push(CartItemView {
            id: entry.id,
            post_id: listing.id,
            title: listing.title,
            unit_price: listing.price,
            quantity: entry.quantity,
            total_price: line_total,
        });
    }

    Ok(CartView {
        token: cart.token,
        created_at: cart.created_at,
        items,
        total_price,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Set};
    use uuid::Uuid;

    use super::*;
    use crate::entities::post;
    use crate::store::test_support;

    #[tokio::test]
    async fn add_merges_into_a_single_row() {
        let db = test_support::db().await;
        let (_, profile_id) = test_support::user_with_profile(&db, "seller").await;
        let post_id = test_support::post_with_price(&db, profile_id, Decimal::new(999, 2)).await;
        let cart = create_cart(&db).await.unwrap();

        let first = add_item(&db, cart.token, post_id, 2).await.unwrap();
        let second = add_item(&db, cart.token, post_id, 3).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);
        let view = load_cart(&db, cart.token).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn rejects_unknown_cart_post_and_bad_quantity() {
        let db = test_support::db().await;
        let (_, profile_id) = test_support::user_with_profile(&db, "seller").await;
        let post_id = test_support::post_with_price(&db, profile_id, Decimal::new(500, 2)).await;
        let cart = create_cart(&db).await.unwrap();

        let missing_cart = add_item(&db, Uuid::new_v4(), post_id, 1).await;
        assert!(matches!(missing_cart, Err(StoreError::NotFound("cart"))));

        let missing_post = add_item(&db, cart.token, post_id + 99, 1).await;
        assert!(matches!(missing_post, Err(StoreError::NotFound("post"))));

        let zero_quantity = add_item(&db, cart.token, post_id, 0).await;
        assert!(matches!(zero_quantity, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn update_requires_item_in_that_cart() {
        let db = test_support::db().await;
        let (_, profile_id) = test_support::user_with_profile(&db, "seller").await;
        let post_id = test_support::post_with_price(&db, profile_id, Decimal::new(500, 2)).await;
        let cart = create_cart(&db).await.unwrap();
        let other = create_cart(&db).await.unwrap();
        let item = add_item(&db, cart.token, post_id, 1).await.unwrap();

        let updated = update_item_quantity(&db, cart.token, item.id, 4).await.unwrap();
        assert_eq!(updated.quantity, 4);

        let wrong_cart = update_item_quantity(&db, other.token, item.id, 2).await;
        assert!(matches!(wrong_cart, Err(StoreError::NotFound("cart item"))));

        let bad_quantity = update_item_quantity(&db, cart.token, item.id, 0).await;
        assert!(matches!(bad_quantity, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn deletes_are_idempotent_and_cascade() {
        let db = test_support::db().await;
        let (_, profile_id) = test_support::user_with_profile(&db, "seller").await;
        let post_id = test_support::post_with_price(&db, profile_id, Decimal::new(500, 2)).await;
        let cart = create_cart(&db).await.unwrap();
        let item = add_item(&db, cart.token, post_id, 1).await.unwrap();

        remove_item(&db, cart.token, item.id).await.unwrap();
        remove_item(&db, cart.token, item.id).await.unwrap();

        delete_cart(&db, cart.token).await.unwrap();
        delete_cart(&db, cart.token).await.unwrap();

        let gone = load_cart(&db, cart.token).await;
        assert!(matches!(gone, Err(StoreError::NotFound("cart"))));
    }

    #[tokio::test]
    async fn derived_total_tracks_live_prices() {
        let db = test_support::db().await;
        let (_, profile_id) = test_support::user_with_profile(&db, "seller").await;
        let post_id = test_support::post_with_price(&db, profile_id, Decimal::new(1000, 2)).await;
        let cart = create_cart(&db).await.unwrap();
        add_item(&db, cart.token, post_id, 3).await.unwrap();

        let before = load_cart(&db, cart.token).await.unwrap();
        assert_eq!(before.total_price, Decimal::new(3000, 2));

        //A price change shows up in the next read; nothing was snapshotted.
        let listing = post::Entity::find_by_id(post_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut listing: post::ActiveModel = listing.into();
        listing.price = Set(Decimal::new(1500, 2));
        listing.update(&db).await.unwrap();

        let after = load_cart(&db, cart.token).await.unwrap();
        assert_eq!(after.total_price, Decimal::new(4500, 2));
        assert_eq!(after.items[0].unit_price, Decimal::new(1500, 2));
    }
}
