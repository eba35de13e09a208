//! Catalog lookup consumed by the cart store and the conversion engine.
//! Read-only; callers that need price-snapshot consistency pass their own
//! transaction as the connection.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use super::errors::StoreError;
use crate::entities::{order_item, post};

pub async fn exists<C: ConnectionTrait>(conn: &C, post_id: i32) -> Result<bool, StoreError> {
    let count = post::Entity::find_by_id(post_id).count(conn).await?;
    Ok(count > 0)
}

pub async fn current_price<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
) -> Result<Option<Decimal>, StoreError> {
    let found = post::Entity::find_by_id(post_id).one(conn).await?;
    Ok(found.map(|post| post.price))
}

/// Listings referenced by any order item are protected from deletion.
pub async fn referenced_by_order<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
) -> Result<bool, StoreError> {
    let count = order_item::Entity::find()
        .filter(order_item::Column::PostId.eq(post_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::store::test_support;

    #[tokio::test]
    async fn price_follows_the_live_listing() {
        let db = test_support::db().await;
        let (_, profile_id) = test_support::user_with_profile(&db, "seller").await;
        let post_id = test_support::post_with_price(&db, profile_id, Decimal::new(1250, 2)).await;

        assert!(super::exists(&db, post_id).await.unwrap());
        assert!(!super::exists(&db, post_id + 1).await.unwrap());
        assert_eq!(
            super::current_price(&db, post_id).await.unwrap(),
            Some(Decimal::new(1250, 2))
        );
        assert_eq!(super::current_price(&db, post_id + 1).await.unwrap(), None);
    }
}
