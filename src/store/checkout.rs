//! Cart-to-order conversion. The whole of the conversion — price snapshot,
//! order + item inserts, cart deletion — rides in one transaction, so a cart
//! converts exactly once: whoever commits first wins, and every later
//! attempt finds no cart.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{errors::StoreError, identity, orders, orders::OrderView};
use crate::entities::{cart, cart_item, order, order::PaymentStatus, order_item, post};
use crate::events::{EventProducers, OrderCreatedEvent};

/// Converts the cart identified by `cart_token` into an order owned by the
/// profile of `user_id`.
///
/// Preconditions are checked before any mutation and each reports its own
/// error: a missing cart, an empty cart, a principal with no profile. The
/// unit prices written to the order are the catalog prices read inside this
/// same transaction, not the prices at add-to-cart time.
///
/// The order-created event is published only after the commit and every
/// receiver failure is swallowed by the event layer; the returned order is
/// already durable by then.
pub async fn convert(
    db: &DatabaseConnection,
    cart_token: Uuid,
    user_id: i32,
    producers: &EventProducers,
) -> Result<OrderView, StoreError> {
    let txn = db.begin().await?;

    let cart = cart::Entity::find_by_id(cart_token)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound("cart"))?;

    //Snapshot-at-read: each line carries the listing's current price, under
    //the same transaction that writes the order items.
    let lines = cart_item::Entity::find()
        .filter(cart_item::Column::CartToken.eq(cart.token))
        .find_also_related(post::Entity)
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    let profile = identity::resolve_profile(&txn, user_id)
        .await?
        .ok_or(StoreError::UnknownPrincipal)?;

    let order_id = order::Entity::insert(order::ActiveModel {
        placed_at: Set(Utc::now()),
        payment_status: Set(PaymentStatus::Pending),
        profile_id: Set(profile.id),
        ..Default::default()
    })
    .exec(&txn)
    .await?
    .last_insert_id;

    let mut rows = Vec::with_capacity(lines.len());
    for (entry, listing) in &lines {
        let listing = listing.as_ref().ok_or(StoreError::NotFound("post"))?;
        rows.push(order_item::ActiveModel {
            order_id: Set(order_id),
            post_id: Set(listing.id),
            quantity: Set(entry.quantity),
            unit_price: Set(listing.price),
            ..Default::default()
        });
    }
    order_item::Entity::insert_many(rows).exec(&txn).await?;

    //Materialize before the cart delete so the caller gets real item ids.
    let view = orders::load_view(&txn, order_id)
        .await?
        .ok_or(StoreError::NotFound("order"))?;

    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartToken.eq(cart.token))
        .exec(&txn)
        .await?;
    cart::Entity::delete_by_id(cart.token).exec(&txn).await?;

    txn.commit().await?;

    producers
        .publish_order_created(OrderCreatedEvent {
            order_id,
            profile_id: profile.id,
            total: view.total,
        })
        .await;

    Ok(view)
}
