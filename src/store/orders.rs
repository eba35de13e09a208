//! Order lifecycle: visibility-scoped reads and the payment-status mutation.
//! Orders and their items are permanent; nothing here deletes them.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use super::{errors::StoreError, identity};
use crate::entities::user::Role;
use crate::entities::{order, order::PaymentStatus, order_item, post};

/// The authenticated principal making the request, as the store sees it.
#[derive(Clone, Copy, Debug)]
pub struct Requestor {
    pub user_id: i32,
    pub role: Role,
}

impl Requestor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: i32,
    pub profile_id: i32,
    pub placed_at: sea_orm::prelude::DateTimeUtc,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemView>,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: i32,
    pub post_id: i32,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

fn assemble(
    order: order::Model,
    lines: Vec<(order_item::Model, Option<post::Model>)>,
) -> OrderView {
    let mut items = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;
    for (item, listing) in lines {
        let line_total = item.unit_price * Decimal::from(item.quantity);
        total += line_total;
        items.push(OrderItemView {
            id: item.id,
            post_id: item.post_id,
            title: listing.map(|p| p.title).unwrap_or_default(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: line_total,
        });
    }
    OrderView {
        id: order.id,
        profile_id: order.profile_id,
        placed_at: order.placed_at,
        payment_status: order.payment_status,
        items,
        total,
    }
}

/// Materializes one order with its items; `None` if the order is absent.
pub async fn load_view<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Option<OrderView>, StoreError> {
    let Some(order) = order::Entity::find_by_id(order_id).one(conn).await? else {
        return Ok(None);
    };
    let lines = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .find_also_related(post::Entity)
        .all(conn)
        .await?;
    Ok(Some(assemble(order, lines)))
}

/// Admins see every order; everyone else only the orders of their own
/// profile. Newest first.
pub async fn list_orders<C: ConnectionTrait>(
    conn: &C,
    requestor: &Requestor,
) -> Result<Vec<OrderView>, StoreError> {
    let mut finder = order::Entity::find()
        .order_by_desc(order::Column::PlacedAt)
        .order_by_desc(order::Column::Id);

    if !requestor.is_admin() {
        let profile = identity::resolve_profile(conn, requestor.user_id)
            .await?
            .ok_or(StoreError::UnknownPrincipal)?;
        finder = finder.filter(order::Column::ProfileId.eq(profile.id));
    }

    let orders = finder.all(conn).await?;
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .find_also_related(post::Entity)
            .all(conn)
            .await?;
        views.push(assemble(order, lines));
    }
    Ok(views)
}

/// A foreign order reads exactly like a missing one, so existence never
/// leaks across profiles.
pub async fn get_order<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    requestor: &Requestor,
) -> Result<OrderView, StoreError> {
    let view = load_view(conn, order_id)
        .await?
        .ok_or(StoreError::NotFound("order"))?;

    if !requestor.is_admin() {
        let profile = identity::resolve_profile(conn, requestor.user_id)
            .await?
            .ok_or(StoreError::UnknownPrincipal)?;
        if view.profile_id != profile.id {
            return Err(StoreError::NotFound("order"));
        }
    }
    Ok(view)
}

/// Any of the three statuses may be set at any time by an admin; there is
/// deliberately no transition graph.
pub async fn set_payment_status<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    status: PaymentStatus,
    requestor: &Requestor,
) -> Result<order::Model, StoreError> {
    if !requestor.is_admin() {
        return Err(StoreError::Forbidden);
    }
    let order = order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound("order"))?;

    let mut order: order::ActiveModel = order.into();
    order.payment_status = Set(status);
    Ok(order.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::entities::user::Role;
    use crate::store::{cart, checkout, test_support};
    use crate::events::EventProducers;

    async fn place_order(
        db: &sea_orm::DatabaseConnection,
        user_id: i32,
        profile_id: i32,
        price: Decimal,
    ) -> OrderView {
        let post_id = test_support::post_with_price(db, profile_id, price).await;
        let cart = cart::create_cart(db).await.unwrap();
        cart::add_item(db, cart.token, post_id, 1).await.unwrap();
        checkout::convert(db, cart.token, user_id, &EventProducers::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_requestor_profile() {
        let db = test_support::db().await;
        let (alice_id, alice_profile) = test_support::user_with_profile(&db, "alice").await;
        let (bob_id, bob_profile) = test_support::user_with_profile(&db, "bob").await;
        let admin_id = test_support::bare_user(&db, "root").await;

        let alice_order = place_order(&db, alice_id, alice_profile, Decimal::new(700, 2)).await;
        let bob_order = place_order(&db, bob_id, bob_profile, Decimal::new(900, 2)).await;

        let alice = Requestor { user_id: alice_id, role: Role::User };
        let seen = list_orders(&db, &alice).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, alice_order.id);

        let admin = Requestor { user_id: admin_id, role: Role::Admin };
        let all = list_orders(&db, &admin).await.unwrap();
        assert_eq!(all.len(), 2);
        //newest first
        assert_eq!(all[0].id, bob_order.id);
    }

    #[tokio::test]
    async fn foreign_orders_read_as_missing() {
        let db = test_support::db().await;
        let (alice_id, alice_profile) = test_support::user_with_profile(&db, "alice").await;
        let (bob_id, _) = test_support::user_with_profile(&db, "bob").await;

        let order = place_order(&db, alice_id, alice_profile, Decimal::new(700, 2)).await;

        let bob = Requestor { user_id: bob_id, role: Role::User };
        let hidden = get_order(&db, order.id, &bob).await;
        assert!(matches!(hidden, Err(StoreError::NotFound("order"))));

        let alice = Requestor { user_id: alice_id, role: Role::User };
        let visible = get_order(&db, order.id, &alice).await.unwrap();
        assert_eq!(visible.id, order.id);
    }

    #[tokio::test]
    async fn payment_status_is_admin_only_and_permissive() {
        let db = test_support::db().await;
        let (alice_id, alice_profile) = test_support::user_with_profile(&db, "alice").await;
        let admin_id = test_support::bare_user(&db, "root").await;
        let order = place_order(&db, alice_id, alice_profile, Decimal::new(700, 2)).await;

        let alice = Requestor { user_id: alice_id, role: Role::User };
        let denied =
            set_payment_status(&db, order.id, PaymentStatus::Complete, &alice).await;
        assert!(matches!(denied, Err(StoreError::Forbidden)));

        let admin = Requestor { user_id: admin_id, role: Role::Admin };
        let updated = set_payment_status(&db, order.id, PaymentStatus::Complete, &admin)
            .await
            .unwrap();
        assert_eq!(updated.payment_status, PaymentStatus::Complete);

        //No transition rules: complete -> failed -> pending is allowed.
        set_payment_status(&db, order.id, PaymentStatus::Failed, &admin)
            .await
            .unwrap();
        let back = set_payment_status(&db, order.id, PaymentStatus::Pending, &admin)
            .await
            .unwrap();
        assert_eq!(back.payment_status, PaymentStatus::Pending);

        let missing =
            set_payment_status(&db, order.id + 99, PaymentStatus::Failed, &admin).await;
        assert!(matches!(missing, Err(StoreError::NotFound("order"))));
    }
}
