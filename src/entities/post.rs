use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::entities::profile::Entity as Profile;

/// A seller's food listing. `price` is the live catalog price; orders keep
/// their own snapshot in `order_items.unit_price`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub delivery: bool,
    pub pick_up: bool,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub ready_date_time: DateTimeUtc,
    pub servings_available: i32,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_update: DateTimeUtc,
    pub profile_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Profile",
        from = "Column::ProfileId",
        to = "crate::entities::profile::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Profile,
    #[sea_orm(has_many = "crate::entities::post_category::Entity")]
    PostCategory,
    #[sea_orm(has_many = "crate::entities::cart_item::Entity")]
    CartItem,
    #[sea_orm(has_many = "crate::entities::order_item::Entity")]
    OrderItem,
}

impl Related<crate::entities::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<crate::entities::post_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostCategory.def()
    }
}

impl Related<crate::entities::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItem.def()
    }
}

impl Related<crate::entities::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<crate::entities::category::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::post_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::post_category::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
