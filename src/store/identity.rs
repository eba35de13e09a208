//! Identity lookup: maps an authenticated principal (users.id) onto the
//! buyer/seller profile that owns domain records.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use super::errors::StoreError;
use crate::entities::profile;

pub async fn resolve_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Option<profile::Model>, StoreError> {
    let found = profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(found)
}
