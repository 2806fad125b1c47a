use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::infra::storage::scope::ScopableEntity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub tenant_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_entry_id: Option<Uuid>,
    pub metadata: Json,
    /// Idempotency key, only set for pending-approval rows.
    pub dedupe_key: Option<String>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopableEntity for Entity {
    fn tenant_col() -> Self::Column {
        Column::TenantId
    }
}
