use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::infra::storage::scope::ScopableEntity;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "time_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub shift1_entry: Option<NaiveTime>,
    pub shift1_exit: Option<NaiveTime>,
    pub shift2_entry: Option<NaiveTime>,
    pub shift2_exit: Option<NaiveTime>,
    pub observation: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopableEntity for Entity {
    fn tenant_col() -> Self::Column {
        Column::TenantId
    }
}
