//! Tenant-scoped query builders.
//!
//! Repositories start every statement from one of these helpers, so a
//! query without the tenant filter cannot be expressed through them.

use sea_orm::{ColumnTrait, DeleteMany, EntityTrait, QueryFilter, Select, UpdateMany};

use crate::contract::model::TenantScope;

/// Entity that carries a tenant column.
pub trait ScopableEntity: EntityTrait {
    fn tenant_col() -> Self::Column;
}

pub fn find_in<E: ScopableEntity>(scope: &TenantScope) -> Select<E> {
    E::find().filter(E::tenant_col().eq(scope.tenant_id()))
}

pub fn update_in<E: ScopableEntity>(scope: &TenantScope) -> UpdateMany<E> {
    E::update_many().filter(E::tenant_col().eq(scope.tenant_id()))
}

pub fn delete_in<E: ScopableEntity>(scope: &TenantScope) -> DeleteMany<E> {
    E::delete_many().filter(E::tenant_col().eq(scope.tenant_id()))
}
