use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::contract::model::{Member, TenantScope};
use crate::domain::events::PushItem;

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}

/// Push side of the inbox: a live feed of inserts for one recipient.
///
/// Delivery is a hint to re-fetch. A slow consumer loses events but is told
/// so with [`PushItem::Resync`].
pub trait InboxFeed: Send + Sync + 'static {
    fn subscribe(&self, recipient_id: Uuid, tenant_id: Uuid) -> BoxStream<'static, PushItem>;
}

/// User directory collaborator.
#[async_trait]
pub trait DirectoryPort: Send + Sync {
    /// Members holding the admin role in the tenant.
    async fn admins(&self, scope: &TenantScope) -> anyhow::Result<Vec<Member>>;

    async fn member(&self, scope: &TenantScope, user_id: Uuid) -> anyhow::Result<Option<Member>>;

    /// Every tenant known to the directory.
    async fn tenants(&self) -> anyhow::Result<Vec<Uuid>>;
}
