//! Conversions between SeaORM rows and contract models.

use anyhow::{anyhow, Context};
use sea_orm::Set;

use crate::contract::model::{
    EntryStatus, Member, Notification, NotificationKind, NotificationPayload, Role, ShiftLeg,
    TimeEntry,
};
use crate::infra::storage::entity::{notification, tenant_member, time_entry};

impl TryFrom<time_entry::Model> for TimeEntry {
    type Error = anyhow::Error;

    fn try_from(m: time_entry::Model) -> Result<Self, Self::Error> {
        let status = EntryStatus::parse(&m.status)
            .ok_or_else(|| anyhow!("unknown entry status '{}' on {}", m.status, m.id))?;
        Ok(TimeEntry {
            id: m.id,
            owner_id: m.owner_id,
            tenant_id: m.tenant_id,
            date: m.date,
            shift1: ShiftLeg::new(m.shift1_entry, m.shift1_exit),
            shift2: ShiftLeg::new(m.shift2_entry, m.shift2_exit),
            observation: m.observation,
            status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

pub fn entry_to_active(e: TimeEntry) -> time_entry::ActiveModel {
    time_entry::ActiveModel {
        id: Set(e.id),
        owner_id: Set(e.owner_id),
        tenant_id: Set(e.tenant_id),
        date: Set(e.date),
        shift1_entry: Set(e.shift1.entry),
        shift1_exit: Set(e.shift1.exit),
        shift2_entry: Set(e.shift2.entry),
        shift2_exit: Set(e.shift2.exit),
        observation: Set(e.observation),
        status: Set(e.status.as_str().to_string()),
        created_at: Set(e.created_at),
        updated_at: Set(e.updated_at),
    }
}

impl TryFrom<notification::Model> for Notification {
    type Error = anyhow::Error;

    fn try_from(m: notification::Model) -> Result<Self, Self::Error> {
        // The payload is authoritative; `kind` and `related_entry_id` columns
        // exist for filtering only.
        let payload: NotificationPayload = serde_json::from_value(m.metadata)
            .with_context(|| format!("malformed metadata on notification {}", m.id))?;
        Ok(Notification {
            id: m.id,
            recipient_id: m.recipient_id,
            tenant_id: m.tenant_id,
            title: m.title,
            message: m.message,
            payload,
            read: m.read,
            read_at: m.read_at,
            created_at: m.created_at,
        })
    }
}

/// Idempotency key for pending-approval notices: `{entry}:{recipient}:pending_approval`.
pub fn dedupe_key(n: &Notification) -> Option<String> {
    match &n.payload {
        NotificationPayload::PendingApproval { entry_id, .. } => Some(format!(
            "{}:{}:{}",
            entry_id,
            n.recipient_id,
            pending_approval_kind()
        )),
        _ => None,
    }
}

pub fn notification_to_active(n: Notification) -> anyhow::Result<notification::ActiveModel> {
    let metadata = serde_json::to_value(&n.payload).context("serialize notification payload")?;
    let kind = n.kind().as_str().to_string();
    let related_entry_id = n.related_entry_id();
    let key = dedupe_key(&n);
    Ok(notification::ActiveModel {
        id: Set(n.id),
        recipient_id: Set(n.recipient_id),
        tenant_id: Set(n.tenant_id),
        kind: Set(kind),
        title: Set(n.title),
        message: Set(n.message),
        related_entry_id: Set(related_entry_id),
        metadata: Set(metadata),
        dedupe_key: Set(key),
        read: Set(n.read),
        read_at: Set(n.read_at),
        created_at: Set(n.created_at),
    })
}

pub fn pending_approval_kind() -> &'static str {
    NotificationKind::PendingApproval.as_str()
}

impl TryFrom<tenant_member::Model> for Member {
    type Error = anyhow::Error;

    fn try_from(m: tenant_member::Model) -> Result<Self, Self::Error> {
        let role = Role::parse(&m.role)
            .ok_or_else(|| anyhow!("unknown role '{}' for member {}", m.role, m.user_id))?;
        Ok(Member {
            user_id: m.user_id,
            tenant_id: m.tenant_id,
            display_name: m.display_name,
            role,
        })
    }
}

pub fn member_to_active(m: Member) -> tenant_member::ActiveModel {
    tenant_member::ActiveModel {
        user_id: Set(m.user_id),
        tenant_id: Set(m.tenant_id),
        display_name: Set(m.display_name),
        role: Set(m.role.as_str().to_string()),
    }
}
