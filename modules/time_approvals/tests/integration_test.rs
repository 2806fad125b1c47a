mod common;

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use sea_orm::ConnectionTrait;
use time_approvals::{
    contract::{
        client::TimeApprovalsApi,
        error::TimeApprovalsError,
        model::{
            EntryFilter, EntryStatus, InboxQuery, NewNotice, NotificationKind,
            NotificationPayload, Principal, Role,
        },
    },
    domain::error::DomainError,
    gateways::local::TimeApprovalsLocalClient,
};
use uuid::Uuid;

use common::{day, full_day, hm, TestEnv};

async fn kinds_for(env: &TestEnv, who: &Principal) -> Vec<NotificationKind> {
    env.services
        .inbox
        .list(who, InboxQuery::default())
        .await
        .unwrap()
        .iter()
        .map(|n| n.kind())
        .collect()
}

#[tokio::test]
async fn approval_scenario_end_to_end() -> Result<()> {
    let env = TestEnv::new().await;
    let svc = &env.services;
    let scope = env.employee.scope();

    let entry = svc
        .approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;
    assert_eq!(entry.status, EntryStatus::Pending);

    // Tick 1: one notice per admin, none to the owner
    let tick1 = svc.reconciler.tick(&scope).await;
    assert!(tick1.is_clean());
    assert_eq!(tick1.discovered, 1);
    assert_eq!(tick1.created, 2);
    assert_eq!(kinds_for(&env, &env.admin_a).await, [NotificationKind::PendingApproval]);
    assert_eq!(kinds_for(&env, &env.admin_b).await, [NotificationKind::PendingApproval]);
    assert!(kinds_for(&env, &env.employee).await.is_empty());

    let notice = &svc.inbox.list(&env.admin_a, InboxQuery::default()).await?[0];
    assert_eq!(notice.related_entry_id(), Some(entry.id));
    assert!(notice.message.contains("Ana Souza"));
    assert!(notice.message.contains("2024-01-10"));

    // Tick 2: nothing changed
    let tick2 = svc.reconciler.tick(&scope).await;
    assert_eq!(tick2.created, 0);
    assert_eq!(tick2.closed, 0);

    // Approval emits exactly one owner-facing notice
    let approved = svc.approvals.approve(&env.admin_a, entry.id).await?;
    assert_eq!(approved.status, EntryStatus::Approved);
    let owner_inbox = svc.inbox.list(&env.employee, InboxQuery::default()).await?;
    assert_eq!(owner_inbox.len(), 1);
    match &owner_inbox[0].payload {
        NotificationPayload::Approved {
            entry_id,
            entry_date,
            decided_by,
        } => {
            assert_eq!(*entry_id, entry.id);
            assert_eq!(*entry_date, day(2024, 1, 10));
            assert_eq!(*decided_by, env.admin_a.user_id);
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    // Tick 3 closes both admins' notices
    let tick3 = svc.reconciler.tick(&scope).await;
    assert_eq!(tick3.closed, 2);
    assert_eq!(tick3.created, 0);
    assert_eq!(svc.inbox.unread_count(&env.admin_a).await?, 0);
    assert_eq!(svc.inbox.unread_count(&env.admin_b).await?, 0);
    assert_eq!(svc.inbox.unread_count(&env.employee).await?, 1);
    Ok(())
}

#[tokio::test]
async fn duplicate_day_is_rejected() -> Result<()> {
    let env = TestEnv::new().await;
    let approvals = &env.services.approvals;

    approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;
    let err = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateEntry { .. }));

    // Another user may record the same day
    approvals
        .create_entry(&env.admin_a, full_day(day(2024, 1, 10)))
        .await?;
    Ok(())
}

#[tokio::test]
async fn first_shift_entry_is_required() {
    let env = TestEnv::new().await;
    let mut new_entry = full_day(day(2024, 1, 10));
    new_entry.shift1.entry = None;

    let err = env
        .services
        .approvals
        .create_entry(&env.employee, new_entry)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "shift1.entry"));
}

#[tokio::test]
async fn employees_cannot_decide() -> Result<()> {
    let env = TestEnv::new().await;
    let approvals = &env.services.approvals;
    let entry = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;

    let err = approvals.approve(&env.employee, entry.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    // No side effects
    let stored = approvals.get_entry(&env.admin_a, entry.id).await?;
    assert_eq!(stored.status, EntryStatus::Pending);
    assert!(kinds_for(&env, &env.employee).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn decisions_can_be_reversed_but_not_repeated() -> Result<()> {
    let env = TestEnv::new().await;
    let approvals = &env.services.approvals;
    let entry = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;

    approvals.approve(&env.admin_a, entry.id).await?;
    let err = approvals.approve(&env.admin_b, entry.id).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::InvalidTransition {
            from: EntryStatus::Approved,
            to: EntryStatus::Approved
        }
    ));

    let rejected = approvals
        .reject(&env.admin_b, entry.id, Some("  missing lunch break  ".into()))
        .await?;
    assert_eq!(rejected.status, EntryStatus::Rejected);

    let inbox = env
        .services
        .inbox
        .list(&env.employee, InboxQuery::default())
        .await?;
    assert_eq!(inbox.len(), 2);
    // Newest first
    match &inbox[0].payload {
        NotificationPayload::Rejected { reason, .. } => {
            assert_eq!(reason.as_deref(), Some("missing lunch break"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
    assert!(inbox[0].message.contains("missing lunch break"));
    Ok(())
}

#[tokio::test]
async fn failed_owner_notice_leaves_entry_pending() -> Result<()> {
    let env = TestEnv::new().await;
    let approvals = &env.services.approvals;
    let entry = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;
    let mut events = env.broadcaster.subscribe_stream().boxed();

    // The owner's notice cannot be written
    env.db
        .execute_unprepared("DROP TABLE notifications")
        .await?;

    let err = approvals.approve(&env.admin_a, entry.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Database { .. }));

    let stored = approvals.get_entry(&env.admin_a, entry.id).await?;
    assert_eq!(stored.status, EntryStatus::Pending);

    // A retry hits the same failure instead of a lost transition
    let err = approvals.reject(&env.admin_b, entry.id, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Database { .. }));
    assert_eq!(
        approvals.get_entry(&env.admin_a, entry.id).await?.status,
        EntryStatus::Pending
    );

    // Nothing was pushed for the rolled-back decisions
    let pushed = tokio::time::timeout(std::time::Duration::from_millis(50), events.next()).await;
    assert!(pushed.is_err());
    Ok(())
}

#[tokio::test]
async fn tenants_are_isolated() -> Result<()> {
    let env = TestEnv::new().await;
    let entry = env
        .services
        .approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;

    let outsider = Principal::new(Uuid::new_v4(), Uuid::new_v4(), Role::Admin);
    let err = env
        .services
        .approvals
        .approve(&outsider, entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EntryNotFound { .. }));

    let pending = env.services.approvals.list_pending(&outsider).await?;
    assert!(pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn one_day_per_owner_is_counted_per_tenant() -> Result<()> {
    let env = TestEnv::new().await;
    let second_tenant = Uuid::new_v4();
    // Same person, also employed by another tenant
    let elsewhere = Principal::new(env.employee.user_id, second_tenant, Role::Employee);
    env.add_member(&elsewhere, "Ana Souza").await;

    let first = env
        .services
        .approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;
    let second = env
        .services
        .approvals
        .create_entry(&elsewhere, full_day(day(2024, 1, 10)))
        .await?;
    assert_ne!(first.id, second.id);
    assert_eq!(second.tenant_id, second_tenant);

    // Still one per tenant
    let err = env
        .services
        .approvals
        .create_entry(&elsewhere, full_day(day(2024, 1, 10)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateEntry { .. }));
    Ok(())
}

#[tokio::test]
async fn employees_only_see_their_own_entries() -> Result<()> {
    let env = TestEnv::new().await;
    let approvals = &env.services.approvals;
    let other = Principal::new(Uuid::new_v4(), env.tenant_id, Role::Employee);
    env.add_member(&other, "Davi Rocha").await;

    let mine = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;
    let theirs = approvals
        .create_entry(&other, full_day(day(2024, 1, 10)))
        .await?;

    let listed = approvals
        .list_entries(&env.employee, EntryFilter::default())
        .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.id);

    let err = approvals
        .get_entry(&env.employee, theirs.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EntryNotFound { .. }));

    let err = approvals
        .list_entries(
            &env.employee,
            EntryFilter {
                owner_id: Some(other.user_id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    let all = approvals
        .list_entries(&env.admin_a, EntryFilter::default())
        .await?;
    assert_eq!(all.len(), 2);
    Ok(())
}

#[tokio::test]
async fn summaries_follow_entry_status() -> Result<()> {
    let env = TestEnv::new().await;
    let approvals = &env.services.approvals;

    // Mon..Wed of the week of 2024-01-08
    let mon = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 8)))
        .await?;
    let tue = approvals
        .create_entry(&env.employee, full_day(day(2024, 1, 9)))
        .await?;
    let mut short = full_day(day(2024, 1, 10));
    short.shift2 = Default::default();
    short.shift1.exit = Some(hm(12, 0));
    approvals.create_entry(&env.employee, short).await?;

    approvals.approve(&env.admin_a, mon.id).await?;
    approvals.reject(&env.admin_a, tue.id, None).await?;

    let week = approvals
        .weekly_summary(&env.employee, day(2024, 1, 11))
        .await?;
    assert_eq!(week.week_start, day(2024, 1, 8));
    assert_eq!(week.days.len(), 7);
    assert_eq!(week.days[0].minutes, 540);
    assert_eq!(week.days[1].minutes, 0);
    assert_eq!(week.days[1].status, Some(EntryStatus::Rejected));
    assert_eq!(week.days[2].minutes, 240);
    assert_eq!(week.total, 780);

    let period = approvals
        .period_summary(&env.employee, day(2024, 1, 8), day(2024, 1, 12))
        .await?;
    assert_eq!(period.working_days, 5);
    assert_eq!(period.worked, 780);
    assert_eq!(period.overtime, 60);
    assert_eq!(period.balance.to_string(), "-27:00");

    let err = approvals
        .period_summary(&env.employee, day(2024, 1, 12), day(2024, 1, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    Ok(())
}

#[tokio::test]
async fn inbox_read_state_and_ownership() -> Result<()> {
    let env = TestEnv::new().await;
    let inbox = &env.services.inbox;

    for note in ["first", "second", "third"] {
        inbox
            .send_notice(
                &env.admin_a,
                NewNotice {
                    recipient_id: env.employee.user_id,
                    kind: NotificationKind::Reminder,
                    note: note.into(),
                },
            )
            .await?;
    }
    assert_eq!(inbox.unread_count(&env.employee).await?, 3);

    let items = inbox.list(&env.employee, InboxQuery::default()).await?;
    let first = items[0].id;

    // Someone else's notification looks missing
    let err = inbox.mark_read(&env.admin_b, first).await.unwrap_err();
    assert!(matches!(err, DomainError::NotificationNotFound { .. }));

    inbox.mark_read(&env.employee, first).await?;
    inbox.mark_read(&env.employee, first).await?;
    assert_eq!(inbox.unread_count(&env.employee).await?, 2);

    let unread = inbox
        .list(
            &env.employee,
            InboxQuery {
                unread_only: true,
                limit: None,
            },
        )
        .await?;
    assert_eq!(unread.len(), 2);
    assert!(unread.iter().all(|n| !n.read));

    let limited = inbox
        .list(
            &env.employee,
            InboxQuery {
                unread_only: false,
                limit: Some(1),
            },
        )
        .await?;
    assert_eq!(limited.len(), 1);

    assert_eq!(inbox.mark_all_read(&env.employee).await?, 2);
    assert_eq!(inbox.unread_count(&env.employee).await?, 0);

    inbox.delete(&env.employee, first).await?;
    let err = inbox.delete(&env.employee, first).await.unwrap_err();
    assert!(matches!(err, DomainError::NotificationNotFound { .. }));
    assert_eq!(inbox.list(&env.employee, InboxQuery::default()).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn notices_need_an_admin_and_a_member() -> Result<()> {
    let env = TestEnv::new().await;
    let inbox = &env.services.inbox;

    let err = inbox
        .send_notice(
            &env.employee,
            NewNotice {
                recipient_id: env.admin_a.user_id,
                kind: NotificationKind::Report,
                note: "weekly report".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    let err = inbox
        .send_notice(
            &env.admin_a,
            NewNotice {
                recipient_id: Uuid::new_v4(),
                kind: NotificationKind::System,
                note: "maintenance tonight".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "recipient_id"));

    let err = inbox
        .send_notice(
            &env.admin_a,
            NewNotice {
                recipient_id: env.employee.user_id,
                kind: NotificationKind::Approved,
                note: "forged".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    Ok(())
}

#[tokio::test]
async fn local_client_maps_errors_to_contract() -> Result<()> {
    let env = TestEnv::new().await;
    let client: Arc<dyn TimeApprovalsApi> =
        Arc::new(TimeApprovalsLocalClient::new(env.services.clone()));

    let entry = client
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await?;
    let err = client
        .create_entry(&env.employee, full_day(day(2024, 1, 10)))
        .await
        .unwrap_err();
    assert!(matches!(err, TimeApprovalsError::Conflict { .. }));

    let err = client.approve(&env.employee, entry.id).await.unwrap_err();
    assert!(matches!(err, TimeApprovalsError::Forbidden { .. }));

    let err = client
        .get_entry(&env.employee, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, TimeApprovalsError::NotFound { .. }));

    let report = client.reconcile_now(&env.admin_b).await?;
    assert_eq!(report.created, 2);

    let pending = client.list_pending(&env.admin_a).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(client.unread_count(&env.admin_a).await?, 1);
    Ok(())
}
