#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use time_approvals::{
    contract::model::{Member, NewTimeEntry, Principal, Role, ShiftLeg},
    domain::service::{ServiceConfig, Services},
    infra::push::NotificationBroadcaster,
    infra::storage::{
        migrations::Migrator, SeaOrmDirectory, SeaOrmNotificationRepository,
        SeaOrmTimeEntryRepository,
    },
};

/// Fresh in-memory database with migrations applied
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// One tenant with an employee and two admins, wired over SQLite.
pub struct TestEnv {
    pub db: DatabaseConnection,
    pub services: Services,
    pub directory: Arc<SeaOrmDirectory<DatabaseConnection>>,
    pub notifications: Arc<SeaOrmNotificationRepository<DatabaseConnection>>,
    pub broadcaster: Arc<NotificationBroadcaster>,
    pub tenant_id: Uuid,
    pub employee: Principal,
    pub admin_a: Principal,
    pub admin_b: Principal,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::default()).await
    }

    pub async fn with_config(config: ServiceConfig) -> Self {
        let db = create_test_db().await;
        let directory = Arc::new(SeaOrmDirectory::new(db.clone()));
        let notifications = Arc::new(SeaOrmNotificationRepository::new(db.clone()));
        let broadcaster = Arc::new(NotificationBroadcaster::new(64));

        let services = Services::new(
            Arc::new(SeaOrmTimeEntryRepository::new(db.clone())),
            notifications.clone(),
            directory.clone(),
            broadcaster.clone(),
            broadcaster.clone(),
            config,
        );

        let tenant_id = Uuid::new_v4();
        let employee = Principal::new(Uuid::new_v4(), tenant_id, Role::Employee);
        let admin_a = Principal::new(Uuid::new_v4(), tenant_id, Role::Admin);
        let admin_b = Principal::new(Uuid::new_v4(), tenant_id, Role::Admin);

        let env = Self {
            db,
            services,
            directory,
            notifications,
            broadcaster,
            tenant_id,
            employee,
            admin_a,
            admin_b,
        };
        env.add_member(&env.employee, "Ana Souza").await;
        env.add_member(&env.admin_a, "Bruno Lima").await;
        env.add_member(&env.admin_b, "Carla Dias").await;
        env
    }

    pub async fn add_member(&self, principal: &Principal, name: &str) {
        self.directory
            .upsert_member(Member {
                user_id: principal.user_id,
                tenant_id: principal.tenant_id,
                display_name: name.to_string(),
                role: principal.role,
            })
            .await
            .expect("Failed to seed member");
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 08:00-12:00 and 13:00-18:00: nine worked hours
pub fn full_day(date: NaiveDate) -> NewTimeEntry {
    NewTimeEntry {
        date,
        shift1: ShiftLeg::closed(hm(8, 0), hm(12, 0)),
        shift2: ShiftLeg::closed(hm(13, 0), hm(18, 0)),
        observation: None,
    }
}
