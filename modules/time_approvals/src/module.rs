use std::sync::Arc;

use arc_swap::ArcSwapOption;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::rest::{openapi::ApiDoc, routes};
use crate::config::TimeApprovalsConfig;
use crate::contract::client::TimeApprovalsApi;
use crate::domain::service::Services;
use crate::gateways::local::TimeApprovalsLocalClient;
use crate::infra::push::NotificationBroadcaster;
use crate::infra::scheduler::ReconcileWorker;
use crate::infra::storage::{
    migrations::Migrator, SeaOrmDirectory, SeaOrmNotificationRepository,
    SeaOrmTimeEntryRepository,
};

/// Module wiring: storage adapters, push channel, domain services and the
/// reconciliation worker. Lifecycle is `migrate` → `init` → `register_rest`
/// → `start`.
#[derive(Default)]
pub struct TimeApprovals {
    services: ArcSwapOption<Services>,
    worker: ArcSwapOption<ReconcileWorker>,
    directory: ArcSwapOption<SeaOrmDirectory<DatabaseConnection>>,
}

impl TimeApprovals {
    pub const NAME: &'static str = "time_approvals";

    pub fn new() -> Self {
        Self::default()
    }

    pub async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running time_approvals database migrations");
        Migrator::up(db, None).await?;
        info!("time_approvals database migrations completed successfully");
        Ok(())
    }

    pub async fn init(&self, cfg: &TimeApprovalsConfig, db: DatabaseConnection) -> anyhow::Result<()> {
        info!("Initializing time_approvals module");
        debug!(
            "Loaded time_approvals config: reconcile_interval={:?}, retention={:?}, locale={:?}",
            cfg.reconcile_interval, cfg.retention, cfg.locale
        );

        let service_config = cfg.to_service_config()?;
        let broadcaster = Arc::new(NotificationBroadcaster::new(cfg.push_capacity));
        let directory = Arc::new(SeaOrmDirectory::new(db.clone()));

        let services = Services::new(
            Arc::new(SeaOrmTimeEntryRepository::new(db.clone())),
            Arc::new(SeaOrmNotificationRepository::new(db)),
            directory.clone(),
            broadcaster.clone(),
            broadcaster,
            service_config,
        );

        let worker = ReconcileWorker::new(services.reconciler.clone(), cfg.reconcile_interval);

        self.directory.store(Some(directory));
        self.worker.store(Some(Arc::new(worker)));
        self.services.store(Some(Arc::new(services)));
        info!("time_approvals module initialized");
        Ok(())
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering time_approvals REST routes");
        let services = self.services()?;
        let router = routes::register_routes(router, &services)?;
        info!("time_approvals REST routes registered successfully");
        Ok(router)
    }

    /// Start the reconciliation worker; it stops when `cancel` fires.
    pub fn start(&self, cancel: CancellationToken) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        let worker = self
            .worker
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("time_approvals module not initialized"))?;
        Ok(worker.spawn(cancel))
    }

    /// In-process client for other modules
    pub fn client(&self) -> anyhow::Result<Arc<dyn TimeApprovalsApi>> {
        let services = self.services()?;
        Ok(Arc::new(TimeApprovalsLocalClient::new((*services).clone())))
    }

    /// Directory adapter, for provisioning tenant members
    pub fn directory(&self) -> anyhow::Result<Arc<SeaOrmDirectory<DatabaseConnection>>> {
        self.directory
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("time_approvals module not initialized"))
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        <ApiDoc as utoipa::OpenApi>::openapi()
    }

    fn services(&self) -> anyhow::Result<Arc<Services>> {
        self.services
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("time_approvals module not initialized"))
    }
}
