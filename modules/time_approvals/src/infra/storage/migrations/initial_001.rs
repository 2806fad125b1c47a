use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TenantMembers {
    Table,
    UserId,
    TenantId,
    DisplayName,
    Role,
}

#[derive(DeriveIden)]
enum TimeEntries {
    Table,
    Id,
    OwnerId,
    TenantId,
    Date,
    #[sea_orm(iden = "shift1_entry")]
    Shift1Entry,
    #[sea_orm(iden = "shift1_exit")]
    Shift1Exit,
    #[sea_orm(iden = "shift2_entry")]
    Shift2Entry,
    #[sea_orm(iden = "shift2_exit")]
    Shift2Exit,
    Observation,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    RecipientId,
    TenantId,
    Kind,
    Title,
    Message,
    RelatedEntryId,
    Metadata,
    DedupeKey,
    Read,
    ReadAt,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TenantMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TenantMembers::UserId).uuid().not_null())
                    .col(ColumnDef::new(TenantMembers::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TenantMembers::DisplayName).string().not_null())
                    .col(ColumnDef::new(TenantMembers::Role).string_len(16).not_null())
                    .primary_key(
                        Index::create()
                            .col(TenantMembers::UserId)
                            .col(TenantMembers::TenantId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TimeEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimeEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TimeEntries::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(TimeEntries::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TimeEntries::Date).date().not_null())
                    .col(ColumnDef::new(TimeEntries::Shift1Entry).time().null())
                    .col(ColumnDef::new(TimeEntries::Shift1Exit).time().null())
                    .col(ColumnDef::new(TimeEntries::Shift2Entry).time().null())
                    .col(ColumnDef::new(TimeEntries::Shift2Exit).time().null())
                    .col(ColumnDef::new(TimeEntries::Observation).text().null())
                    .col(ColumnDef::new(TimeEntries::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(TimeEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TimeEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One entry per owner per day
        manager
            .create_index(
                Index::create()
                    .name("ux_time_entries_tenant_owner_date")
                    .table(TimeEntries::Table)
                    .col(TimeEntries::TenantId)
                    .col(TimeEntries::OwnerId)
                    .col(TimeEntries::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_time_entries_tenant_status")
                    .table(TimeEntries::Table)
                    .col(TimeEntries::TenantId)
                    .col(TimeEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::RecipientId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::RelatedEntryId).uuid().null())
                    .col(ColumnDef::new(Notifications::Metadata).json().not_null())
                    .col(ColumnDef::new(Notifications::DedupeKey).string().null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::ReadAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Idempotency key; NULLs (non pending-approval rows) never collide
        manager
            .create_index(
                Index::create()
                    .name("ux_notifications_dedupe_key")
                    .table(Notifications::Table)
                    .col(Notifications::DedupeKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_notifications_inbox")
                    .table(Notifications::Table)
                    .col(Notifications::RecipientId)
                    .col(Notifications::TenantId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_notifications_related_entry")
                    .table(Notifications::Table)
                    .col(Notifications::RelatedEntryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimeEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TenantMembers::Table).to_owned())
            .await?;
        Ok(())
    }
}
