use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_clinics_and_clients::Migration),
            Box::new(m20240101_000002_create_pets_and_appointments::Migration),
            Box::new(m20240101_000003_create_catalog_and_stock::Migration),
            Box::new(m20240101_000004_create_invoicing::Migration),
            Box::new(m20240101_000005_create_clinical_records::Migration),
            Box::new(m20240101_000006_create_notifications_and_turns::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_clinics_and_clients {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_clinics_and_clients"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clinics::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Clinics::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Clinics::Name).string().not_null())
                        .col(ColumnDef::new(Clinics::LegalName).string().null())
                        .col(ColumnDef::new(Clinics::TaxId).string().null())
                        .col(ColumnDef::new(Clinics::Phone).string().null())
                        .col(ColumnDef::new(Clinics::Email).string().null())
                        .col(ColumnDef::new(Clinics::Address).string().null())
                        .col(
                            ColumnDef::new(Clinics::Currency)
                                .string_len(3)
                                .not_null()
                                .default("USD"),
                        )
                        .col(
                            ColumnDef::new(Clinics::DefaultTaxRate)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Clinics::InvoicePrefix)
                                .string_len(16)
                                .not_null()
                                .default("INV"),
                        )
                        .col(ColumnDef::new(Clinics::Schedule).json().null())
                        .col(
                            ColumnDef::new(Clinics::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clinics::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Clients::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Clients::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Clients::FirstName).string().not_null())
                        .col(ColumnDef::new(Clients::LastName).string().not_null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(ColumnDef::new(Clients::Email).string().null())
                        .col(ColumnDef::new(Clients::Address).string().null())
                        .col(ColumnDef::new(Clients::DocumentId).string().null())
                        .col(ColumnDef::new(Clients::Notes).text().null())
                        .col(
                            ColumnDef::new(Clients::ArchivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clients::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_clients_clinic_id")
                                .from(Clients::Table, Clients::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_clinic_last_name")
                        .table(Clients::Table)
                        .col(Clients::ClinicId)
                        .col(Clients::LastName)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Clinics::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Clinics {
        Table,
        Id,
        Name,
        LegalName,
        TaxId,
        Phone,
        Email,
        Address,
        Currency,
        DefaultTaxRate,
        InvoicePrefix,
        Schedule,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Clients {
        Table,
        Id,
        ClinicId,
        FirstName,
        LastName,
        Phone,
        Email,
        Address,
        DocumentId,
        Notes,
        ArchivedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_pets_and_appointments {
    use super::m20240101_000001_create_clinics_and_clients::{Clients, Clinics};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_pets_and_appointments"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Pets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Pets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Pets::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Pets::ClientId).uuid().not_null())
                        .col(ColumnDef::new(Pets::Name).string().not_null())
                        .col(ColumnDef::new(Pets::Species).string_len(16).not_null())
                        .col(ColumnDef::new(Pets::Breed).string().null())
                        .col(
                            ColumnDef::new(Pets::Sex)
                                .string_len(16)
                                .not_null()
                                .default("UNKNOWN"),
                        )
                        .col(ColumnDef::new(Pets::BirthDate).date().null())
                        .col(ColumnDef::new(Pets::WeightKg).decimal_len(8, 2).null())
                        .col(ColumnDef::new(Pets::Color).string().null())
                        .col(ColumnDef::new(Pets::Microchip).string().null())
                        .col(
                            ColumnDef::new(Pets::IsNeutered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Pets::Notes).text().null())
                        .col(
                            ColumnDef::new(Pets::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Pets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Pets::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pets_clinic_id")
                                .from(Pets::Table, Pets::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pets_client_id")
                                .from(Pets::Table, Pets::ClientId)
                                .to(Clients::Table, Clients::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pets_client_id")
                        .table(Pets::Table)
                        .col(Pets::ClientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Appointments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Appointments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Appointments::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Appointments::ClientId).uuid().not_null())
                        .col(ColumnDef::new(Appointments::PetId).uuid().not_null())
                        .col(ColumnDef::new(Appointments::ServiceId).uuid().null())
                        .col(
                            ColumnDef::new(Appointments::StartsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::EndsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Appointments::VetName).string().null())
                        .col(ColumnDef::new(Appointments::Reason).string().null())
                        .col(ColumnDef::new(Appointments::Notes).text().null())
                        .col(
                            ColumnDef::new(Appointments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Appointments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_clinic_id")
                                .from(Appointments::Table, Appointments::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_client_id")
                                .from(Appointments::Table, Appointments::ClientId)
                                .to(Clients::Table, Clients::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_appointments_pet_id")
                                .from(Appointments::Table, Appointments::PetId)
                                .to(Pets::Table, Pets::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_appointments_clinic_starts_at")
                        .table(Appointments::Table)
                        .col(Appointments::ClinicId)
                        .col(Appointments::StartsAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Appointments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Pets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Pets {
        Table,
        Id,
        ClinicId,
        ClientId,
        Name,
        Species,
        Breed,
        Sex,
        BirthDate,
        WeightKg,
        Color,
        Microchip,
        IsNeutered,
        Notes,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Appointments {
        Table,
        Id,
        ClinicId,
        ClientId,
        PetId,
        ServiceId,
        StartsAt,
        EndsAt,
        Status,
        VetName,
        Reason,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_catalog_and_stock {
    use super::m20240101_000001_create_clinics_and_clients::Clinics;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_catalog_and_stock"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Services::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Services::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Services::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Services::Name).string().not_null())
                        .col(ColumnDef::new(Services::Category).string().null())
                        .col(ColumnDef::new(Services::Description).text().null())
                        .col(
                            ColumnDef::new(Services::Price)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Services::TaxRate)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Services::DurationMinutes).integer().null())
                        .col(
                            ColumnDef::new(Services::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Services::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Services::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_services_clinic_id")
                                .from(Services::Table, Services::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().null())
                        .col(ColumnDef::new(Products::Category).string().null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::CostPrice).decimal_len(12, 2).null())
                        .col(
                            ColumnDef::new(Products::TaxRate)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::TrackStock)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::StockOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::MinStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Unit).string().null())
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_clinic_id")
                                .from(Products::Table, Products::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::PreviousQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::NewQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ReferenceType).string().null())
                        .col(ColumnDef::new(StockMovements::ReferenceId).uuid().null())
                        .col(ColumnDef::new(StockMovements::Reason).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_product_id")
                                .from(StockMovements::Table, StockMovements::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_product_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::ProductId)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Services::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Services {
        Table,
        Id,
        ClinicId,
        Name,
        Category,
        Description,
        Price,
        TaxRate,
        DurationMinutes,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        ClinicId,
        Name,
        Sku,
        Category,
        Description,
        UnitPrice,
        CostPrice,
        TaxRate,
        TrackStock,
        StockOnHand,
        MinStock,
        Unit,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        ClinicId,
        ProductId,
        MovementType,
        Quantity,
        PreviousQuantity,
        NewQuantity,
        ReferenceType,
        ReferenceId,
        Reason,
        CreatedAt,
    }
}

mod m20240101_000004_create_invoicing {
    use super::m20240101_000001_create_clinics_and_clients::{Clients, Clinics};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_invoicing"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Invoices::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::ClientId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::PetId).uuid().null())
                        .col(ColumnDef::new(Invoices::AppointmentId).uuid().null())
                        .col(ColumnDef::new(Invoices::Number).string_len(64).not_null())
                        .col(ColumnDef::new(Invoices::Sequence).integer().not_null())
                        .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                        .col(ColumnDef::new(Invoices::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Invoices::Subtotal).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Invoices::Discount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Invoices::TaxRate).decimal_len(5, 2).not_null())
                        .col(ColumnDef::new(Invoices::TaxAmount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Invoices::Total).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Invoices::AmountPaid)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Invoices::Notes).text().null())
                        .col(
                            ColumnDef::new(Invoices::VoidedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Invoices::VoidReason).string().null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_clinic_id")
                                .from(Invoices::Table, Invoices::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_client_id")
                                .from(Invoices::Table, Invoices::ClientId)
                                .to(Clients::Table, Clients::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // Guards the per-day numbering against concurrent writers
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_invoices_clinic_number")
                        .table(Invoices::Table)
                        .col(Invoices::ClinicId)
                        .col(Invoices::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_clinic_issue_date")
                        .table(Invoices::Table)
                        .col(Invoices::ClinicId)
                        .col(Invoices::IssueDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(InvoiceItems::ItemType).string_len(16).not_null())
                        .col(ColumnDef::new(InvoiceItems::ServiceId).uuid().null())
                        .col(ColumnDef::new(InvoiceItems::ProductId).uuid().null())
                        .col(ColumnDef::new(InvoiceItems::Description).string().not_null())
                        .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::TaxRate).decimal_len(5, 2).not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::LineTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::Position).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice_id")
                                .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Payments::Method).string_len(16).not_null())
                        .col(ColumnDef::new(Payments::Reference).string().null())
                        .col(
                            ColumnDef::new(Payments::PaidAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_invoice_id")
                                .from(Payments::Table, Payments::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_clinic_paid_at")
                        .table(Payments::Table)
                        .col(Payments::ClinicId)
                        .col(Payments::PaidAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Invoices {
        Table,
        Id,
        ClinicId,
        ClientId,
        PetId,
        AppointmentId,
        Number,
        Sequence,
        IssueDate,
        Status,
        Subtotal,
        Discount,
        TaxRate,
        TaxAmount,
        Total,
        AmountPaid,
        Notes,
        VoidedAt,
        VoidReason,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        ItemType,
        ServiceId,
        ProductId,
        Description,
        Quantity,
        UnitPrice,
        TaxRate,
        LineTotal,
        Position,
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        ClinicId,
        InvoiceId,
        Amount,
        Method,
        Reference,
        PaidAt,
        CreatedAt,
    }
}

mod m20240101_000005_create_clinical_records {
    use super::m20240101_000001_create_clinics_and_clients::Clinics;
    use super::m20240101_000002_create_pets_and_appointments::Pets;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_clinical_records"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ClinicalVisits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClinicalVisits::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ClinicalVisits::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(ClinicalVisits::PetId).uuid().not_null())
                        .col(ColumnDef::new(ClinicalVisits::AppointmentId).uuid().null())
                        .col(
                            ColumnDef::new(ClinicalVisits::VisitDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ClinicalVisits::VetName).string().null())
                        .col(ColumnDef::new(ClinicalVisits::Reason).string().null())
                        .col(ColumnDef::new(ClinicalVisits::Anamnesis).text().null())
                        .col(ColumnDef::new(ClinicalVisits::PhysicalExam).text().null())
                        .col(ColumnDef::new(ClinicalVisits::Diagnosis).text().null())
                        .col(ColumnDef::new(ClinicalVisits::Treatment).text().null())
                        .col(ColumnDef::new(ClinicalVisits::WeightKg).decimal_len(8, 2).null())
                        .col(
                            ColumnDef::new(ClinicalVisits::TemperatureC)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(ClinicalVisits::HeartRate).integer().null())
                        .col(ColumnDef::new(ClinicalVisits::FollowUpDate).date().null())
                        .col(ColumnDef::new(ClinicalVisits::Notes).text().null())
                        .col(
                            ColumnDef::new(ClinicalVisits::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClinicalVisits::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_clinical_visits_pet_id")
                                .from(ClinicalVisits::Table, ClinicalVisits::PetId)
                                .to(Pets::Table, Pets::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VaccineCatalog::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VaccineCatalog::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VaccineCatalog::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(VaccineCatalog::Name).string().not_null())
                        .col(ColumnDef::new(VaccineCatalog::Species).string_len(16).null())
                        .col(ColumnDef::new(VaccineCatalog::Manufacturer).string().null())
                        .col(
                            ColumnDef::new(VaccineCatalog::BoosterIntervalDays)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(VaccineCatalog::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(VaccineCatalog::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vaccine_catalog_clinic_id")
                                .from(VaccineCatalog::Table, VaccineCatalog::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VaccinationRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VaccinationRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VaccinationRecords::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(VaccinationRecords::PetId).uuid().not_null())
                        .col(ColumnDef::new(VaccinationRecords::VaccineId).uuid().null())
                        .col(
                            ColumnDef::new(VaccinationRecords::VaccineName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VaccinationRecords::AppliedOn).date().not_null())
                        .col(ColumnDef::new(VaccinationRecords::NextDueOn).date().null())
                        .col(ColumnDef::new(VaccinationRecords::BatchNumber).string().null())
                        .col(ColumnDef::new(VaccinationRecords::VetName).string().null())
                        .col(ColumnDef::new(VaccinationRecords::Notes).text().null())
                        .col(
                            ColumnDef::new(VaccinationRecords::ReminderSentAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(VaccinationRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vaccination_records_pet_id")
                                .from(VaccinationRecords::Table, VaccinationRecords::PetId)
                                .to(Pets::Table, Pets::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_vaccination_records_next_due_on")
                        .table(VaccinationRecords::Table)
                        .col(VaccinationRecords::ClinicId)
                        .col(VaccinationRecords::NextDueOn)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(VaccinationRecords::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(VaccineCatalog::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ClinicalVisits::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ClinicalVisits {
        Table,
        Id,
        ClinicId,
        PetId,
        AppointmentId,
        VisitDate,
        VetName,
        Reason,
        Anamnesis,
        PhysicalExam,
        Diagnosis,
        Treatment,
        WeightKg,
        TemperatureC,
        HeartRate,
        FollowUpDate,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum VaccineCatalog {
        Table,
        Id,
        ClinicId,
        Name,
        Species,
        Manufacturer,
        BoosterIntervalDays,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum VaccinationRecords {
        Table,
        Id,
        ClinicId,
        PetId,
        VaccineId,
        VaccineName,
        AppliedOn,
        NextDueOn,
        BatchNumber,
        VetName,
        Notes,
        ReminderSentAt,
        CreatedAt,
    }
}

mod m20240101_000006_create_notifications_and_turns {
    use super::m20240101_000001_create_clinics_and_clients::Clinics;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_notifications_and_turns"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Notifications::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(Notifications::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(Notifications::Title).string().not_null())
                        .col(ColumnDef::new(Notifications::Message).text().not_null())
                        .col(ColumnDef::new(Notifications::ReferenceType).string().null())
                        .col(ColumnDef::new(Notifications::ReferenceId).uuid().null())
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
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notifications_clinic_id")
                                .from(Notifications::Table, Notifications::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TodayTurns::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TodayTurns::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TodayTurns::ClinicId).uuid().not_null())
                        .col(ColumnDef::new(TodayTurns::ClientId).uuid().null())
                        .col(ColumnDef::new(TodayTurns::PetId).uuid().null())
                        .col(ColumnDef::new(TodayTurns::OwnerName).string().not_null())
                        .col(ColumnDef::new(TodayTurns::OwnerPhone).string().null())
                        .col(ColumnDef::new(TodayTurns::PetName).string().not_null())
                        .col(ColumnDef::new(TodayTurns::ServiceDescription).string().null())
                        .col(ColumnDef::new(TodayTurns::TurnDate).date().not_null())
                        .col(ColumnDef::new(TodayTurns::TicketNumber).integer().not_null())
                        .col(ColumnDef::new(TodayTurns::Status).string_len(16).not_null())
                        .col(
                            ColumnDef::new(TodayTurns::OwnerNotified)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(TodayTurns::NotifiedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TodayTurns::StartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TodayTurns::ReadyAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TodayTurns::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TodayTurns::CancelledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(TodayTurns::Notes).text().null())
                        .col(
                            ColumnDef::new(TodayTurns::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TodayTurns::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_today_turns_clinic_id")
                                .from(TodayTurns::Table, TodayTurns::ClinicId)
                                .to(Clinics::Table, Clinics::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_today_turns_clinic_date_ticket")
                        .table(TodayTurns::Table)
                        .col(TodayTurns::ClinicId)
                        .col(TodayTurns::TurnDate)
                        .col(TodayTurns::TicketNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TodayTurns::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Notifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Notifications {
        Table,
        Id,
        ClinicId,
        Kind,
        Title,
        Message,
        ReferenceType,
        ReferenceId,
        ReadAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum TodayTurns {
        Table,
        Id,
        ClinicId,
        ClientId,
        PetId,
        OwnerName,
        OwnerPhone,
        PetName,
        ServiceDescription,
        TurnDate,
        TicketNumber,
        Status,
        OwnerNotified,
        NotifiedAt,
        StartedAt,
        ReadyAt,
        DeliveredAt,
        CancelledAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}
