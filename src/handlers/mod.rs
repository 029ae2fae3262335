pub mod appointments;
pub mod catalog;
pub mod clients;
pub mod clinics;
pub mod common;
pub mod dashboard;
pub mod invoices;
pub mod notifications;
pub mod pets;
pub mod products;
pub mod today_turns;
pub mod vaccinations;
pub mod visits;

use std::sync::Arc;

use crate::{
    db::DbPool,
    services::{
        appointments::AppointmentService, catalog::CatalogService, clients::ClientService,
        clinics::ClinicService, dashboard::DashboardService, invoices::InvoiceService,
        notifications::NotificationService, pets::PetService, products::ProductService,
        today_turns::TodayTurnService, vaccinations::VaccinationService, visits::VisitService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::middleware_helpers::clinic_scope::ClinicScope;
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub clinics: Arc<ClinicService>,
    pub clients: Arc<ClientService>,
    pub pets: Arc<PetService>,
    pub appointments: Arc<AppointmentService>,
    pub catalog: Arc<CatalogService>,
    pub products: Arc<ProductService>,
    pub invoices: Arc<InvoiceService>,
    pub visits: Arc<VisitService>,
    pub vaccinations: Arc<VaccinationService>,
    pub notifications: Arc<NotificationService>,
    pub today_turns: Arc<TodayTurnService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            clinics: Arc::new(ClinicService::new(db_pool.clone())),
            clients: Arc::new(ClientService::new(db_pool.clone())),
            pets: Arc::new(PetService::new(db_pool.clone())),
            appointments: Arc::new(AppointmentService::new(db_pool.clone())),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone())),
            invoices: Arc::new(InvoiceService::new(db_pool.clone())),
            visits: Arc::new(VisitService::new(db_pool.clone())),
            vaccinations: Arc::new(VaccinationService::new(db_pool.clone())),
            notifications: Arc::new(NotificationService::new(db_pool.clone())),
            today_turns: Arc::new(TodayTurnService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool)),
        }
    }
}
