use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use super::billing::round_money;
use crate::{
    db::DbPool,
    entities::{
        appointment, invoice, notification, payment, pet, product, today_turn,
        vaccination_record, AppointmentStatus, InvoiceStatus, TurnStatus,
    },
    errors::ServiceError,
};

const VACCINES_DUE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TurnCounts {
    pub waiting: u64,
    pub in_progress: u64,
    pub ready: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

/// Front-desk overview for one day
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub appointments_today: u64,
    pub turns: TurnCounts,
    /// Payments collected today
    pub revenue_today: Decimal,
    /// Issued or partially paid invoices
    pub open_invoices: u64,
    pub outstanding_balance: Decimal,
    pub low_stock_products: u64,
    pub vaccinations_due_soon: u64,
    pub unread_notifications: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, clinic_id: Uuid) -> Result<DashboardSummary, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();
        let day_start = today
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ServiceError::InternalError("invalid day start".to_string()))?;
        let day_end = day_start + Duration::days(1);

        let appointments_today = appointment::Entity::find()
            .filter(appointment::Column::ClinicId.eq(clinic_id))
            .filter(appointment::Column::StartsAt.gte(day_start))
            .filter(appointment::Column::StartsAt.lt(day_end))
            .filter(appointment::Column::Status.ne(AppointmentStatus::Cancelled))
            .count(db)
            .await?;

        let mut turns = TurnCounts::default();
        for turn in today_turn::Entity::find()
            .filter(today_turn::Column::ClinicId.eq(clinic_id))
            .filter(today_turn::Column::TurnDate.eq(today))
            .all(db)
            .await?
        {
            let slot = match turn.status {
                TurnStatus::Waiting => &mut turns.waiting,
                TurnStatus::InProgress => &mut turns.in_progress,
                TurnStatus::Ready => &mut turns.ready,
                TurnStatus::Delivered => &mut turns.delivered,
                TurnStatus::Cancelled => &mut turns.cancelled,
            };
            *slot += 1;
        }

        let revenue_today: Decimal = payment::Entity::find()
            .filter(payment::Column::ClinicId.eq(clinic_id))
            .filter(payment::Column::PaidAt.gte(day_start))
            .filter(payment::Column::PaidAt.lt(day_end))
            .all(db)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum();

        let open = invoice::Entity::find()
            .filter(invoice::Column::ClinicId.eq(clinic_id))
            .filter(
                invoice::Column::Status
                    .is_in([InvoiceStatus::Issued, InvoiceStatus::PartiallyPaid]),
            )
            .all(db)
            .await?;
        let outstanding_balance: Decimal = open.iter().map(|i| i.balance_due()).sum();

        let low_stock_products = product::Entity::find()
            .filter(product::Column::ClinicId.eq(clinic_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::TrackStock.eq(true))
            .all(db)
            .await?
            .iter()
            .filter(|p| p.is_low_stock())
            .count() as u64;

        let horizon = today + Duration::days(VACCINES_DUE_WINDOW_DAYS);
        let vaccinations_due_soon = vaccination_record::Entity::find()
            .inner_join(pet::Entity)
            .filter(vaccination_record::Column::ClinicId.eq(clinic_id))
            .filter(vaccination_record::Column::NextDueOn.lte(horizon))
            .filter(pet::Column::IsActive.eq(true))
            .count(db)
            .await?;

        let unread_notifications = notification::Entity::find()
            .filter(notification::Column::ClinicId.eq(clinic_id))
            .filter(notification::Column::ReadAt.is_null())
            .count(db)
            .await?;

        Ok(DashboardSummary {
            date: today,
            appointments_today,
            turns,
            revenue_today: round_money(revenue_today),
            open_invoices: open.len() as u64,
            outstanding_balance: round_money(outstanding_balance),
            low_stock_products,
            vaccinations_due_soon,
            unread_notifications,
        })
    }
}
