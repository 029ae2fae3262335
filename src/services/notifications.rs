use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::PageRequest;
use crate::{
    db::{map_transaction_error, DbPool},
    entities::{notification, pet, vaccination_record, NotificationKind},
    errors::ServiceError,
    tracing::with_metrics,
};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct NotificationFilter {
    /// Only notifications that have not been read
    #[serde(default)]
    pub unread: bool,
    pub kind: Option<NotificationKind>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct MarkedCount {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReminderRun {
    pub window_days: i64,
    pub created: Vec<notification::Model>,
}

/// Appends a notification row; callers pass their transaction when inside one.
pub(crate) async fn push_notification<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    kind: NotificationKind,
    title: String,
    message: String,
    reference: Option<(&str, Uuid)>,
) -> Result<notification::Model, ServiceError> {
    let model = notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        clinic_id: Set(clinic_id),
        kind: Set(kind),
        title: Set(title),
        message: Set(message),
        reference_type: Set(reference.map(|(kind, _)| kind.to_string())),
        reference_id: Set(reference.map(|(_, id)| id)),
        read_at: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;
    Ok(model)
}

#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: NotificationFilter,
        page: PageRequest,
    ) -> Result<(Vec<notification::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query =
            notification::Entity::find().filter(notification::Column::ClinicId.eq(clinic_id));
        if filter.unread {
            query = query.filter(notification::Column::ReadAt.is_null());
        }
        if let Some(kind) = filter.kind {
            query = query.filter(notification::Column::Kind.eq(kind));
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok((items, total))
    }

    pub async fn create(
        &self,
        clinic_id: Uuid,
        kind: NotificationKind,
        title: String,
        message: String,
    ) -> Result<notification::Model, ServiceError> {
        push_notification(&*self.db_pool, clinic_id, kind, title, message, None).await
    }

    /// Idempotent; an already read notification keeps its original `read_at`.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        clinic_id: Uuid,
        id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = notification::Entity::find_by_id(id)
            .filter(notification::Column::ClinicId.eq(clinic_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Notification", id))?;
        if existing.read_at.is_some() {
            return Ok(existing);
        }

        let mut model: notification::ActiveModel = existing.into();
        model.read_at = Set(Some(Utc::now()));
        Ok(model.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, clinic_id: Uuid) -> Result<MarkedCount, ServiceError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notification::Column::ClinicId.eq(clinic_id))
            .filter(notification::Column::ReadAt.is_null())
            .exec(&*self.db_pool)
            .await?;
        info!(updated = result.rows_affected, "notifications marked read");
        Ok(MarkedCount {
            updated: result.rows_affected,
        })
    }

    pub async fn unread_count(&self, clinic_id: Uuid) -> Result<u64, ServiceError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::ClinicId.eq(clinic_id))
            .filter(notification::Column::ReadAt.is_null())
            .count(&*self.db_pool)
            .await?)
    }

    /// Creates one VACCINE_DUE notification per record due within `window_days`
    /// that has not been reminded yet, and stamps the record.
    #[instrument(skip(self))]
    pub async fn generate_vaccine_reminders(
        &self,
        clinic_id: Uuid,
        window_days: i64,
    ) -> Result<ReminderRun, ServiceError> {
        if !(0..=365).contains(&window_days) {
            return Err(ServiceError::field("days", "must be between 0 and 365"));
        }

        let created = with_metrics("vaccine_reminders", async {
            self.db_pool
                .transaction::<_, Vec<notification::Model>, ServiceError>(move |txn| {
                    Box::pin(async move {
                        let today = Utc::now().date_naive();
                        let horizon = today
                            .checked_add_signed(Duration::days(window_days))
                            .ok_or_else(|| {
                                ServiceError::field("days", "window falls outside the calendar")
                            })?;

                        let due = vaccination_record::Entity::find()
                            .find_also_related(pet::Entity)
                            .filter(vaccination_record::Column::ClinicId.eq(clinic_id))
                            .filter(vaccination_record::Column::NextDueOn.lte(horizon))
                            .filter(vaccination_record::Column::ReminderSentAt.is_null())
                            .order_by_asc(vaccination_record::Column::NextDueOn)
                            .all(txn)
                            .await?;

                        let now = Utc::now();
                        let mut created = Vec::with_capacity(due.len());
                        for (record, pet) in due {
                            let Some(pet) = pet.filter(|p| p.is_active) else {
                                continue;
                            };
                            let Some(due_on) = record.next_due_on else {
                                continue;
                            };
                            let message = if due_on < today {
                                format!(
                                    "{} is overdue for {} (was due {}).",
                                    pet.name, record.vaccine_name, due_on
                                )
                            } else {
                                format!("{} is due for {} on {}.", pet.name, record.vaccine_name, due_on)
                            };

                            let note = push_notification(
                                txn,
                                clinic_id,
                                NotificationKind::VaccineDue,
                                format!("Vaccine due: {}", pet.name),
                                message,
                                Some(("vaccination", record.id)),
                            )
                            .await?;
                            created.push(note);

                            let mut stamp: vaccination_record::ActiveModel = record.into();
                            stamp.reminder_sent_at = Set(Some(now));
                            stamp.update(txn).await?;
                        }
                        Ok(created)
                    })
                })
                .await
                .map_err(map_transaction_error)
        })
        .await?;

        info!(count = created.len(), window_days, "vaccine reminders generated");
        Ok(ReminderRun {
            window_days,
            created,
        })
    }
}
