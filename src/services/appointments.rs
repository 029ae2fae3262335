use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{clients::find_client, pets::find_pet, PageRequest};
use crate::{
    db::DbPool,
    entities::{appointment, service, AppointmentStatus},
    errors::{FieldErrorsBuilder, ServiceError},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAppointmentRequest {
    pub client_id: Uuid,
    pub pet_id: Uuid,
    pub service_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(length(max = 100))]
    pub vet_name: Option<String>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub service_id: Option<Uuid>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(length(max = 100))]
    pub vet_name: Option<String>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeAppointmentStatus {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AppointmentFilter {
    /// First day included
    pub from: Option<NaiveDate>,
    /// Last day included
    pub to: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub pet_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
}

fn check_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ServiceError> {
    let mut errors = FieldErrorsBuilder::new();
    if ends_at <= starts_at {
        errors.add("ends_at", "must be after starts_at");
    }
    errors.finish()
}

/// Whether an appointment may move from `from` to `to`.
/// Closed appointments only accept being re-opened as SCHEDULED.
pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    if from == to {
        return true;
    }
    if from.is_closed() {
        return to == AppointmentStatus::Scheduled && from != AppointmentStatus::Completed;
    }
    true
}

#[derive(Clone)]
pub struct AppointmentService {
    db_pool: Arc<DbPool>,
}

impl AppointmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn find(&self, clinic_id: Uuid, id: Uuid) -> Result<appointment::Model, ServiceError> {
        appointment::Entity::find_by_id(id)
            .filter(appointment::Column::ClinicId.eq(clinic_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))
    }

    async fn check_service(&self, clinic_id: Uuid, service_id: Uuid) -> Result<(), ServiceError> {
        let found = service::Entity::find_by_id(service_id)
            .filter(service::Column::ClinicId.eq(clinic_id))
            .one(&*self.db_pool)
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(ServiceError::field("service_id", "unknown service")),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: AppointmentFilter,
        page: PageRequest,
    ) -> Result<(Vec<appointment::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query =
            appointment::Entity::find().filter(appointment::Column::ClinicId.eq(clinic_id));

        if let Some(from) = filter.from {
            let start = from.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            if let Some(start) = start {
                query = query.filter(appointment::Column::StartsAt.gte(start));
            }
        }
        if let Some(to) = filter.to {
            let end = to.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc());
            if let Some(end) = end {
                query = query.filter(appointment::Column::StartsAt.lt(end));
            }
        }
        if let Some(status) = filter.status {
            query = query.filter(appointment::Column::Status.eq(status));
        }
        if let Some(pet_id) = filter.pet_id {
            query = query.filter(appointment::Column::PetId.eq(pet_id));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(appointment::Column::ClientId.eq(client_id));
        }

        let paginator = query
            .order_by_asc(appointment::Column::StartsAt)
            .paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, request), fields(pet_id = %request.pet_id))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<appointment::Model, ServiceError> {
        request.validate()?;
        check_window(request.starts_at, request.ends_at)?;

        let db = &*self.db_pool;
        find_client(db, clinic_id, request.client_id)
            .await
            .map_err(|_| ServiceError::field("client_id", "unknown client"))?;
        let pet = find_pet(db, clinic_id, request.pet_id)
            .await
            .map_err(|_| ServiceError::field("pet_id", "unknown pet"))?;
        if pet.client_id != request.client_id {
            return Err(ServiceError::field("pet_id", "pet does not belong to this client"));
        }
        if let Some(service_id) = request.service_id {
            self.check_service(clinic_id, service_id).await?;
        }

        let appointment = appointment::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            client_id: Set(request.client_id),
            pet_id: Set(request.pet_id),
            service_id: Set(request.service_id),
            starts_at: Set(request.starts_at),
            ends_at: Set(request.ends_at),
            status: Set(AppointmentStatus::Scheduled),
            vet_name: Set(request.vet_name),
            reason: Set(request.reason),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(appointment_id = %appointment.id, starts_at = %appointment.starts_at, "appointment booked");
        Ok(appointment)
    }

    pub async fn get(&self, clinic_id: Uuid, id: Uuid) -> Result<appointment::Model, ServiceError> {
        self.find(clinic_id, id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<appointment::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(clinic_id, id).await?;
        if existing.status.is_closed() {
            return Err(ServiceError::InvalidOperation(format!(
                "Appointment {} is {} and can no longer be edited",
                id, existing.status
            )));
        }

        let starts_at = request.starts_at.unwrap_or(existing.starts_at);
        let ends_at = request.ends_at.unwrap_or(existing.ends_at);
        check_window(starts_at, ends_at)?;
        if let Some(service_id) = request.service_id {
            self.check_service(clinic_id, service_id).await?;
        }

        let mut model: appointment::ActiveModel = existing.into();
        model.starts_at = Set(starts_at);
        model.ends_at = Set(ends_at);
        if request.service_id.is_some() {
            model.service_id = Set(request.service_id);
        }
        if let Some(v) = request.vet_name {
            model.vet_name = Set(Some(v));
        }
        if let Some(v) = request.reason {
            model.reason = Set(Some(v));
        }
        if let Some(v) = request.notes {
            model.notes = Set(Some(v));
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<appointment::Model, ServiceError> {
        let existing = self.find(clinic_id, id).await?;
        if !can_transition(existing.status, status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Appointment cannot move from {} to {}",
                existing.status, status
            )));
        }

        let previous = existing.status;
        let mut model: appointment::ActiveModel = existing.into();
        model.status = Set(status);
        let updated = model.update(&*self.db_pool).await?;
        info!(appointment_id = %id, from = %previous, to = %status, "appointment status changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, clinic_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.find(clinic_id, id).await?;
        existing.delete(&*self.db_pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppointmentStatus::Scheduled, AppointmentStatus::Confirmed, true)]
    #[case(AppointmentStatus::Confirmed, AppointmentStatus::CheckedIn, true)]
    #[case(AppointmentStatus::CheckedIn, AppointmentStatus::Completed, true)]
    #[case(AppointmentStatus::Scheduled, AppointmentStatus::NoShow, true)]
    #[case(AppointmentStatus::Cancelled, AppointmentStatus::Scheduled, true)]
    #[case(AppointmentStatus::Cancelled, AppointmentStatus::Completed, false)]
    #[case(AppointmentStatus::Completed, AppointmentStatus::Scheduled, false)]
    #[case(AppointmentStatus::NoShow, AppointmentStatus::CheckedIn, false)]
    fn transitions(
        #[case] from: AppointmentStatus,
        #[case] to: AppointmentStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(can_transition(from, to), allowed);
    }

    #[test]
    fn empty_window_is_rejected() {
        let now = Utc::now();
        let err = check_window(now, now).unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("ends_at"));
        assert!(check_window(now, now + chrono::Duration::minutes(30)).is_ok());
    }
}
