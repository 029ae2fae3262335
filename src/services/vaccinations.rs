use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{catalog::RemovalOutcome, non_blank, pets::find_pet};
use crate::{
    db::DbPool,
    entities::{pet, vaccination_record, vaccine_catalog, Species},
    errors::{FieldErrorsBuilder, ServiceError},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVaccineRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    pub species: Option<Species>,
    #[validate(length(max = 200))]
    pub manufacturer: Option<String>,
    #[validate(range(min = 1, max = 3650))]
    pub booster_interval_days: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVaccineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub species: Option<Species>,
    #[validate(length(max = 200))]
    pub manufacturer: Option<String>,
    #[validate(range(min = 1, max = 3650))]
    pub booster_interval_days: Option<i32>,
    pub is_active: Option<bool>,
}

/// A dose applied to a pet. Either `vaccine_id` or `vaccine_name` is required.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordVaccinationRequest {
    pub pet_id: Uuid,
    pub vaccine_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub vaccine_name: Option<String>,
    /// Defaults to today
    pub applied_on: Option<NaiveDate>,
    /// Overrides the booster interval of the catalog vaccine
    pub next_due_on: Option<NaiveDate>,
    #[validate(length(max = 64))]
    pub batch_number: Option<String>,
    #[validate(length(max = 100))]
    pub vet_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct VaccineFilter {
    pub species: Option<Species>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct DueQuery {
    /// Look-ahead window in days, overdue records are always included
    pub days: Option<i64>,
}

/// An upcoming or overdue dose
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DueVaccination {
    pub record: vaccination_record::Model,
    pub pet_name: String,
    pub client_id: Uuid,
    /// Negative when overdue
    pub days_until_due: i64,
}

/// `explicit` wins, otherwise `applied_on + booster_days` when the vaccine has a booster.
pub fn next_due_date(
    applied_on: NaiveDate,
    explicit: Option<NaiveDate>,
    booster_days: Option<i32>,
) -> Result<Option<NaiveDate>, ServiceError> {
    if explicit.is_some() {
        return Ok(explicit);
    }
    match booster_days.filter(|days| *days > 0) {
        Some(days) => applied_on
            .checked_add_signed(Duration::days(i64::from(days)))
            .map(Some)
            .ok_or_else(|| {
                ServiceError::field("applied_on", "booster date falls outside the calendar")
            }),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct VaccinationService {
    db_pool: Arc<DbPool>,
}

impl VaccinationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn find_vaccine(
        &self,
        clinic_id: Uuid,
        id: Uuid,
    ) -> Result<vaccine_catalog::Model, ServiceError> {
        vaccine_catalog::Entity::find_by_id(id)
            .filter(vaccine_catalog::Column::ClinicId.eq(clinic_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vaccine", id))
    }

    pub async fn list_vaccines(
        &self,
        clinic_id: Uuid,
        filter: VaccineFilter,
    ) -> Result<Vec<vaccine_catalog::Model>, ServiceError> {
        let mut query = vaccine_catalog::Entity::find()
            .filter(vaccine_catalog::Column::ClinicId.eq(clinic_id));
        if !filter.include_inactive {
            query = query.filter(vaccine_catalog::Column::IsActive.eq(true));
        }
        let vaccines = query
            .order_by_asc(vaccine_catalog::Column::Name)
            .all(&*self.db_pool)
            .await?;

        Ok(match filter.species {
            Some(species) => vaccines
                .into_iter()
                .filter(|v| v.species.map_or(true, |s| s == species))
                .collect(),
            None => vaccines,
        })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_vaccine(
        &self,
        clinic_id: Uuid,
        request: CreateVaccineRequest,
    ) -> Result<vaccine_catalog::Model, ServiceError> {
        request.validate()?;
        let vaccine = vaccine_catalog::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            name: Set(request.name.trim().to_string()),
            species: Set(request.species),
            manufacturer: Set(non_blank(request.manufacturer)),
            booster_interval_days: Set(request.booster_interval_days),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;
        info!(vaccine_id = %vaccine.id, "vaccine added to catalog");
        Ok(vaccine)
    }

    pub async fn get_vaccine(
        &self,
        clinic_id: Uuid,
        id: Uuid,
    ) -> Result<vaccine_catalog::Model, ServiceError> {
        self.find_vaccine(clinic_id, id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_vaccine(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: UpdateVaccineRequest,
    ) -> Result<vaccine_catalog::Model, ServiceError> {
        request.validate()?;
        let existing = self.find_vaccine(clinic_id, id).await?;
        let mut model: vaccine_catalog::ActiveModel = existing.into();
        if let Some(v) = request.name {
            model.name = Set(v.trim().to_string());
        }
        if request.species.is_some() {
            model.species = Set(request.species);
        }
        if request.manufacturer.is_some() {
            model.manufacturer = Set(non_blank(request.manufacturer));
        }
        if request.booster_interval_days.is_some() {
            model.booster_interval_days = Set(request.booster_interval_days);
        }
        if let Some(v) = request.is_active {
            model.is_active = Set(v);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn remove_vaccine(
        &self,
        clinic_id: Uuid,
        id: Uuid,
    ) -> Result<RemovalOutcome, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_vaccine(clinic_id, id).await?;
        let references = vaccination_record::Entity::find()
            .filter(vaccination_record::Column::VaccineId.eq(id))
            .count(db)
            .await?;
        if references > 0 {
            let mut model: vaccine_catalog::ActiveModel = existing.into();
            model.is_active = Set(false);
            model.update(db).await?;
            Ok(RemovalOutcome::Deactivated)
        } else {
            existing.delete(db).await?;
            Ok(RemovalOutcome::Deleted)
        }
    }

    #[instrument(skip(self, request), fields(pet_id = %request.pet_id))]
    pub async fn record(
        &self,
        clinic_id: Uuid,
        request: RecordVaccinationRequest,
    ) -> Result<vaccination_record::Model, ServiceError> {
        let mut errors = FieldErrorsBuilder::new();
        if let Err(e) = request.validate() {
            errors.merge(&e, "");
        }
        let today = Utc::now().date_naive();
        let applied_on = request.applied_on.unwrap_or(today);
        if applied_on > today {
            errors.add("applied_on", "cannot be in the future");
        }
        if let Some(next) = request.next_due_on {
            if next <= applied_on {
                errors.add("next_due_on", "must be after applied_on");
            }
        }
        if request.vaccine_id.is_none() && non_blank(request.vaccine_name.clone()).is_none() {
            errors.add("vaccine_name", "vaccine_id or vaccine_name is required");
        }
        errors.finish()?;

        let db = &*self.db_pool;
        let pet = find_pet(db, clinic_id, request.pet_id)
            .await
            .map_err(|_| ServiceError::field("pet_id", "unknown pet"))?;

        let vaccine = match request.vaccine_id {
            Some(vaccine_id) => {
                let vaccine = self
                    .find_vaccine(clinic_id, vaccine_id)
                    .await
                    .map_err(|_| ServiceError::field("vaccine_id", "unknown vaccine"))?;
                if let Some(species) = vaccine.species {
                    if species != pet.species {
                        return Err(ServiceError::field(
                            "vaccine_id",
                            format!("vaccine is for {} only", species),
                        ));
                    }
                }
                Some(vaccine)
            }
            None => None,
        };

        let vaccine_name = non_blank(request.vaccine_name)
            .or_else(|| vaccine.as_ref().map(|v| v.name.clone()))
            .unwrap_or_default();
        let next_due_on = next_due_date(
            applied_on,
            request.next_due_on,
            vaccine.as_ref().and_then(|v| v.booster_interval_days),
        )?;

        let record = vaccination_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            pet_id: Set(pet.id),
            vaccine_id: Set(vaccine.as_ref().map(|v| v.id)),
            vaccine_name: Set(vaccine_name),
            applied_on: Set(applied_on),
            next_due_on: Set(next_due_on),
            batch_number: Set(non_blank(request.batch_number)),
            vet_name: Set(non_blank(request.vet_name)),
            notes: Set(request.notes),
            reminder_sent_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(record_id = %record.id, next_due_on = ?record.next_due_on, "vaccination recorded");
        Ok(record)
    }

    pub async fn list_for_pet(
        &self,
        clinic_id: Uuid,
        pet_id: Uuid,
    ) -> Result<Vec<vaccination_record::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_pet(db, clinic_id, pet_id).await?;
        Ok(vaccination_record::Entity::find()
            .filter(vaccination_record::Column::ClinicId.eq(clinic_id))
            .filter(vaccination_record::Column::PetId.eq(pet_id))
            .order_by_desc(vaccination_record::Column::AppliedOn)
            .all(db)
            .await?)
    }

    /// Latest doses per pet are not deduplicated; a booster recorded later
    /// simply carries its own due date.
    #[instrument(skip(self))]
    pub async fn due_within(
        &self,
        clinic_id: Uuid,
        days: i64,
    ) -> Result<Vec<DueVaccination>, ServiceError> {
        if !(0..=365).contains(&days) {
            return Err(ServiceError::field("days", "must be between 0 and 365"));
        }
        let today = Utc::now().date_naive();
        let horizon = today
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| ServiceError::field("days", "window falls outside the calendar"))?;

        let rows = vaccination_record::Entity::find()
            .find_also_related(pet::Entity)
            .filter(vaccination_record::Column::ClinicId.eq(clinic_id))
            .filter(vaccination_record::Column::NextDueOn.lte(horizon))
            .filter(pet::Column::IsActive.eq(true))
            .order_by_asc(vaccination_record::Column::NextDueOn)
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(record, pet)| {
                let pet = pet?;
                let due_on = record.next_due_on?;
                Some(DueVaccination {
                    days_until_due: (due_on - today).num_days(),
                    pet_name: pet.name,
                    client_id: pet.client_id,
                    record,
                })
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn delete_record(&self, clinic_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let record = vaccination_record::Entity::find_by_id(id)
            .filter(vaccination_record::Column::ClinicId.eq(clinic_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vaccination", id))?;
        record.delete(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn booster_interval_sets_next_due() {
        assert_eq!(
            next_due_date(date(2024, 1, 10), None, Some(365)).unwrap(),
            Some(date(2025, 1, 9))
        );
    }

    #[test]
    fn explicit_due_date_wins() {
        assert_eq!(
            next_due_date(date(2024, 1, 10), Some(date(2024, 2, 1)), Some(365)).unwrap(),
            Some(date(2024, 2, 1))
        );
    }

    #[test]
    fn no_booster_means_no_due_date() {
        assert_eq!(next_due_date(date(2024, 1, 10), None, None).unwrap(), None);
        assert_eq!(next_due_date(date(2024, 1, 10), None, Some(0)).unwrap(), None);
    }

    #[test]
    fn booster_past_the_last_calendar_day_is_a_field_error() {
        let late = NaiveDate::MAX - Duration::days(10);
        let err = next_due_date(late, None, Some(3650)).unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("applied_on"));
    }
}
