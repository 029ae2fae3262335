use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{non_blank, pets::find_pet, validate_non_negative};
use crate::{
    db::DbPool,
    entities::{appointment, clinical_visit, pet},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVisitRequest {
    pub pet_id: Uuid,
    pub appointment_id: Option<Uuid>,
    /// Defaults to now
    pub visit_date: Option<DateTime<Utc>>,
    #[validate(length(max = 100))]
    pub vet_name: Option<String>,
    pub reason: Option<String>,
    pub anamnesis: Option<String>,
    pub physical_exam: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub weight_kg: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub temperature_c: Option<Decimal>,
    #[validate(range(min = 1, max = 600))]
    pub heart_rate: Option<i32>,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVisitRequest {
    pub visit_date: Option<DateTime<Utc>>,
    #[validate(length(max = 100))]
    pub vet_name: Option<String>,
    pub reason: Option<String>,
    pub anamnesis: Option<String>,
    pub physical_exam: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub weight_kg: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub temperature_c: Option<Decimal>,
    #[validate(range(min = 1, max = 600))]
    pub heart_rate: Option<i32>,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Clinical records of consultations
#[derive(Clone)]
pub struct VisitService {
    db_pool: Arc<DbPool>,
}

impl VisitService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn find(&self, clinic_id: Uuid, id: Uuid) -> Result<clinical_visit::Model, ServiceError> {
        clinical_visit::Entity::find_by_id(id)
            .filter(clinical_visit::Column::ClinicId.eq(clinic_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Visit", id))
    }

    /// Records a visit. A weight given here also becomes the pet's current weight.
    #[instrument(skip(self, request), fields(pet_id = %request.pet_id))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateVisitRequest,
    ) -> Result<clinical_visit::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let pet = find_pet(db, clinic_id, request.pet_id)
            .await
            .map_err(|_| ServiceError::field("pet_id", "unknown pet"))?;

        if let Some(appointment_id) = request.appointment_id {
            let linked = appointment::Entity::find_by_id(appointment_id)
                .filter(appointment::Column::ClinicId.eq(clinic_id))
                .one(db)
                .await?;
            match linked {
                Some(a) if a.pet_id == pet.id => {}
                Some(_) => {
                    return Err(ServiceError::field(
                        "appointment_id",
                        "appointment belongs to another pet",
                    ))
                }
                None => return Err(ServiceError::field("appointment_id", "unknown appointment")),
            }
        }

        let visit = clinical_visit::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            pet_id: Set(pet.id),
            appointment_id: Set(request.appointment_id),
            visit_date: Set(request.visit_date.unwrap_or_else(Utc::now)),
            vet_name: Set(non_blank(request.vet_name)),
            reason: Set(request.reason),
            anamnesis: Set(request.anamnesis),
            physical_exam: Set(request.physical_exam),
            diagnosis: Set(request.diagnosis),
            treatment: Set(request.treatment),
            weight_kg: Set(request.weight_kg),
            temperature_c: Set(request.temperature_c),
            heart_rate: Set(request.heart_rate),
            follow_up_date: Set(request.follow_up_date),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(db)
        .await?;

        if let Some(weight) = visit.weight_kg {
            let mut pet_model: pet::ActiveModel = pet.into();
            pet_model.weight_kg = Set(Some(weight));
            pet_model.update(db).await?;
        }

        info!(visit_id = %visit.id, "clinical visit recorded");
        Ok(visit)
    }

    pub async fn get(&self, clinic_id: Uuid, id: Uuid) -> Result<clinical_visit::Model, ServiceError> {
        self.find(clinic_id, id).await
    }

    pub async fn list_for_pet(
        &self,
        clinic_id: Uuid,
        pet_id: Uuid,
    ) -> Result<Vec<clinical_visit::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_pet(db, clinic_id, pet_id).await?;
        Ok(clinical_visit::Entity::find()
            .filter(clinical_visit::Column::ClinicId.eq(clinic_id))
            .filter(clinical_visit::Column::PetId.eq(pet_id))
            .order_by_desc(clinical_visit::Column::VisitDate)
            .all(db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: UpdateVisitRequest,
    ) -> Result<clinical_visit::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(clinic_id, id).await?;
        let mut model: clinical_visit::ActiveModel = existing.into();

        if let Some(v) = request.visit_date {
            model.visit_date = Set(v);
        }
        if request.vet_name.is_some() {
            model.vet_name = Set(non_blank(request.vet_name));
        }
        if request.reason.is_some() {
            model.reason = Set(request.reason);
        }
        if request.anamnesis.is_some() {
            model.anamnesis = Set(request.anamnesis);
        }
        if request.physical_exam.is_some() {
            model.physical_exam = Set(request.physical_exam);
        }
        if request.diagnosis.is_some() {
            model.diagnosis = Set(request.diagnosis);
        }
        if request.treatment.is_some() {
            model.treatment = Set(request.treatment);
        }
        if request.weight_kg.is_some() {
            model.weight_kg = Set(request.weight_kg);
        }
        if request.temperature_c.is_some() {
            model.temperature_c = Set(request.temperature_c);
        }
        if request.heart_rate.is_some() {
            model.heart_rate = Set(request.heart_rate);
        }
        if request.follow_up_date.is_some() {
            model.follow_up_date = Set(request.follow_up_date);
        }
        if request.notes.is_some() {
            model.notes = Set(request.notes);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, clinic_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.find(clinic_id, id).await?;
        existing.delete(&*self.db_pool).await?;
        Ok(())
    }
}
