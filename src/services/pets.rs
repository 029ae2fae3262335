use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{clients::find_client, non_blank, search_condition, validate_non_negative, PageRequest};
use crate::{
    db::DbPool,
    entities::{clinical_visit, pet, vaccination_record, Sex, Species},
    errors::{FieldErrorsBuilder, ServiceError},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePetRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    #[validate(custom = "validate_non_negative")]
    pub weight_kg: Option<Decimal>,
    pub color: Option<String>,
    #[validate(length(max = 32))]
    pub microchip: Option<String>,
    #[serde(default)]
    pub is_neutered: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePetRequest {
    /// Moves the pet to another owner of the same clinic
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub species: Option<Species>,
    pub breed: Option<String>,
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    #[validate(custom = "validate_non_negative")]
    pub weight_kg: Option<Decimal>,
    pub color: Option<String>,
    #[validate(length(max = 32))]
    pub microchip: Option<String>,
    pub is_neutered: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PetFilter {
    /// Matches pet name, breed or microchip
    pub search: Option<String>,
    pub client_id: Option<Uuid>,
    pub species: Option<Species>,
}

/// Clinical timeline of a pet, newest entries first
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PetHistory {
    pub pet: pet::Model,
    pub visits: Vec<clinical_visit::Model>,
    pub vaccinations: Vec<vaccination_record::Model>,
}

pub(crate) async fn find_pet<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    pet_id: Uuid,
) -> Result<pet::Model, ServiceError> {
    pet::Entity::find_by_id(pet_id)
        .filter(pet::Column::ClinicId.eq(clinic_id))
        .filter(pet::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Pet", pet_id))
}

fn check_birth_date(birth_date: Option<NaiveDate>) -> Result<(), ServiceError> {
    let mut errors = FieldErrorsBuilder::new();
    if let Some(date) = birth_date {
        if date > Utc::now().date_naive() {
            errors.add("birth_date", "cannot be in the future");
        }
    }
    errors.finish()
}

#[derive(Clone)]
pub struct PetService {
    db_pool: Arc<DbPool>,
}

impl PetService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: PetFilter,
        page: PageRequest,
    ) -> Result<(Vec<pet::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = pet::Entity::find()
            .filter(pet::Column::ClinicId.eq(clinic_id))
            .filter(pet::Column::IsActive.eq(true));

        if let Some(client_id) = filter.client_id {
            query = query.filter(pet::Column::ClientId.eq(client_id));
        }
        if let Some(species) = filter.species {
            query = query.filter(pet::Column::Species.eq(species));
        }
        if let Some(term) = non_blank(filter.search) {
            query = query.filter(search_condition(
                &term,
                &[pet::Column::Name, pet::Column::Breed, pet::Column::Microchip],
            ));
        }

        let paginator = query.order_by_asc(pet::Column::Name).paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let pets = paginator.fetch_page(page.index()).await?;
        Ok((pets, total))
    }

    #[instrument(skip(self, request), fields(client_id = %request.client_id))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreatePetRequest,
    ) -> Result<pet::Model, ServiceError> {
        request.validate()?;
        check_birth_date(request.birth_date)?;

        let db = &*self.db_pool;
        find_client(db, clinic_id, request.client_id)
            .await
            .map_err(|_| ServiceError::field("client_id", "unknown client"))?;

        let pet = pet::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            client_id: Set(request.client_id),
            name: Set(request.name.trim().to_string()),
            species: Set(request.species),
            breed: Set(non_blank(request.breed)),
            sex: Set(request.sex.unwrap_or_default()),
            birth_date: Set(request.birth_date),
            weight_kg: Set(request.weight_kg),
            color: Set(non_blank(request.color)),
            microchip: Set(non_blank(request.microchip)),
            is_neutered: Set(request.is_neutered),
            notes: Set(request.notes),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(pet_id = %pet.id, "pet registered");
        Ok(pet)
    }

    pub async fn get(&self, clinic_id: Uuid, pet_id: Uuid) -> Result<pet::Model, ServiceError> {
        find_pet(&*self.db_pool, clinic_id, pet_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        pet_id: Uuid,
        request: UpdatePetRequest,
    ) -> Result<pet::Model, ServiceError> {
        request.validate()?;
        check_birth_date(request.birth_date)?;

        let db = &*self.db_pool;
        let existing = find_pet(db, clinic_id, pet_id).await?;
        let mut model: pet::ActiveModel = existing.into();

        if let Some(client_id) = request.client_id {
            find_client(db, clinic_id, client_id)
                .await
                .map_err(|_| ServiceError::field("client_id", "unknown client"))?;
            model.client_id = Set(client_id);
        }
        if let Some(v) = request.name {
            model.name = Set(v.trim().to_string());
        }
        if let Some(v) = request.species {
            model.species = Set(v);
        }
        if request.breed.is_some() {
            model.breed = Set(non_blank(request.breed));
        }
        if let Some(v) = request.sex {
            model.sex = Set(v);
        }
        if request.birth_date.is_some() {
            model.birth_date = Set(request.birth_date);
        }
        if request.weight_kg.is_some() {
            model.weight_kg = Set(request.weight_kg);
        }
        if request.color.is_some() {
            model.color = Set(non_blank(request.color));
        }
        if request.microchip.is_some() {
            model.microchip = Set(non_blank(request.microchip));
        }
        if let Some(v) = request.is_neutered {
            model.is_neutered = Set(v);
        }
        if let Some(v) = request.notes {
            model.notes = Set(Some(v));
        }

        Ok(model.update(db).await?)
    }

    /// Soft delete; the clinical record is kept for history.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, clinic_id: Uuid, pet_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(clinic_id, pet_id).await?;
        let mut model: pet::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.update(&*self.db_pool).await?;
        info!(%pet_id, "pet deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn history(&self, clinic_id: Uuid, pet_id: Uuid) -> Result<PetHistory, ServiceError> {
        let db = &*self.db_pool;
        let pet = find_pet(db, clinic_id, pet_id).await?;

        let visits = clinical_visit::Entity::find()
            .filter(clinical_visit::Column::ClinicId.eq(clinic_id))
            .filter(clinical_visit::Column::PetId.eq(pet_id))
            .order_by_desc(clinical_visit::Column::VisitDate)
            .all(db)
            .await?;
        let vaccinations = vaccination_record::Entity::find()
            .filter(vaccination_record::Column::ClinicId.eq(clinic_id))
            .filter(vaccination_record::Column::PetId.eq(pet_id))
            .order_by_desc(vaccination_record::Column::AppliedOn)
            .all(db)
            .await?;

        Ok(PetHistory {
            pet,
            visits,
            vaccinations,
        })
    }
}
