use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{clinics::validate_percentage, non_blank, search_condition, validate_money, PageRequest};
use crate::{
    db::DbPool,
    entities::{invoice_item, service},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub price: Decimal,
    #[validate(custom = "validate_percentage")]
    pub tax_rate: Option<Decimal>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub tax_rate: Option<Decimal>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ServiceFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Include deactivated services
    #[serde(default)]
    pub include_inactive: bool,
}

/// What happened to a service on delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOutcome {
    Deleted,
    /// Still referenced by invoice lines, kept but hidden from the catalog
    Deactivated,
}

/// Billable services offered by a clinic
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: ServiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<service::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = service::Entity::find().filter(service::Column::ClinicId.eq(clinic_id));
        if !filter.include_inactive {
            query = query.filter(service::Column::IsActive.eq(true));
        }
        if let Some(category) = non_blank(filter.category) {
            query = query.filter(service::Column::Category.eq(category));
        }
        if let Some(term) = non_blank(filter.search) {
            query = query.filter(search_condition(
                &term,
                &[service::Column::Name, service::Column::Description],
            ));
        }

        let paginator = query.order_by_asc(service::Column::Name).paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateServiceRequest,
    ) -> Result<service::Model, ServiceError> {
        request.validate()?;
        let created = service::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            name: Set(request.name.trim().to_string()),
            category: Set(non_blank(request.category)),
            description: Set(request.description),
            price: Set(request.price),
            tax_rate: Set(request.tax_rate.unwrap_or(Decimal::ZERO)),
            duration_minutes: Set(request.duration_minutes),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(service_id = %created.id, "catalog service created");
        Ok(created)
    }

    pub async fn get(&self, clinic_id: Uuid, id: Uuid) -> Result<service::Model, ServiceError> {
        service::Entity::find_by_id(id)
            .filter(service::Column::ClinicId.eq(clinic_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service", id))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: UpdateServiceRequest,
    ) -> Result<service::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(clinic_id, id).await?;
        let mut model: service::ActiveModel = existing.into();

        if let Some(v) = request.name {
            model.name = Set(v.trim().to_string());
        }
        if request.category.is_some() {
            model.category = Set(non_blank(request.category));
        }
        if let Some(v) = request.description {
            model.description = Set(Some(v));
        }
        if let Some(v) = request.price {
            model.price = Set(v);
        }
        if let Some(v) = request.tax_rate {
            model.tax_rate = Set(v);
        }
        if request.duration_minutes.is_some() {
            model.duration_minutes = Set(request.duration_minutes);
        }
        if let Some(v) = request.is_active {
            model.is_active = Set(v);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    /// Hard-deletes unused services, deactivates services already billed.
    #[instrument(skip(self))]
    pub async fn remove(&self, clinic_id: Uuid, id: Uuid) -> Result<RemovalOutcome, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(clinic_id, id).await?;

        let references = invoice_item::Entity::find()
            .filter(invoice_item::Column::ServiceId.eq(id))
            .count(db)
            .await?;

        if references > 0 {
            let mut model: service::ActiveModel = existing.into();
            model.is_active = Set(false);
            model.update(db).await?;
            info!(service_id = %id, references, "service deactivated");
            Ok(RemovalOutcome::Deactivated)
        } else {
            existing.delete(db).await?;
            info!(service_id = %id, "service deleted");
            Ok(RemovalOutcome::Deleted)
        }
    }
}
