use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{non_blank, search_condition, PageRequest};
use crate::{
    db::DbPool,
    entities::{client, invoice, pet},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 100, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 40))]
    pub document_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 40))]
    pub document_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ClientFilter {
    /// Matches first name, last name, phone or email
    pub search: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

/// Loads a client of `clinic_id` that has not been archived.
pub(crate) async fn find_client<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    client_id: Uuid,
) -> Result<client::Model, ServiceError> {
    client::Entity::find_by_id(client_id)
        .filter(client::Column::ClinicId.eq(clinic_id))
        .filter(client::Column::ArchivedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Client", client_id))
}

/// Service for managing clinic clients (pet owners)
#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: ClientFilter,
        page: PageRequest,
    ) -> Result<(Vec<client::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = client::Entity::find().filter(client::Column::ClinicId.eq(clinic_id));

        if !filter.include_archived {
            query = query.filter(client::Column::ArchivedAt.is_null());
        }
        if let Some(term) = non_blank(filter.search) {
            query = query.filter(search_condition(
                &term,
                &[
                    client::Column::FirstName,
                    client::Column::LastName,
                    client::Column::Phone,
                    client::Column::Email,
                ],
            ));
        }

        let paginator = query
            .order_by_asc(client::Column::LastName)
            .order_by_asc(client::Column::FirstName)
            .paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let clients = paginator.fetch_page(page.index()).await?;
        Ok((clients, total))
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateClientRequest,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;

        let client = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            clinic_id: Set(clinic_id),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            phone: Set(non_blank(request.phone)),
            email: Set(non_blank(request.email)),
            address: Set(non_blank(request.address)),
            document_id: Set(non_blank(request.document_id)),
            notes: Set(request.notes),
            archived_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(client_id = %client.id, "client created");
        Ok(client)
    }

    pub async fn get(&self, clinic_id: Uuid, client_id: Uuid) -> Result<client::Model, ServiceError> {
        find_client(&*self.db_pool, clinic_id, client_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        client_id: Uuid,
        request: UpdateClientRequest,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(clinic_id, client_id).await?;
        let mut model: client::ActiveModel = existing.into();

        if let Some(v) = request.first_name {
            model.first_name = Set(v.trim().to_string());
        }
        if let Some(v) = request.last_name {
            model.last_name = Set(v.trim().to_string());
        }
        if request.phone.is_some() {
            model.phone = Set(non_blank(request.phone));
        }
        if request.email.is_some() {
            model.email = Set(non_blank(request.email));
        }
        if request.address.is_some() {
            model.address = Set(non_blank(request.address));
        }
        if request.document_id.is_some() {
            model.document_id = Set(non_blank(request.document_id));
        }
        if let Some(v) = request.notes {
            model.notes = Set(Some(v));
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    /// Archives the client. Pets, invoices and history stay in place.
    #[instrument(skip(self))]
    pub async fn archive(&self, clinic_id: Uuid, client_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(clinic_id, client_id).await?;
        let mut model: client::ActiveModel = existing.into();
        model.archived_at = Set(Some(Utc::now()));
        model.update(&*self.db_pool).await?;
        info!(%client_id, "client archived");
        Ok(())
    }

    pub async fn pets(&self, clinic_id: Uuid, client_id: Uuid) -> Result<Vec<pet::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_client(db, clinic_id, client_id).await?;
        Ok(pet::Entity::find()
            .filter(pet::Column::ClinicId.eq(clinic_id))
            .filter(pet::Column::ClientId.eq(client_id))
            .filter(pet::Column::IsActive.eq(true))
            .order_by_asc(pet::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn invoices(
        &self,
        clinic_id: Uuid,
        client_id: Uuid,
    ) -> Result<Vec<invoice::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_client(db, clinic_id, client_id).await?;
        Ok(invoice::Entity::find()
            .filter(invoice::Column::ClinicId.eq(clinic_id))
            .filter(invoice::Column::ClientId.eq(client_id))
            .order_by_desc(invoice::Column::IssueDate)
            .order_by_desc(invoice::Column::Sequence)
            .all(db)
            .await?)
    }
}
