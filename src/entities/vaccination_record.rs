use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "vaccination_records")]
#[schema(as = VaccinationRecord)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub pet_id: Uuid,
    pub vaccine_id: Option<Uuid>,
    pub vaccine_name: String,
    pub applied_on: NaiveDate,
    pub next_due_on: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub vet_name: Option<String>,
    pub notes: Option<String>,
    /// Set once a VACCINE_DUE notification has been generated
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pet::Entity",
        from = "Column::PetId",
        to = "super::pet::Column::Id"
    )]
    Pet,
    #[sea_orm(
        belongs_to = "super::vaccine_catalog::Entity",
        from = "Column::VaccineId",
        to = "super::vaccine_catalog::Column::Id"
    )]
    Vaccine,
}

impl Related<super::pet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pet.def()
    }
}

impl Related<super::vaccine_catalog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vaccine.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
