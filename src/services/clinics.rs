use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validate_cents;
use crate::{
    db::DbPool,
    entities::clinic,
    errors::{FieldErrorsBuilder, ServiceError},
};

lazy_static! {
    static ref HHMM: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
    static ref INVOICE_PREFIX: Regex = Regex::new(r"^[A-Z0-9]{1,10}$").unwrap();
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClinicRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(equal = 3, message = "currency must be a 3 letter code"))]
    pub currency: Option<String>,
    #[validate(custom = "validate_percentage")]
    pub default_tax_rate: Option<Decimal>,
    #[validate(regex(path = "INVOICE_PREFIX", message = "1-10 uppercase letters or digits"))]
    pub invoice_prefix: Option<String>,
}

/// Partial update of the clinic profile; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClinicRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(equal = 3, message = "currency must be a 3 letter code"))]
    pub currency: Option<String>,
    #[validate(custom = "validate_percentage")]
    pub default_tax_rate: Option<Decimal>,
    #[validate(regex(path = "INVOICE_PREFIX", message = "1-10 uppercase letters or digits"))]
    pub invoice_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DaySchedule {
    pub day: DayOfWeek,
    #[serde(default)]
    pub closed: bool,
    #[validate(regex(path = "HHMM", message = "expected HH:MM"))]
    pub open: Option<String>,
    #[validate(regex(path = "HHMM", message = "expected HH:MM"))]
    pub close: Option<String>,
}

/// Opening hours, one entry per day the clinic has an opinion about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct WeeklySchedule {
    #[validate]
    pub days: Vec<DaySchedule>,
}

impl WeeklySchedule {
    /// Field-level checks that need more than one field at a time.
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut errors = FieldErrorsBuilder::new();
        if let Err(e) = self.validate() {
            errors.merge(&e, "");
        }

        let mut seen = HashSet::new();
        for (i, day) in self.days.iter().enumerate() {
            if !seen.insert(day.day) {
                errors.add(format!("days[{}].day", i), "day listed more than once");
            }
            if day.closed {
                continue;
            }
            match (parse_hhmm(day.open.as_deref()), parse_hhmm(day.close.as_deref())) {
                (Some(open), Some(close)) if open >= close => {
                    errors.add(format!("days[{}].close", i), "close must be after open");
                }
                (Some(_), Some(_)) => {}
                _ => {
                    if day.open.is_none() {
                        errors.add(format!("days[{}].open", i), "required unless closed");
                    }
                    if day.close.is_none() {
                        errors.add(format!("days[{}].close", i), "required unless closed");
                    }
                }
            }
        }
        errors.finish()
    }
}

fn parse_hhmm(value: Option<&str>) -> Option<NaiveTime> {
    value.and_then(|v| NaiveTime::parse_from_str(v, "%H:%M").ok())
}

pub(crate) fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percentage");
        err.message = Some("must be between 0 and 100".into());
        return Err(err);
    }
    validate_cents(value)
}

/// Clinic profile, schedule and tenant resolution
#[derive(Clone)]
pub struct ClinicService {
    db_pool: Arc<DbPool>,
}

impl ClinicService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Picks the clinic a request operates on: an explicit id must exist,
    /// otherwise the configured default, otherwise the oldest clinic.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        requested: Option<Uuid>,
        configured_default: Option<Uuid>,
    ) -> Result<clinic::Model, ServiceError> {
        let db = &*self.db_pool;
        if let Some(id) = requested {
            return clinic::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Clinic", id));
        }

        if let Some(id) = configured_default {
            if let Some(found) = clinic::Entity::find_by_id(id).one(db).await? {
                return Ok(found);
            }
            warn!(clinic_id = %id, "configured default clinic does not exist, falling back");
        }

        clinic::Entity::find()
            .order_by_asc(clinic::Column::CreatedAt)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No clinic has been set up".to_string()))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateClinicRequest,
        default_currency: &str,
        default_tax_rate: Decimal,
    ) -> Result<clinic::Model, ServiceError> {
        request.validate()?;

        let model = clinic::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            legal_name: Set(request.legal_name),
            tax_id: Set(request.tax_id),
            phone: Set(request.phone),
            email: Set(request.email),
            address: Set(request.address),
            currency: Set(request
                .currency
                .unwrap_or_else(|| default_currency.to_string())
                .to_uppercase()),
            default_tax_rate: Set(request.default_tax_rate.unwrap_or(default_tax_rate)),
            invoice_prefix: Set(request.invoice_prefix.unwrap_or_else(|| "INV".to_string())),
            schedule: Set(None),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(clinic_id = %model.id, "clinic created");
        Ok(model)
    }

    pub async fn get(&self, clinic_id: Uuid) -> Result<clinic::Model, ServiceError> {
        clinic::Entity::find_by_id(clinic_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Clinic", clinic_id))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        request: UpdateClinicRequest,
    ) -> Result<clinic::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(clinic_id).await?;
        let mut model: clinic::ActiveModel = existing.into();

        if let Some(name) = request.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(v) = request.legal_name {
            model.legal_name = Set(Some(v));
        }
        if let Some(v) = request.tax_id {
            model.tax_id = Set(Some(v));
        }
        if let Some(v) = request.phone {
            model.phone = Set(Some(v));
        }
        if let Some(v) = request.email {
            model.email = Set(Some(v));
        }
        if let Some(v) = request.address {
            model.address = Set(Some(v));
        }
        if let Some(v) = request.currency {
            model.currency = Set(v.to_uppercase());
        }
        if let Some(v) = request.default_tax_rate {
            model.default_tax_rate = Set(v);
        }
        if let Some(v) = request.invoice_prefix {
            model.invoice_prefix = Set(v);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    pub async fn schedule(&self, clinic_id: Uuid) -> Result<WeeklySchedule, ServiceError> {
        let clinic = self.get(clinic_id).await?;
        match clinic.schedule {
            Some(raw) => serde_json::from_value(raw).map_err(|e| {
                ServiceError::InternalError(format!("stored schedule is malformed: {}", e))
            }),
            None => Ok(WeeklySchedule::default()),
        }
    }

    #[instrument(skip(self, schedule), fields(days = schedule.days.len()))]
    pub async fn update_schedule(
        &self,
        clinic_id: Uuid,
        schedule: WeeklySchedule,
    ) -> Result<WeeklySchedule, ServiceError> {
        schedule.check()?;
        let existing = self.get(clinic_id).await?;
        let raw = serde_json::to_value(&schedule)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let mut model: clinic::ActiveModel = existing.into();
        model.schedule = Set(Some(raw));
        model.update(&*self.db_pool).await?;
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: DayOfWeek, open: &str, close: &str) -> DaySchedule {
        DaySchedule {
            day,
            closed: false,
            open: Some(open.into()),
            close: Some(close.into()),
        }
    }

    #[test]
    fn valid_week_passes() {
        let schedule = WeeklySchedule {
            days: vec![
                day(DayOfWeek::Monday, "09:00", "18:00"),
                DaySchedule {
                    day: DayOfWeek::Sunday,
                    closed: true,
                    open: None,
                    close: None,
                },
            ],
        };
        assert!(schedule.check().is_ok());
    }

    #[test]
    fn close_before_open_is_reported_on_close() {
        let schedule = WeeklySchedule {
            days: vec![day(DayOfWeek::Tuesday, "18:00", "09:00")],
        };
        let err = schedule.check().unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("days[0].close"));
    }

    #[test]
    fn malformed_times_and_duplicates_are_reported() {
        let schedule = WeeklySchedule {
            days: vec![
                day(DayOfWeek::Friday, "9am", "18:00"),
                day(DayOfWeek::Friday, "10:00", "12:00"),
            ],
        };
        let err = schedule.check().unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("days[0].open"));
        assert!(fields.contains_key("days[1].day"));
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage(&Decimal::from(21)).is_ok());
        assert!(validate_percentage(&Decimal::from(-1)).is_err());
        assert!(validate_percentage(&Decimal::from(101)).is_err());
        assert!(validate_percentage(&Decimal::new(10_125, 3)).is_err());
    }
}
