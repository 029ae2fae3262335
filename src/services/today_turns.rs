//! Walk-in turns shown on the reception kanban board.
//!
//! A turn moves WAITING -> IN_PROGRESS -> READY -> DELIVERED one column at a
//! time; CANCELLED is reachable from any non-terminal column.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{clients::find_client, non_blank, pets::find_pet};
use crate::{
    db::{map_transaction_error, retry_on_unique_conflict, DbPool},
    entities::{today_turn, TurnStatus},
    errors::{FieldErrorsBuilder, ServiceError},
};

const MAX_TICKET_ATTEMPTS: usize = 3;

/// Registers a walk-in. With `pet_id` the owner and pet names come from the records.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTurnRequest {
    pub client_id: Option<Uuid>,
    pub pet_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub owner_name: Option<String>,
    #[validate(length(max = 40))]
    pub owner_phone: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub pet_name: Option<String>,
    #[validate(length(max = 500))]
    pub service_description: Option<String>,
    /// Defaults to today
    pub turn_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetTurnStatusRequest {
    pub status: TurnStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BoardQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// Turns of one day split into kanban columns, each ordered by ticket
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct TurnBoard {
    pub date: NaiveDate,
    pub waiting: Vec<today_turn::Model>,
    pub in_progress: Vec<today_turn::Model>,
    pub ready: Vec<today_turn::Model>,
    pub delivered: Vec<today_turn::Model>,
    pub cancelled: Vec<today_turn::Model>,
}

impl TurnBoard {
    fn from_turns(date: NaiveDate, turns: Vec<today_turn::Model>) -> Self {
        let mut board = TurnBoard {
            date,
            ..Default::default()
        };
        for turn in turns {
            match turn.status {
                TurnStatus::Waiting => board.waiting.push(turn),
                TurnStatus::InProgress => board.in_progress.push(turn),
                TurnStatus::Ready => board.ready.push(turn),
                TurnStatus::Delivered => board.delivered.push(turn),
                TurnStatus::Cancelled => board.cancelled.push(turn),
            }
        }
        board
    }
}

/// Contact links handed to reception after flagging the owner as notified
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnerContact {
    pub turn: today_turn::Model,
    pub phone_link: Option<String>,
    pub whatsapp_link: Option<String>,
    pub message: String,
}

/// Validates a requested move against the workflow.
pub fn plan_transition(current: TurnStatus, requested: TurnStatus) -> Result<TurnStatus, ServiceError> {
    if current.is_terminal() {
        return Err(ServiceError::InvalidStatus(format!(
            "Turn is already {} and cannot change",
            current
        )));
    }
    if requested == TurnStatus::Cancelled || current.next() == Some(requested) {
        return Ok(requested);
    }
    Err(ServiceError::InvalidStatus(format!(
        "Turn cannot move from {} to {}",
        current, requested
    )))
}

/// Digits of a phone number, keeping nothing else.
fn phone_digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn contact_links(phone: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(phone) = phone else {
        return (None, None);
    };
    let digits = phone_digits(phone);
    if digits.is_empty() {
        return (None, None);
    }
    let dial = if phone.trim_start().starts_with('+') {
        format!("+{}", digits)
    } else {
        digits.clone()
    };
    (
        Some(format!("tel:{}", dial)),
        Some(format!("https://wa.me/{}", digits)),
    )
}

fn apply_status(model: &mut today_turn::ActiveModel, status: TurnStatus, at: DateTime<Utc>) {
    model.status = Set(status);
    match status {
        TurnStatus::InProgress => model.started_at = Set(Some(at)),
        TurnStatus::Ready => model.ready_at = Set(Some(at)),
        TurnStatus::Delivered => model.delivered_at = Set(Some(at)),
        TurnStatus::Cancelled => model.cancelled_at = Set(Some(at)),
        TurnStatus::Waiting => {}
    }
}

async fn next_ticket<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    date: NaiveDate,
) -> Result<i32, ServiceError> {
    let current: Option<Option<i32>> = today_turn::Entity::find()
        .select_only()
        .column_as(today_turn::Column::TicketNumber.max(), "max_ticket")
        .filter(today_turn::Column::ClinicId.eq(clinic_id))
        .filter(today_turn::Column::TurnDate.eq(date))
        .into_tuple()
        .one(db)
        .await?;
    Ok(current.flatten().unwrap_or(0) + 1)
}

#[derive(Clone)]
pub struct TodayTurnService {
    db_pool: Arc<DbPool>,
}

impl TodayTurnService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn find(&self, clinic_id: Uuid, id: Uuid) -> Result<today_turn::Model, ServiceError> {
        today_turn::Entity::find_by_id(id)
            .filter(today_turn::Column::ClinicId.eq(clinic_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Turn", id))
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateTurnRequest,
    ) -> Result<today_turn::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let mut owner_name = non_blank(request.owner_name);
        let mut owner_phone = non_blank(request.owner_phone);
        let mut pet_name = non_blank(request.pet_name);
        let mut client_id = request.client_id;

        if let Some(pet_id) = request.pet_id {
            let pet = find_pet(db, clinic_id, pet_id)
                .await
                .map_err(|_| ServiceError::field("pet_id", "unknown pet"))?;
            if client_id.is_some_and(|id| id != pet.client_id) {
                return Err(ServiceError::field("pet_id", "pet does not belong to this client"));
            }
            client_id = Some(pet.client_id);
            pet_name = pet_name.or(Some(pet.name));
        }
        if let Some(id) = client_id {
            let client = find_client(db, clinic_id, id)
                .await
                .map_err(|_| ServiceError::field("client_id", "unknown client"))?;
            owner_phone = owner_phone.or(client.phone.clone());
            owner_name = owner_name.or(Some(client.full_name()));
        }

        let mut errors = FieldErrorsBuilder::new();
        if owner_name.is_none() {
            errors.add("owner_name", "owner_name or client_id is required");
        }
        if pet_name.is_none() {
            errors.add("pet_name", "pet_name or pet_id is required");
        }
        errors.finish()?;

        let turn_date = request.turn_date.unwrap_or_else(|| Utc::now().date_naive());
        let draft = today_turn::ActiveModel {
            clinic_id: Set(clinic_id),
            client_id: Set(client_id),
            pet_id: Set(request.pet_id),
            owner_name: Set(owner_name.unwrap_or_default()),
            owner_phone: Set(owner_phone),
            pet_name: Set(pet_name.unwrap_or_default()),
            service_description: Set(non_blank(request.service_description)),
            turn_date: Set(turn_date),
            status: Set(TurnStatus::Waiting),
            owner_notified: Set(false),
            notified_at: Set(None),
            started_at: Set(None),
            ready_at: Set(None),
            delivered_at: Set(None),
            cancelled_at: Set(None),
            notes: Set(request.notes),
            ..Default::default()
        };

        let turn = retry_on_unique_conflict("a ticket number", MAX_TICKET_ATTEMPTS, || {
            let mut candidate = draft.clone();
            async move {
                db.transaction::<_, today_turn::Model, ServiceError>(|txn| {
                    Box::pin(async move {
                        let ticket = next_ticket(txn, clinic_id, turn_date).await?;
                        candidate.id = Set(Uuid::new_v4());
                        candidate.ticket_number = Set(ticket);
                        Ok(candidate.insert(txn).await?)
                    })
                })
                .await
                .map_err(map_transaction_error)
            }
        })
        .await?;

        info!(turn_id = %turn.id, ticket = turn.ticket_number, "turn created");
        Ok(turn)
    }

    pub async fn get(&self, clinic_id: Uuid, id: Uuid) -> Result<today_turn::Model, ServiceError> {
        self.find(clinic_id, id).await
    }

    pub async fn board(&self, clinic_id: Uuid, date: Option<NaiveDate>) -> Result<TurnBoard, ServiceError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let turns = today_turn::Entity::find()
            .filter(today_turn::Column::ClinicId.eq(clinic_id))
            .filter(today_turn::Column::TurnDate.eq(date))
            .order_by_asc(today_turn::Column::TicketNumber)
            .all(&*self.db_pool)
            .await?;
        Ok(TurnBoard::from_turns(date, turns))
    }

    /// Moves the turn one column to the right.
    #[instrument(skip(self))]
    pub async fn advance(&self, clinic_id: Uuid, id: Uuid) -> Result<today_turn::Model, ServiceError> {
        let turn = self.find(clinic_id, id).await?;
        let next = turn.status.next().ok_or_else(|| {
            ServiceError::InvalidStatus(format!("Turn is already {} and cannot advance", turn.status))
        })?;
        self.transition(turn, next).await
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        status: TurnStatus,
    ) -> Result<today_turn::Model, ServiceError> {
        let turn = self.find(clinic_id, id).await?;
        let next = plan_transition(turn.status, status)?;
        self.transition(turn, next).await
    }

    pub async fn cancel(&self, clinic_id: Uuid, id: Uuid) -> Result<today_turn::Model, ServiceError> {
        self.set_status(clinic_id, id, TurnStatus::Cancelled).await
    }

    /// Writes `next` only while the row still holds the status `turn` was read
    /// with, so a concurrent move cannot be overwritten.
    async fn transition(
        &self,
        turn: today_turn::Model,
        next: TurnStatus,
    ) -> Result<today_turn::Model, ServiceError> {
        let previous = turn.status;
        let now = Utc::now();
        let mut changes = today_turn::ActiveModel {
            updated_at: Set(now),
            ..Default::default()
        };
        apply_status(&mut changes, next, now);

        let result = today_turn::Entity::update_many()
            .set(changes)
            .filter(today_turn::Column::Id.eq(turn.id))
            .filter(today_turn::Column::ClinicId.eq(turn.clinic_id))
            .filter(today_turn::Column::Status.eq(previous))
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidStatus(format!(
                "Turn #{} is no longer {}, reload and try again",
                turn.ticket_number, previous
            )));
        }

        let updated = self.find(turn.clinic_id, turn.id).await?;
        info!(turn_id = %updated.id, from = %previous, to = %next, "turn moved");
        Ok(updated)
    }

    /// Flags the owner as notified and returns call / WhatsApp links.
    /// Nothing is sent from the server.
    #[instrument(skip(self))]
    pub async fn notify_owner(&self, clinic_id: Uuid, id: Uuid) -> Result<OwnerContact, ServiceError> {
        let turn = self.find(clinic_id, id).await?;
        if turn.status == TurnStatus::Cancelled {
            return Err(ServiceError::InvalidOperation(
                "Cannot notify the owner of a cancelled turn".to_string(),
            ));
        }

        let (phone_link, whatsapp_link) = contact_links(turn.owner_phone.as_deref());
        let message = match turn.status {
            TurnStatus::Ready => format!("Hi {}, {} is ready to be picked up.", turn.owner_name, turn.pet_name),
            _ => format!("Hi {}, news about {} (ticket #{}).", turn.owner_name, turn.pet_name, turn.ticket_number),
        };

        let mut model: today_turn::ActiveModel = turn.into();
        model.owner_notified = Set(true);
        model.notified_at = Set(Some(Utc::now()));
        let turn = model.update(&*self.db_pool).await?;

        Ok(OwnerContact {
            turn,
            phone_link,
            whatsapp_link,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(TurnStatus::Waiting, TurnStatus::InProgress)]
    #[case(TurnStatus::InProgress, TurnStatus::Ready)]
    #[case(TurnStatus::Ready, TurnStatus::Delivered)]
    #[case(TurnStatus::Waiting, TurnStatus::Cancelled)]
    #[case(TurnStatus::Ready, TurnStatus::Cancelled)]
    fn allowed_moves(#[case] from: TurnStatus, #[case] to: TurnStatus) {
        assert_eq!(plan_transition(from, to).unwrap(), to);
    }

    #[rstest]
    #[case(TurnStatus::Waiting, TurnStatus::Ready)]
    #[case(TurnStatus::Waiting, TurnStatus::Delivered)]
    #[case(TurnStatus::Ready, TurnStatus::InProgress)]
    #[case(TurnStatus::Waiting, TurnStatus::Waiting)]
    #[case(TurnStatus::Delivered, TurnStatus::Cancelled)]
    #[case(TurnStatus::Cancelled, TurnStatus::Waiting)]
    fn rejected_moves(#[case] from: TurnStatus, #[case] to: TurnStatus) {
        assert_matches!(plan_transition(from, to), Err(ServiceError::InvalidStatus(_)));
    }

    #[test]
    fn entering_a_column_stamps_its_timestamp() {
        let mut model = <today_turn::ActiveModel as Default>::default();
        let at = Utc::now();
        apply_status(&mut model, TurnStatus::Ready, at);
        assert_eq!(model.ready_at, Set(Some(at)));
        assert_eq!(model.status, Set(TurnStatus::Ready));
    }

    #[test]
    fn contact_links_keep_international_prefix() {
        let (tel, wa) = contact_links(Some("+34 600 12-34-56"));
        assert_eq!(tel.as_deref(), Some("tel:+34600123456"));
        assert_eq!(wa.as_deref(), Some("https://wa.me/34600123456"));
        assert_eq!(contact_links(Some("n/a")), (None, None));
        assert_eq!(contact_links(None), (None, None));
    }

    async fn service_with_turn() -> (TodayTurnService, today_turn::Model) {
        let cfg = crate::db::DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = Arc::new(crate::db::establish_connection_with_config(&cfg).await.unwrap());
        crate::db::run_migrations(&pool).await.unwrap();

        let clinic = crate::services::clinics::ClinicService::new(pool.clone())
            .create(
                crate::services::clinics::CreateClinicRequest {
                    name: "Front Desk Vet".into(),
                    legal_name: None,
                    tax_id: None,
                    phone: None,
                    email: None,
                    address: None,
                    currency: None,
                    default_tax_rate: None,
                    invoice_prefix: None,
                },
                "EUR",
                rust_decimal::Decimal::ZERO,
            )
            .await
            .unwrap();

        let service = TodayTurnService::new(pool);
        let turn = service
            .create(
                clinic.id,
                CreateTurnRequest {
                    client_id: None,
                    pet_id: None,
                    owner_name: Some("Marta".into()),
                    owner_phone: None,
                    pet_name: Some("Nube".into()),
                    service_description: None,
                    turn_date: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        (service, turn)
    }

    #[tokio::test]
    async fn stale_move_does_not_revive_a_cancelled_turn() {
        let (service, stale) = service_with_turn().await;
        let cancelled = service.cancel(stale.clinic_id, stale.id).await.unwrap();
        assert_eq!(cancelled.status, TurnStatus::Cancelled);

        // a second desk still holds the WAITING copy and advances it
        let err = service
            .transition(stale.clone(), TurnStatus::InProgress)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidStatus(_));

        let current = service.get(stale.clinic_id, stale.id).await.unwrap();
        assert_eq!(current.status, TurnStatus::Cancelled);
        assert!(current.started_at.is_none());
    }

    #[tokio::test]
    async fn fresh_move_is_written() {
        let (service, turn) = service_with_turn().await;
        let moved = service.transition(turn, TurnStatus::InProgress).await.unwrap();
        assert_eq!(moved.status, TurnStatus::InProgress);
        assert!(moved.started_at.is_some());
    }

    #[test]
    fn board_groups_by_status() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let turn = |n: i32, status: TurnStatus| today_turn::Model {
            id: Uuid::new_v4(),
            clinic_id: Uuid::nil(),
            client_id: None,
            pet_id: None,
            owner_name: "Ana".into(),
            owner_phone: None,
            pet_name: "Luna".into(),
            service_description: None,
            turn_date: date,
            ticket_number: n,
            status,
            owner_notified: false,
            notified_at: None,
            started_at: None,
            ready_at: None,
            delivered_at: None,
            cancelled_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let board = TurnBoard::from_turns(
            date,
            vec![
                turn(1, TurnStatus::Delivered),
                turn(2, TurnStatus::Waiting),
                turn(3, TurnStatus::Waiting),
            ],
        );
        assert_eq!(board.waiting.len(), 2);
        assert_eq!(board.delivered.len(), 1);
        assert!(board.in_progress.is_empty());
    }
}
