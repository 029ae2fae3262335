use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    billing::{
        checked_money_add, compute_totals, format_invoice_number, line_total, reconcile_status,
        stock_after_sale, MAX_MONEY,
    },
    clients::find_client,
    clinics::validate_percentage,
    non_blank,
    pets::find_pet,
    products::{apply_stock_change, lock_product, StockReference},
    ticket, validate_money, validate_positive, PageRequest,
};
use crate::{
    db::{map_transaction_error, retry_on_unique_conflict, DbPool},
    entities::{
        appointment, clinic, invoice, invoice_item, payment, pet, product, service,
        stock_movement, InvoiceStatus, ItemType, MovementType, PaymentMethod,
    },
    errors::{FieldErrorsBuilder, ServiceError},
    tracing::with_metrics,
};

const MAX_NUMBERING_ATTEMPTS: usize = 3;
const INVOICE_REFERENCE: &str = "invoice";

/// One billed line. Description, price and tax rate default from the catalog row.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InvoiceLineRequest {
    pub item_type: ItemType,
    pub service_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "quantity must be greater than zero"))]
    pub quantity: i32,
    #[validate(custom = "validate_money")]
    pub unit_price: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub tax_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewPayment {
    #[validate(custom = "validate_positive")]
    pub amount: Decimal,
    #[serde(default)]
    pub method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    /// Defaults to now
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub client_id: Uuid,
    pub pet_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    #[validate]
    pub items: Vec<InvoiceLineRequest>,
    /// Flat amount taken off the subtotal before tax
    #[validate(custom = "validate_money")]
    pub discount: Option<Decimal>,
    /// Overall percentage, defaults to the clinic rate
    #[validate(custom = "validate_percentage")]
    pub tax_rate: Option<Decimal>,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Keep as DRAFT: no stock change, no payment
    #[serde(default)]
    pub save_as_draft: bool,
    /// Payment collected at the counter together with the invoice
    #[validate]
    pub payment: Option<NewPayment>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct VoidInvoiceRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<Uuid>,
    /// First issue date included
    pub from: Option<NaiveDate>,
    /// Last issue date included
    pub to: Option<NaiveDate>,
}

/// Invoice with its lines and payments
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceDetail {
    pub invoice: invoice::Model,
    pub items: Vec<invoice_item::Model>,
    pub payments: Vec<payment::Model>,
    pub balance_due: Decimal,
}

/// A request line checked against the catalog
#[derive(Debug, Clone)]
struct ResolvedLine {
    item_type: ItemType,
    service_id: Option<Uuid>,
    product_id: Option<Uuid>,
    description: String,
    quantity: i32,
    unit_price: Decimal,
    tax_rate: Decimal,
    line_total: Decimal,
}

/// Field checks that need no database access.
pub fn check_invoice_request(request: &CreateInvoiceRequest) -> Result<(), ServiceError> {
    let mut errors = FieldErrorsBuilder::new();
    if let Err(e) = request.validate() {
        errors.merge(&e, "");
    }
    if request.items.is_empty() {
        errors.add("items", "at least one line item is required");
    }
    if request.save_as_draft && request.payment.is_some() {
        errors.add("payment", "a draft invoice cannot take a payment");
    }
    for (i, line) in request.items.iter().enumerate() {
        match line.item_type {
            ItemType::Service => {
                if line.service_id.is_none() {
                    errors.add(format!("items[{}].service_id", i), "required for SERVICE lines");
                }
                if line.product_id.is_some() {
                    errors.add(format!("items[{}].product_id", i), "not allowed on SERVICE lines");
                }
            }
            ItemType::Product => {
                if line.product_id.is_none() {
                    errors.add(format!("items[{}].product_id", i), "required for PRODUCT lines");
                }
                if line.service_id.is_some() {
                    errors.add(format!("items[{}].service_id", i), "not allowed on PRODUCT lines");
                }
            }
        }
    }
    errors.finish()
}

async fn resolve_lines<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    lines: &[InvoiceLineRequest],
) -> Result<Vec<ResolvedLine>, ServiceError> {
    let mut errors = FieldErrorsBuilder::new();
    let mut resolved = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let defaults = match (line.item_type, line.service_id, line.product_id) {
            (ItemType::Service, Some(service_id), _) => service::Entity::find_by_id(service_id)
                .filter(service::Column::ClinicId.eq(clinic_id))
                .filter(service::Column::IsActive.eq(true))
                .one(db)
                .await?
                .map(|s| (s.name, s.price, s.tax_rate)),
            (ItemType::Product, _, Some(product_id)) => product::Entity::find_by_id(product_id)
                .filter(product::Column::ClinicId.eq(clinic_id))
                .filter(product::Column::IsActive.eq(true))
                .one(db)
                .await?
                .map(|p| (p.name, p.unit_price, p.tax_rate)),
            _ => None,
        };

        let Some((name, price, tax_rate)) = defaults else {
            let field = match line.item_type {
                ItemType::Service => "service_id",
                ItemType::Product => "product_id",
            };
            errors.add(format!("items[{}].{}", i, field), "unknown or inactive catalog item");
            continue;
        };

        let unit_price = line.unit_price.unwrap_or(price);
        let Some(total) = line_total(line.quantity, unit_price) else {
            errors.add(
                format!("items[{}].quantity", i),
                format!("line total exceeds the maximum amount of {}", MAX_MONEY),
            );
            continue;
        };
        resolved.push(ResolvedLine {
            item_type: line.item_type,
            service_id: line.service_id,
            product_id: line.product_id,
            description: non_blank(line.description.clone()).unwrap_or(name),
            quantity: line.quantity,
            unit_price,
            tax_rate: line.tax_rate.unwrap_or(tax_rate),
            line_total: total,
        });
    }

    errors.finish()?;
    Ok(resolved)
}

async fn next_sequence<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    issue_date: NaiveDate,
) -> Result<i32, ServiceError> {
    let current: Option<Option<i32>> = invoice::Entity::find()
        .select_only()
        .column_as(invoice::Column::Sequence.max(), "max_sequence")
        .filter(invoice::Column::ClinicId.eq(clinic_id))
        .filter(invoice::Column::IssueDate.eq(issue_date))
        .into_tuple()
        .one(db)
        .await?;
    Ok(current.flatten().unwrap_or(0) + 1)
}

/// Decrements tracked products for every product line and audits each change.
async fn apply_sale<C: ConnectionTrait>(
    db: &C,
    invoice: &invoice::Model,
    items: &[invoice_item::Model],
) -> Result<(), ServiceError> {
    for item in items {
        let Some(product_id) = item.product_id else {
            continue;
        };
        // re-read per line, the same product may appear twice
        let product = lock_product(db, invoice.clinic_id, product_id).await?;
        if !product.track_stock {
            continue;
        }
        let after = stock_after_sale(product.stock_on_hand, item.quantity);
        if product.stock_on_hand < item.quantity {
            warn!(
                product_id = %product_id,
                on_hand = product.stock_on_hand,
                sold = item.quantity,
                "selling more than on hand, stock floored at zero"
            );
        }
        apply_stock_change(
            db,
            product,
            after,
            MovementType::Sale,
            Some(StockReference {
                kind: INVOICE_REFERENCE,
                id: invoice.id,
            }),
            Some(format!("Invoice {}", invoice.number)),
        )
        .await?;
    }
    Ok(())
}

async fn insert_payment<C: ConnectionTrait>(
    db: &C,
    invoice: &invoice::Model,
    payment: NewPayment,
) -> Result<payment::Model, ServiceError> {
    Ok(payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        clinic_id: Set(invoice.clinic_id),
        invoice_id: Set(invoice.id),
        amount: Set(payment.amount),
        method: Set(payment.method),
        reference: Set(non_blank(payment.reference)),
        paid_at: Set(payment.paid_at.unwrap_or_else(Utc::now)),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

async fn load_detail<C: ConnectionTrait>(
    db: &C,
    invoice: invoice::Model,
) -> Result<InvoiceDetail, ServiceError> {
    let items = invoice_item::Entity::find()
        .filter(invoice_item::Column::InvoiceId.eq(invoice.id))
        .order_by_asc(invoice_item::Column::Position)
        .all(db)
        .await?;
    let payments = payment::Entity::find()
        .filter(payment::Column::InvoiceId.eq(invoice.id))
        .order_by_asc(payment::Column::PaidAt)
        .all(db)
        .await?;
    Ok(InvoiceDetail {
        balance_due: invoice.balance_due(),
        invoice,
        items,
        payments,
    })
}

async fn find_invoice<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    id: Uuid,
) -> Result<invoice::Model, ServiceError> {
    invoice::Entity::find_by_id(id)
        .filter(invoice::Column::ClinicId.eq(clinic_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invoice", id))
}

fn locked_invoice_query(clinic_id: Uuid, id: Uuid) -> Select<invoice::Entity> {
    invoice::Entity::find_by_id(id)
        .filter(invoice::Column::ClinicId.eq(clinic_id))
        .lock_exclusive()
}

/// Row-locked read for updates of the paid amount and the status.
async fn lock_invoice<C: ConnectionTrait>(
    txn: &C,
    clinic_id: Uuid,
    id: Uuid,
) -> Result<invoice::Model, ServiceError> {
    locked_invoice_query(clinic_id, id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invoice", id))
}

/// One attempt at creating the invoice; the caller retries on numbering races.
async fn create_in_transaction(
    txn: &DatabaseTransaction,
    clinic_id: Uuid,
    request: CreateInvoiceRequest,
) -> Result<InvoiceDetail, ServiceError> {
    let clinic = clinic::Entity::find_by_id(clinic_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Clinic", clinic_id))?;

    find_client(txn, clinic_id, request.client_id)
        .await
        .map_err(|_| ServiceError::field("client_id", "unknown client"))?;
    if let Some(pet_id) = request.pet_id {
        let pet = find_pet(txn, clinic_id, pet_id)
            .await
            .map_err(|_| ServiceError::field("pet_id", "unknown pet"))?;
        if pet.client_id != request.client_id {
            return Err(ServiceError::field("pet_id", "pet does not belong to this client"));
        }
    }
    if let Some(appointment_id) = request.appointment_id {
        let linked = appointment::Entity::find_by_id(appointment_id)
            .filter(appointment::Column::ClinicId.eq(clinic_id))
            .filter(appointment::Column::ClientId.eq(request.client_id))
            .one(txn)
            .await?;
        if linked.is_none() {
            return Err(ServiceError::field("appointment_id", "unknown appointment"));
        }
    }

    let lines = resolve_lines(txn, clinic_id, &request.items).await?;
    let totals = compute_totals(
        lines.iter().map(|l| l.line_total),
        request.discount.unwrap_or(Decimal::ZERO),
        request.tax_rate.unwrap_or(clinic.default_tax_rate),
    )
    .ok_or_else(|| {
        ServiceError::field(
            "items",
            format!("invoice total exceeds the maximum amount of {}", MAX_MONEY),
        )
    })?;

    let issue_date = request.issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let sequence = next_sequence(txn, clinic_id, issue_date).await?;
    let number = format_invoice_number(&clinic.invoice_prefix, issue_date, sequence);

    let amount_paid = request
        .payment
        .as_ref()
        .map(|p| p.amount)
        .unwrap_or(Decimal::ZERO);
    let status = if request.save_as_draft {
        InvoiceStatus::Draft
    } else {
        reconcile_status(totals.total, amount_paid)
    };

    let invoice = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        clinic_id: Set(clinic_id),
        client_id: Set(request.client_id),
        pet_id: Set(request.pet_id),
        appointment_id: Set(request.appointment_id),
        number: Set(number),
        sequence: Set(sequence),
        issue_date: Set(issue_date),
        status: Set(status),
        subtotal: Set(totals.subtotal),
        discount: Set(totals.discount),
        tax_rate: Set(totals.tax_rate),
        tax_amount: Set(totals.tax_amount),
        total: Set(totals.total),
        amount_paid: Set(amount_paid),
        notes: Set(request.notes),
        voided_at: Set(None),
        void_reason: Set(None),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (position, line) in lines.into_iter().enumerate() {
        let item = invoice_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            item_type: Set(line.item_type),
            service_id: Set(line.service_id),
            product_id: Set(line.product_id),
            description: Set(line.description),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            tax_rate: Set(line.tax_rate),
            line_total: Set(line.line_total),
            position: Set(position as i32),
        }
        .insert(txn)
        .await?;
        items.push(item);
    }

    if status != InvoiceStatus::Draft {
        apply_sale(txn, &invoice, &items).await?;
    }

    let mut payments = Vec::new();
    if let Some(new_payment) = request.payment {
        payments.push(insert_payment(txn, &invoice, new_payment).await?);
    }

    Ok(InvoiceDetail {
        balance_due: invoice.balance_due(),
        invoice,
        items,
        payments,
    })
}

/// Point of sale: invoices, payments and the printable ticket
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
}

impl InvoiceService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates the invoice, its lines, the stock movements and the optional
    /// payment in one transaction. The numbering race is retried a few times.
    #[instrument(skip(self, request), fields(client_id = %request.client_id, lines = request.items.len()))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceDetail, ServiceError> {
        check_invoice_request(&request)?;

        let detail = with_metrics(
            "invoice_create",
            retry_on_unique_conflict("an invoice number", MAX_NUMBERING_ATTEMPTS, || {
                let attempt_request = request.clone();
                async move {
                    self.db_pool
                        .transaction::<_, InvoiceDetail, ServiceError>(|txn| {
                            Box::pin(create_in_transaction(txn, clinic_id, attempt_request))
                        })
                        .await
                        .map_err(map_transaction_error)
                }
            }),
        )
        .await?;

        counter!(
            "vetclinic_invoices_created_total",
            1,
            "status" => detail.invoice.status.to_string()
        );
        info!(
            invoice_id = %detail.invoice.id,
            number = %detail.invoice.number,
            total = %detail.invoice.total,
            status = %detail.invoice.status,
            "invoice created"
        );
        Ok(detail)
    }

    pub async fn get(&self, clinic_id: Uuid, id: Uuid) -> Result<InvoiceDetail, ServiceError> {
        let db = &*self.db_pool;
        let invoice = find_invoice(db, clinic_id, id).await?;
        load_detail(db, invoice).await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: InvoiceFilter,
        page: PageRequest,
    ) -> Result<(Vec<invoice::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = invoice::Entity::find().filter(invoice::Column::ClinicId.eq(clinic_id));
        if let Some(status) = filter.status {
            query = query.filter(invoice::Column::Status.eq(status));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(invoice::Column::ClientId.eq(client_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(invoice::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(invoice::Column::IssueDate.lte(to));
        }

        let paginator = query
            .order_by_desc(invoice::Column::IssueDate)
            .order_by_desc(invoice::Column::Sequence)
            .paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok((items, total))
    }

    /// Records a payment and re-reconciles the status from all payments.
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn add_payment(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: NewPayment,
    ) -> Result<InvoiceDetail, ServiceError> {
        request.validate()?;

        let detail = self
            .db_pool
            .transaction::<_, InvoiceDetail, ServiceError>(|txn| {
                Box::pin(async move {
                    let invoice = lock_invoice(txn, clinic_id, id).await?;
                    if !invoice.status.accepts_payments() {
                        return Err(ServiceError::InvalidStatus(format!(
                            "Invoice {} is {} and does not accept payments",
                            invoice.number, invoice.status
                        )));
                    }

                    let paid = checked_money_add(invoice.amount_paid, request.amount)
                        .ok_or_else(|| {
                            ServiceError::field(
                                "amount",
                                format!("total paid would exceed {}", MAX_MONEY),
                            )
                        })?;
                    insert_payment(txn, &invoice, request).await?;

                    let status = reconcile_status(invoice.total, paid);
                    let mut model: invoice::ActiveModel = invoice.into();
                    model.amount_paid = Set(paid);
                    model.status = Set(status);
                    let invoice = model.update(txn).await?;
                    load_detail(txn, invoice).await
                })
            })
            .await
            .map_err(map_transaction_error)?;

        counter!("vetclinic_payments_recorded_total", 1);
        info!(
            invoice_id = %id,
            status = %detail.invoice.status,
            balance_due = %detail.balance_due,
            "payment recorded"
        );
        Ok(detail)
    }

    /// DRAFT -> ISSUED. Stock leaves the shelf at this point.
    #[instrument(skip(self))]
    pub async fn issue(&self, clinic_id: Uuid, id: Uuid) -> Result<InvoiceDetail, ServiceError> {
        let detail = self
            .db_pool
            .transaction::<_, InvoiceDetail, ServiceError>(|txn| {
                Box::pin(async move {
                    let invoice = lock_invoice(txn, clinic_id, id).await?;
                    if invoice.status != InvoiceStatus::Draft {
                        return Err(ServiceError::InvalidStatus(format!(
                            "Invoice {} is {}, only drafts can be issued",
                            invoice.number, invoice.status
                        )));
                    }
                    let detail = load_detail(txn, invoice).await?;
                    apply_sale(txn, &detail.invoice, &detail.items).await?;

                    let status = reconcile_status(detail.invoice.total, detail.invoice.amount_paid);
                    let mut model: invoice::ActiveModel = detail.invoice.into();
                    model.status = Set(status);
                    let invoice = model.update(txn).await?;
                    Ok(InvoiceDetail {
                        balance_due: invoice.balance_due(),
                        invoice,
                        items: detail.items,
                        payments: detail.payments,
                    })
                })
            })
            .await
            .map_err(map_transaction_error)?;

        info!(invoice_id = %id, number = %detail.invoice.number, "invoice issued");
        Ok(detail)
    }

    /// Voids an unpaid invoice and puts sold units back on the shelf.
    #[instrument(skip(self, request))]
    pub async fn void(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: VoidInvoiceRequest,
    ) -> Result<InvoiceDetail, ServiceError> {
        request.validate()?;

        let detail = self
            .db_pool
            .transaction::<_, InvoiceDetail, ServiceError>(|txn| {
                Box::pin(async move {
                    let invoice = lock_invoice(txn, clinic_id, id).await?;
                    let voidable = matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Issued);
                    if !voidable || invoice.amount_paid > Decimal::ZERO {
                        return Err(ServiceError::InvalidStatus(format!(
                            "Invoice {} is {} and cannot be voided",
                            invoice.number, invoice.status
                        )));
                    }

                    let sales = stock_movement::Entity::find()
                        .filter(stock_movement::Column::ClinicId.eq(clinic_id))
                        .filter(stock_movement::Column::ReferenceType.eq(INVOICE_REFERENCE))
                        .filter(stock_movement::Column::ReferenceId.eq(invoice.id))
                        .filter(stock_movement::Column::MovementType.eq(MovementType::Sale))
                        .all(txn)
                        .await?;
                    for sale in sales {
                        let removed = sale.previous_quantity - sale.new_quantity;
                        if removed <= 0 {
                            continue;
                        }
                        let product = lock_product(txn, clinic_id, sale.product_id).await?;
                        let restocked = product.stock_on_hand.saturating_add(removed);
                        apply_stock_change(
                            txn,
                            product,
                            restocked,
                            MovementType::Return,
                            Some(StockReference {
                                kind: INVOICE_REFERENCE,
                                id: invoice.id,
                            }),
                            Some(format!("Invoice {} voided", invoice.number)),
                        )
                        .await?;
                    }

                    let mut model: invoice::ActiveModel = invoice.into();
                    model.status = Set(InvoiceStatus::Void);
                    model.voided_at = Set(Some(Utc::now()));
                    model.void_reason = Set(non_blank(request.reason));
                    let invoice = model.update(txn).await?;
                    load_detail(txn, invoice).await
                })
            })
            .await
            .map_err(map_transaction_error)?;

        info!(invoice_id = %id, number = %detail.invoice.number, "invoice voided");
        Ok(detail)
    }

    pub async fn render_ticket(&self, clinic_id: Uuid, id: Uuid) -> Result<String, ServiceError> {
        let db = &*self.db_pool;
        let detail = self.get(clinic_id, id).await?;
        let clinic = clinic::Entity::find_by_id(clinic_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Clinic", clinic_id))?;
        // archived clients still appear on their old invoices
        let client = crate::entities::client::Entity::find_by_id(detail.invoice.client_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Client", detail.invoice.client_id))?;
        let pet = match detail.invoice.pet_id {
            Some(pet_id) => pet::Entity::find_by_id(pet_id).one(db).await?,
            None => None,
        };

        Ok(ticket::render(&clinic, &client, pet.as_ref(), &detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn payment_reads_lock_the_invoice_row() {
        let sql = locked_invoice_query(Uuid::new_v4(), Uuid::new_v4())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "{}", sql);
        // SQLite serialises writers itself and has no row locks
        let sql = locked_invoice_query(Uuid::new_v4(), Uuid::new_v4())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(!sql.contains("FOR UPDATE"), "{}", sql);
    }

    fn line(item_type: ItemType, quantity: i32) -> InvoiceLineRequest {
        InvoiceLineRequest {
            item_type,
            service_id: matches!(item_type, ItemType::Service).then(Uuid::new_v4),
            product_id: matches!(item_type, ItemType::Product).then(Uuid::new_v4),
            description: None,
            quantity,
            unit_price: Some(dec!(25)),
            tax_rate: None,
        }
    }

    fn request(items: Vec<InvoiceLineRequest>) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            client_id: Uuid::new_v4(),
            pet_id: None,
            appointment_id: None,
            items,
            discount: None,
            tax_rate: None,
            issue_date: None,
            notes: None,
            save_as_draft: false,
            payment: None,
        }
    }

    #[test]
    fn well_formed_request_passes() {
        let req = request(vec![line(ItemType::Service, 1), line(ItemType::Product, 1)]);
        assert!(check_invoice_request(&req).is_ok());
    }

    #[test]
    fn line_errors_are_keyed_by_index() {
        let mut bad = line(ItemType::Product, 0);
        bad.product_id = None;
        let req = request(vec![line(ItemType::Service, 1), bad]);

        let err = check_invoice_request(&req).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("items[1].quantity"));
        assert!(fields.contains_key("items[1].product_id"));
        assert!(!fields.keys().any(|k| k.starts_with("items[0]")));
    }

    #[test]
    fn empty_invoice_and_draft_payment_are_rejected() {
        let mut req = request(vec![]);
        req.save_as_draft = true;
        req.payment = Some(NewPayment {
            amount: dec!(10),
            method: PaymentMethod::Cash,
            reference: None,
            paid_at: None,
        });
        let err = check_invoice_request(&req).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("items"));
        assert!(fields.contains_key("payment"));
    }

    #[test]
    fn negative_discount_and_payment_are_field_errors() {
        let mut req = request(vec![line(ItemType::Service, 1)]);
        req.discount = Some(dec!(-1));
        req.payment = Some(NewPayment {
            amount: dec!(0),
            method: PaymentMethod::Card,
            reference: None,
            paid_at: None,
        });
        let err = check_invoice_request(&req).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("discount"));
        assert!(fields.contains_key("payment.amount"));
    }
}
