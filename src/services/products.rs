use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    catalog::RemovalOutcome, clinics::validate_percentage, non_blank,
    notifications::push_notification, search_condition, validate_money, PageRequest,
};
use crate::{
    db::{map_transaction_error, DbPool},
    entities::{invoice_item, product, stock_movement, MovementType, NotificationKind},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub unit_price: Decimal,
    #[validate(custom = "validate_money")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub tax_rate: Option<Decimal>,
    #[serde(default = "default_track_stock")]
    pub track_stock: bool,
    #[validate(range(min = 0, message = "initial stock cannot be negative"))]
    #[serde(default)]
    pub initial_stock: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub min_stock: i32,
    #[validate(length(max = 20))]
    pub unit: Option<String>,
}

fn default_track_stock() -> bool {
    true
}

/// Catalog fields only; stock changes go through [`ProductService::adjust_stock`].
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub unit_price: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_percentage")]
    pub tax_rate: Option<Decimal>,
    pub track_stock: Option<bool>,
    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,
    #[validate(length(max = 20))]
    pub unit: Option<String>,
    pub is_active: Option<bool>,
}

/// Manual stock change. Exactly one of `delta` and `set_to` must be given.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentRequest {
    /// Signed change applied to the current count
    pub delta: Option<i32>,
    /// Absolute count after a physical inventory
    #[validate(range(min = 0))]
    pub set_to: Option<i32>,
    /// Defaults to PURCHASE for positive deltas and ADJUSTMENT otherwise
    pub movement_type: Option<MovementType>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ProductFilter {
    /// Matches name, SKU or description
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

pub(crate) async fn find_product<C: ConnectionTrait>(
    db: &C,
    clinic_id: Uuid,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(product_id)
        .filter(product::Column::ClinicId.eq(clinic_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", product_id))
}

fn locked_product_query(clinic_id: Uuid, product_id: Uuid) -> Select<product::Entity> {
    product::Entity::find_by_id(product_id)
        .filter(product::Column::ClinicId.eq(clinic_id))
        .lock_exclusive()
}

/// Reads the product holding a row lock until the transaction ends, so
/// concurrent stock changes apply one after the other.
pub(crate) async fn lock_product<C: ConnectionTrait>(
    txn: &C,
    clinic_id: Uuid,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    locked_product_query(clinic_id, product_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", product_id))
}

/// Link from a stock movement to the document that caused it
#[derive(Debug, Clone, Copy)]
pub(crate) struct StockReference {
    pub kind: &'static str,
    pub id: Uuid,
}

/// Writes the new on-hand count together with its audit row, and raises a
/// LOW_STOCK notification when a decrease lands at or under the minimum.
pub(crate) async fn apply_stock_change<C: ConnectionTrait>(
    db: &C,
    product: product::Model,
    new_quantity: i32,
    movement_type: MovementType,
    reference: Option<StockReference>,
    reason: Option<String>,
) -> Result<(product::Model, stock_movement::Model), ServiceError> {
    let previous_quantity = product.stock_on_hand;
    let new_quantity = new_quantity.max(0);
    let clinic_id = product.clinic_id;
    let product_id = product.id;

    let mut model: product::ActiveModel = product.into();
    model.stock_on_hand = Set(new_quantity);
    let updated = model.update(db).await?;

    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        clinic_id: Set(clinic_id),
        product_id: Set(product_id),
        movement_type: Set(movement_type),
        quantity: Set(new_quantity - previous_quantity),
        previous_quantity: Set(previous_quantity),
        new_quantity: Set(new_quantity),
        reference_type: Set(reference.map(|r| r.kind.to_string())),
        reference_id: Set(reference.map(|r| r.id)),
        reason: Set(reason),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if updated.track_stock && new_quantity < previous_quantity && updated.is_low_stock() {
        warn!(
            product_id = %product_id,
            stock_on_hand = new_quantity,
            min_stock = updated.min_stock,
            "product reached low stock"
        );
        push_notification(
            db,
            clinic_id,
            NotificationKind::LowStock,
            format!("Low stock: {}", updated.name),
            format!(
                "{} has {} units left (minimum {}).",
                updated.name, new_quantity, updated.min_stock
            ),
            Some(("product", product_id)),
        )
        .await?;
    }

    Ok((updated, movement))
}

/// Target count of a manual adjustment, floored at zero.
pub fn adjusted_quantity(current: i32, delta: Option<i32>, set_to: Option<i32>) -> Result<i32, ServiceError> {
    match (delta, set_to) {
        (Some(delta), None) => Ok(current.saturating_add(delta).max(0)),
        (None, Some(target)) => Ok(target.max(0)),
        (Some(_), Some(_)) => Err(ServiceError::field("set_to", "give either delta or set_to, not both")),
        (None, None) => Err(ServiceError::field("delta", "delta or set_to is required")),
    }
}

/// Inventory: product catalog, stock adjustments and movement history
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        clinic_id: Uuid,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = product::Entity::find().filter(product::Column::ClinicId.eq(clinic_id));
        if !filter.include_inactive {
            query = query.filter(product::Column::IsActive.eq(true));
        }
        if let Some(category) = non_blank(filter.category) {
            query = query.filter(product::Column::Category.eq(category));
        }
        if let Some(term) = non_blank(filter.search) {
            query = query.filter(search_condition(
                &term,
                &[product::Column::Name, product::Column::Sku, product::Column::Description],
            ));
        }

        let paginator = query.order_by_asc(product::Column::Name).paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        clinic_id: Uuid,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let created = self
            .db_pool
            .transaction::<_, product::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let product = product::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        clinic_id: Set(clinic_id),
                        name: Set(request.name.trim().to_string()),
                        sku: Set(non_blank(request.sku)),
                        category: Set(non_blank(request.category)),
                        description: Set(request.description),
                        unit_price: Set(request.unit_price),
                        cost_price: Set(request.cost_price),
                        tax_rate: Set(request.tax_rate.unwrap_or(Decimal::ZERO)),
                        track_stock: Set(request.track_stock),
                        stock_on_hand: Set(0),
                        min_stock: Set(request.min_stock),
                        unit: Set(non_blank(request.unit)),
                        is_active: Set(true),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    if request.track_stock && request.initial_stock > 0 {
                        let (product, _) = apply_stock_change(
                            txn,
                            product,
                            request.initial_stock,
                            MovementType::Purchase,
                            None,
                            Some("Initial stock".to_string()),
                        )
                        .await?;
                        return Ok(product);
                    }
                    Ok(product)
                })
            })
            .await
            .map_err(map_transaction_error)?;

        info!(product_id = %created.id, stock = created.stock_on_hand, "product created");
        Ok(created)
    }

    pub async fn get(&self, clinic_id: Uuid, id: Uuid) -> Result<product::Model, ServiceError> {
        find_product(&*self.db_pool, clinic_id, id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(clinic_id, id).await?;
        let mut model: product::ActiveModel = existing.into();

        if let Some(v) = request.name {
            model.name = Set(v.trim().to_string());
        }
        if request.sku.is_some() {
            model.sku = Set(non_blank(request.sku));
        }
        if request.category.is_some() {
            model.category = Set(non_blank(request.category));
        }
        if let Some(v) = request.description {
            model.description = Set(Some(v));
        }
        if let Some(v) = request.unit_price {
            model.unit_price = Set(v);
        }
        if request.cost_price.is_some() {
            model.cost_price = Set(request.cost_price);
        }
        if let Some(v) = request.tax_rate {
            model.tax_rate = Set(v);
        }
        if let Some(v) = request.track_stock {
            model.track_stock = Set(v);
        }
        if let Some(v) = request.min_stock {
            model.min_stock = Set(v);
        }
        if request.unit.is_some() {
            model.unit = Set(non_blank(request.unit));
        }
        if let Some(v) = request.is_active {
            model.is_active = Set(v);
        }

        Ok(model.update(&*self.db_pool).await?)
    }

    /// Same policy as services: keep billed products, drop unused ones.
    #[instrument(skip(self))]
    pub async fn remove(&self, clinic_id: Uuid, id: Uuid) -> Result<RemovalOutcome, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(clinic_id, id).await?;
        let references = invoice_item::Entity::find()
            .filter(invoice_item::Column::ProductId.eq(id))
            .count(db)
            .await?;
        let movements = stock_movement::Entity::find()
            .filter(stock_movement::Column::ProductId.eq(id))
            .count(db)
            .await?;

        if references > 0 || movements > 0 {
            let mut model: product::ActiveModel = existing.into();
            model.is_active = Set(false);
            model.update(db).await?;
            info!(product_id = %id, "product deactivated");
            Ok(RemovalOutcome::Deactivated)
        } else {
            existing.delete(db).await?;
            info!(product_id = %id, "product deleted");
            Ok(RemovalOutcome::Deleted)
        }
    }

    #[instrument(skip(self, request))]
    pub async fn adjust_stock(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        request: StockAdjustmentRequest,
    ) -> Result<(product::Model, stock_movement::Model), ServiceError> {
        request.validate()?;

        let result = self
            .db_pool
            .transaction::<_, (product::Model, stock_movement::Model), ServiceError>(|txn| {
                Box::pin(async move {
                    let product = lock_product(txn, clinic_id, id).await?;
                    if !product.track_stock {
                        return Err(ServiceError::InvalidOperation(format!(
                            "Product {} does not track stock",
                            product.name
                        )));
                    }
                    let target =
                        adjusted_quantity(product.stock_on_hand, request.delta, request.set_to)?;
                    let movement_type = request.movement_type.unwrap_or(
                        if target > product.stock_on_hand && request.delta.is_some() {
                            MovementType::Purchase
                        } else {
                            MovementType::Adjustment
                        },
                    );
                    apply_stock_change(txn, product, target, movement_type, None, request.reason)
                        .await
                })
            })
            .await
            .map_err(map_transaction_error)?;

        info!(
            product_id = %id,
            previous = result.1.previous_quantity,
            current = result.1.new_quantity,
            "stock adjusted"
        );
        Ok(result)
    }

    pub async fn movements(
        &self,
        clinic_id: Uuid,
        id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = &*self.db_pool;
        self.get(clinic_id, id).await?;
        let paginator = stock_movement::Entity::find()
            .filter(stock_movement::Column::ClinicId.eq(clinic_id))
            .filter(stock_movement::Column::ProductId.eq(id))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .paginate(db, page.per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;
        Ok((items, total))
    }

    /// Tracked, active products at or under their minimum.
    pub async fn low_stock(&self, clinic_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::ClinicId.eq(clinic_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::TrackStock.eq(true))
            .order_by_asc(product::Column::StockOnHand)
            .all(&*self.db_pool)
            .await?;
        Ok(products.into_iter().filter(|p| p.is_low_stock()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn stock_reads_lock_the_product_row() {
        let sql = locked_product_query(Uuid::new_v4(), Uuid::new_v4())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "{}", sql);
    }

    #[test]
    fn adjustments_are_floored_at_zero() {
        assert_eq!(adjusted_quantity(5, Some(-3), None).unwrap(), 2);
        assert_eq!(adjusted_quantity(5, Some(-9), None).unwrap(), 0);
        assert_eq!(adjusted_quantity(5, None, Some(12)).unwrap(), 12);
        assert_eq!(adjusted_quantity(5, Some(i32::MAX), None).unwrap(), i32::MAX);
    }

    #[test]
    fn adjustment_needs_exactly_one_mode() {
        assert_matches!(
            adjusted_quantity(5, None, None),
            Err(ServiceError::InvalidFields(fields)) if fields.contains_key("delta")
        );
        assert_matches!(
            adjusted_quantity(5, Some(1), Some(1)),
            Err(ServiceError::InvalidFields(fields)) if fields.contains_key("set_to")
        );
    }
}
