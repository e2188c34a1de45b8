use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    dto::purchase::CartEntry,
    entity::{
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        purchase_items::{
            ActiveModel as PurchaseItemActive, Column as PurchaseItemCol,
            Entity as PurchaseItems, Model as PurchaseItemModel,
        },
        purchases::{
            ActiveModel as PurchaseActive, Column as PurchaseCol, Entity as Purchases,
            Model as PurchaseModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Receipt, ReceiptItem},
    services::auth_service::current_user,
    state::AppState,
};

/// A cart entry that passed shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: i32,
}

/// Outcome of walking a cart against locked product rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPlan {
    pub items: Vec<ReceiptItem>,
    /// Units to take from each product, keyed by product id.
    pub decrements: BTreeMap<i32, i32>,
    pub total: Decimal,
}

/// Largest amount a `NUMERIC(12,2)` money column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2); // 9_999_999_999.99

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_subtotal(price: Decimal, quantity: i32) -> Decimal {
    round_money(price * Decimal::from(quantity))
}

/// Checks the shape of every entry before any storage work. Reports the first
/// malformed entry (1-based position).
pub fn validate_cart(cart: &[CartEntry]) -> AppResult<Vec<CartLine>> {
    if cart.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }

    cart.iter()
        .enumerate()
        .map(|(idx, entry)| {
            let position = idx + 1;
            let product_id = entry.product_id.ok_or_else(|| {
                AppError::Validation(format!("Cart entry {position} is missing IdProduto"))
            })?;
            let quantity = entry.quantity.ok_or_else(|| {
                AppError::Validation(format!("Cart entry {position} is missing Quantidade"))
            })?;
            if quantity <= 0 {
                return Err(AppError::Validation(format!(
                    "Cart entry {position} has invalid quantity {quantity}"
                )));
            }
            Ok(CartLine {
                product_id,
                quantity,
            })
        })
        .collect()
}

/// Walks the cart in caller order against the locked rows and stops at the
/// first entry that cannot be fulfilled. Repeated products draw from the same
/// remaining stock.
pub fn plan_checkout(
    lines: &[CartLine],
    locked: &HashMap<i32, ProductModel>,
) -> AppResult<CheckoutPlan> {
    let mut remaining: HashMap<i32, i32> = HashMap::new();
    let mut decrements: BTreeMap<i32, i32> = BTreeMap::new();
    let mut items = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for line in lines {
        let product = locked
            .get(&line.product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", line.product_id)))?;

        let available = remaining
            .get(&product.id)
            .copied()
            .unwrap_or(product.quantity);
        if available < line.quantity {
            return Err(AppError::InsufficientStock {
                product_id: product.id,
                available,
            });
        }
        remaining.insert(product.id, available - line.quantity);
        *decrements.entry(product.id).or_insert(0) += line.quantity;

        let subtotal = line_subtotal(product.price, line.quantity);
        total += subtotal;
        if subtotal > MAX_MONEY || total > MAX_MONEY {
            return Err(AppError::Validation(format!(
                "Purchase total exceeds the maximum of {MAX_MONEY}"
            )));
        }
        items.push(ReceiptItem {
            product_id: Some(product.id),
            name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            subtotal,
        });
    }

    Ok(CheckoutPlan {
        items,
        decrements,
        total: round_money(total),
    })
}

/// Validates the cart, then decrements stock and records the purchase in a
/// single transaction. Nothing is written unless every entry succeeds.
pub async fn checkout(
    state: &AppState,
    user: Option<&AuthUser>,
    cart: Vec<CartEntry>,
) -> AppResult<Receipt> {
    let lines = validate_cart(&cart)?;
    let user_id = user.map(|u| u.user_id);

    let txn = state.orm.begin().await?;
    match apply_checkout(&txn, &lines, user_id).await {
        Ok(receipt) => {
            txn.commit().await?;
            tracing::info!(
                purchase_id = receipt.purchase_id,
                user_id = ?user_id,
                items = receipt.items.len(),
                total = %receipt.total,
                "checkout committed"
            );
            Ok(receipt)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "checkout rollback failed");
            }
            tracing::info!(user_id = ?user_id, error = %err, "checkout rejected");
            Err(err)
        }
    }
}

async fn apply_checkout(
    txn: &DatabaseTransaction,
    lines: &[CartLine],
    user_id: Option<i32>,
) -> AppResult<Receipt> {
    // Shared lock keeps the buyer's row in place until the purchase references it.
    if let Some(user_id) = user_id {
        Users::find_by_id(user_id)
            .lock_shared()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;
    }

    let mut ids: Vec<i32> = lines.iter().map(|line| line.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    // SELECT ... FOR UPDATE in id order, so concurrent carts queue on the same rows
    // in the same sequence.
    let locked: HashMap<i32, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let plan = plan_checkout(lines, &locked)?;

    for (product_id, taken) in &plan.decrements {
        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(*taken))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(txn)
            .await?;
    }

    let purchase = PurchaseActive {
        id: NotSet,
        user_id: Set(user_id),
        purchased_at: Set(Utc::now().into()),
        total: Set(plan.total),
    }
    .insert(txn)
    .await?;

    let rows = plan.items.iter().map(|item| PurchaseItemActive {
        id: NotSet,
        purchase_id: Set(purchase.id),
        product_id: Set(item.product_id),
        name: Set(item.name.clone()),
        price: Set(item.price),
        quantity: Set(item.quantity),
        subtotal: Set(item.subtotal),
    });
    PurchaseItems::insert_many(rows).exec(txn).await?;

    Ok(Receipt {
        purchase_id: purchase.id,
        user_id: purchase.user_id,
        purchased_at: purchase.purchased_at.with_timezone(&Utc),
        items: plan.items,
        total: plan.total,
    })
}

/// Purchase history, newest first. Admins see every purchase, everyone else
/// only their own.
pub async fn list_purchases(state: &AppState, user: &AuthUser) -> AppResult<Vec<Receipt>> {
    let user = current_user(state, user).await?;
    let mut finder = Purchases::find();
    if !user.is_admin() {
        finder = finder.filter(PurchaseCol::UserId.eq(user.user_id));
    }

    let purchases = finder
        .order_by_desc(PurchaseCol::PurchasedAt)
        .order_by_desc(PurchaseCol::Id)
        .all(&state.orm)
        .await?;

    if purchases.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = purchases.iter().map(|p| p.id).collect();
    let mut items_by_purchase: HashMap<i32, Vec<ReceiptItem>> = HashMap::new();
    for item in PurchaseItems::find()
        .filter(PurchaseItemCol::PurchaseId.is_in(ids))
        .order_by_asc(PurchaseItemCol::Id)
        .all(&state.orm)
        .await?
    {
        items_by_purchase
            .entry(item.purchase_id)
            .or_default()
            .push(receipt_item_from_entity(item));
    }

    Ok(purchases
        .into_iter()
        .map(|purchase| {
            let items = items_by_purchase.remove(&purchase.id).unwrap_or_default();
            receipt_from_entity(purchase, items)
        })
        .collect())
}

fn receipt_from_entity(model: PurchaseModel, items: Vec<ReceiptItem>) -> Receipt {
    Receipt {
        purchase_id: model.id,
        user_id: model.user_id,
        purchased_at: model.purchased_at.with_timezone(&Utc),
        items,
        total: model.total,
    }
}

fn receipt_item_from_entity(model: PurchaseItemModel) -> ReceiptItem {
    ReceiptItem {
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        subtotal: model.subtotal,
    }
}
