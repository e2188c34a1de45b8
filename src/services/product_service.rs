use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    dto::products::{CategoryList, ProductList, ProductRequest},
    entity::{
        categories::{Entity as Categories, Model as CategoryModel},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::{
        auth_service::require_admin,
        purchase_service::{MAX_MONEY, round_money},
    },
    state::AppState,
};

/// Checked and normalized product fields, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub category_id: Option<i32>,
}

pub fn validate_product(payload: ProductRequest) -> AppResult<ProductFields> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("NomeProduto is required".into()));
    }
    if payload.price < Decimal::ZERO {
        return Err(AppError::Validation("Preco must not be negative".into()));
    }
    if payload.price > MAX_MONEY {
        return Err(AppError::Validation(format!(
            "Preco must not exceed {MAX_MONEY}"
        )));
    }
    if payload.quantity < 0 {
        return Err(AppError::Validation("Quantidade must not be negative".into()));
    }
    Ok(ProductFields {
        name,
        price: round_money(payload.price),
        quantity: payload.quantity,
        category_id: payload.category_id,
    })
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col(Column::Name).ilike(pattern));
    }

    if let Some(category_id) = query.category {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i32) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity)
        .ok_or_else(|| product_not_found(id))?;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let fields = validate_product(payload)?;
    require_admin(state, user).await?;
    ensure_category_exists(state, fields.category_id).await?;

    let product = ActiveModel {
        id: NotSet,
        name: Set(fields.name),
        price: Set(fields.price),
        quantity: Set(fields.quantity),
        category_id: Set(fields.category_id),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = product.id, admin_id = user.user_id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let fields = validate_product(payload)?;
    require_admin(state, user).await?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    ensure_category_exists(state, fields.category_id).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(fields.name);
    active.price = Set(fields.price);
    active.quantity = Set(fields.quantity);
    active.category_id = Set(fields.category_id);
    let product = active.update(&state.orm).await?;

    tracing::info!(product_id = product.id, admin_id = user.user_id, "product updated");

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(state, user).await?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(product_not_found(id));
    }

    tracing::info!(product_id = id, admin_id = user.user_id, "product deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "IdProduto": id }),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(crate::entity::categories::Column::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

async fn ensure_category_exists(state: &AppState, category_id: Option<i32>) -> AppResult<()> {
    let Some(category_id) = category_id else {
        return Ok(());
    };
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::Validation(format!(
            "Category {category_id} does not exist"
        )));
    }
    Ok(())
}

fn product_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Product {id} not found"))
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        category_id: model.category_id,
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
    }
}
