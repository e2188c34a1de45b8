mod common;

use grocery_storefront::{
    dto::products::ProductRequest,
    error::AppError,
    models::UserRole,
    routes::params::ProductQuery,
    services::product_service,
};
use rust_decimal::Decimal;

fn request(name: &str, price: Decimal, quantity: i32, category_id: Option<i32>) -> ProductRequest {
    ProductRequest {
        name: name.to_string(),
        price,
        quantity,
        category_id,
    }
}

#[tokio::test]
async fn admin_manages_products_end_to_end() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let name = common::unique("Azeite");

    let created = product_service::create_product(
        &state,
        &admin,
        request(&name, Decimal::new(3290, 2), 12, Some(1)),
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("missing product"))?;
    assert_eq!(created.name, name);
    assert_eq!(created.price, Decimal::new(3290, 2));

    let updated = product_service::update_product(
        &state,
        &admin,
        created.id,
        request(&name, Decimal::new(2990, 2), 8, Some(2)),
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("missing product"))?;
    assert_eq!(updated.price, Decimal::new(2990, 2));
    assert_eq!(updated.quantity, 8);
    assert_eq!(updated.category_id, Some(2));

    let fetched = product_service::get_product(&state, created.id)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("missing product"))?;
    assert_eq!(fetched, updated);

    product_service::delete_product(&state, &admin, created.id).await?;
    let err = product_service::get_product(&state, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn missing_products_are_not_found() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;

    let err = product_service::update_product(
        &state,
        &admin,
        i32::MAX,
        request("Fantasma", Decimal::ONE, 1, None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = product_service::delete_product(&state, &admin, i32::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn unknown_category_is_rejected() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;

    let err = product_service::create_product(
        &state,
        &admin,
        request(&common::unique("Mel"), Decimal::new(1800, 2), 3, Some(i32::MAX)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("Category")));

    let name = common::unique("Mel");
    let product_id = common::create_product(&state, &name, Decimal::new(1800, 2), 3).await?;
    let err = product_service::update_product(
        &state,
        &admin,
        product_id,
        request(&name, Decimal::new(1800, 2), 3, Some(i32::MAX)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn listing_filters_and_pages() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let marker = common::unique("lote");

    for (label, category) in [("Arroz", 1), ("Feijao", 1), ("Refrigerante", 2)] {
        product_service::create_product(
            &state,
            &admin,
            request(
                &format!("{label} {marker}"),
                Decimal::new(500, 2),
                5,
                Some(category),
            ),
        )
        .await?;
    }

    let first_page = product_service::list_products(
        &state,
        ProductQuery {
            page: Some(1),
            per_page: Some(2),
            q: Some(marker.to_uppercase()),
            category: None,
        },
    )
    .await?;
    let items = first_page
        .data
        .ok_or_else(|| anyhow::anyhow!("missing products"))?
        .items;
    assert_eq!(items.len(), 2);
    assert!(items[0].id < items[1].id);
    let meta = first_page.meta.ok_or_else(|| anyhow::anyhow!("missing meta"))?;
    assert_eq!(meta.total, Some(3));
    assert_eq!(meta.per_page, Some(2));

    let second_page = product_service::list_products(
        &state,
        ProductQuery {
            page: Some(2),
            per_page: Some(2),
            q: Some(marker.clone()),
            category: None,
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("missing products"))?
    .items;
    assert_eq!(second_page.len(), 1);

    let drinks = product_service::list_products(
        &state,
        ProductQuery {
            q: Some(marker),
            category: Some(2),
            ..Default::default()
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("missing products"))?
    .items;
    assert_eq!(drinks.len(), 1);
    assert!(drinks[0].name.starts_with("Refrigerante"));
    Ok(())
}

#[tokio::test]
async fn seeded_categories_are_listed() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };

    let categories = product_service::list_categories(&state)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("missing categories"))?
        .items;
    let seeded: Vec<(i32, &str)> = categories
        .iter()
        .take(2)
        .map(|c| (c.id, c.name.as_str()))
        .collect();
    assert_eq!(seeded, vec![(1, "Alimentos"), (2, "Bebidas")]);
    Ok(())
}
