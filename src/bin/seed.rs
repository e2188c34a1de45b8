use std::env;

use grocery_storefront::{
    config::{AdminBootstrap, database_url_from_env},
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::ensure_admin_account,
};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;

    let pool = create_pool(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    seed_products(&pool).await?;

    match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            let orm = create_orm_conn(&database_url).await?;
            let admin = AdminBootstrap {
                email,
                password,
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrador".to_string()),
            };
            let admin_id = ensure_admin_account(&orm, &admin).await?;
            println!("Ensured admin account (id={admin_id})");
        }
        _ => println!("ADMIN_EMAIL/ADMIN_PASSWORD not set; skipping admin account"),
    }

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // (name, price in cents, stock, category)
    let products = [
        ("Arroz 5kg", 2499, 100, 1),
        ("Feijao Carioca 1kg", 850, 100, 1),
        ("Cafe Torrado 500g", 1590, 60, 1),
        ("Leite Integral 1L", 499, 120, 2),
        ("Agua Mineral 1,5L", 325, 200, 2),
        ("Suco de Laranja 1L", 899, 40, 2),
    ];

    for (name, cents, stock, category) in products {
        sqlx::query(
            r#"
            INSERT INTO produtos ("NomeProduto", "Preco", "Quantidade", "IdCategoria")
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM produtos WHERE "NomeProduto" = $1)
            "#,
        )
        .bind(name)
        .bind(Decimal::new(cents, 2))
        .bind(stock)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
