use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
            ResetPasswordRequest,
        },
        products::{CategoryList, ProductList, ProductRequest},
        profile::{UpdateProfileRequest, UserList},
        purchase::{CartEntry, CheckoutRequest, ReceiptList},
    },
    models::{Category, Product, Receipt, ReceiptItem, User, UserRole},
    response::{ApiResponse, Meta},
    routes::{auth, health, params, products, purchase, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::forgot_password,
        auth::reset_password,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_categories,
        purchase::purchase,
        purchase::history,
        users::get_profile,
        users::update_profile,
        users::list_users,
        users::delete_user
    ),
    components(
        schemas(
            User,
            UserRole,
            Category,
            Product,
            Receipt,
            ReceiptItem,
            CartEntry,
            CheckoutRequest,
            ReceiptList,
            ProductRequest,
            ProductList,
            CategoryList,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdateProfileRequest,
            UserList,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Receipt>,
            ApiResponse<ReceiptList>,
            ApiResponse<User>,
            ApiResponse<LoginResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Purchases", description = "Checkout and purchase history"),
        (name = "Auth", description = "Registration, login and password recovery"),
        (name = "Users", description = "Profile and user management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
