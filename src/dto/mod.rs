pub mod auth;
pub mod products;
pub mod profile;
pub mod purchase;
