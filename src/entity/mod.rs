pub mod categories;
pub mod products;
pub mod purchase_items;
pub mod purchases;
pub mod users;

pub use categories::Entity as Categories;
pub use products::Entity as Products;
pub use purchase_items::Entity as PurchaseItems;
pub use purchases::Entity as Purchases;
pub use users::Entity as Users;
