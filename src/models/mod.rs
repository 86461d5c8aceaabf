mod customer;
mod product;
mod user;

pub use customer::Customer;
pub use product::Product;
pub use user::{ROLE_ADMIN, ROLE_USER, User};
