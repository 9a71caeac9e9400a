pub mod pagination;
pub mod user;
