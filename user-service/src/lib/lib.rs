pub mod config;
pub mod context;
pub mod domain;
pub mod i18n;
pub mod inbound;
pub mod outbound;

pub use domain::user;
pub use outbound::repositories;
