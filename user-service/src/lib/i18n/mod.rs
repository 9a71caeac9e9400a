//! Message catalogs and per-request language selection.

pub mod catalog;
pub mod locale;
pub mod messages;

pub use catalog::Catalog;
pub use catalog::CatalogError;
pub use locale::Locale;
pub use messages::MessageKey;
