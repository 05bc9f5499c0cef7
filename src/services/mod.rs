pub mod auth_service;
pub mod voucher_csv;
pub mod voucher_service;

pub use auth_service::*;
pub use voucher_service::*;
