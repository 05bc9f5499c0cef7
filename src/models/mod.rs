pub mod auth;
pub mod common;
pub mod pagination;
pub mod voucher;

pub use auth::*;
pub use common::*;
pub use pagination::*;
pub use voucher::*;
