//! Data access behind a trait so orchestration can be tested without a database.

mod voucher_repository;

pub use voucher_repository::{VoucherRepository, VoucherStore};

#[cfg(test)]
pub use voucher_repository::MockVoucherRepository;
