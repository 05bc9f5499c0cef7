pub mod vouchers;

pub use vouchers as voucher_entity;
