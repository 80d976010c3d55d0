//! SeaORM entities for the three directory tables.

pub mod account;
pub mod account_by_email;
pub mod account_by_handle;
