pub mod account;
pub mod goal;
pub mod ledger;
pub mod settings;
pub mod subscription;
pub mod summary;
pub mod transaction;
