pub mod ledger_service;
pub mod subscription_service;
pub mod summary_service;
pub mod sync_queue;
