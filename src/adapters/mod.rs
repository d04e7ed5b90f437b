pub mod http_notifier;
pub mod memory_store;
pub mod postgres_store;

pub use http_notifier::GatewayClient;
pub use memory_store::InMemoryLedgerStore;
pub use postgres_store::PostgresLedgerStore;
