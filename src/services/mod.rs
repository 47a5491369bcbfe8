pub mod admission;
pub mod audit;
pub mod keyed_lock;
pub mod order_table;
pub mod orchestrator;
pub mod rate_limit;
pub mod sweeper;

pub use audit::AuditLog;
pub use keyed_lock::KeyedLock;
pub use order_table::PendingOrderTable;
pub use orchestrator::{CreateOrderError, Orchestrator, ReconcileError};
pub use rate_limit::{Decision, RateLimiter};
