//! Aggregation pipeline: cycle state, coordinator, operational counters.

pub mod coordinator;
pub mod cycle;
pub mod state;

pub use coordinator::{BatchReceipt, CycleCoordinator};
pub use cycle::{CycleSnapshot, CycleState};
pub use state::{AppState, GatewayStatus, LastDispatch};
