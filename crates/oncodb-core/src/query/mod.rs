//! Query layer for OncoDB.
//!
//! Filters are resolved into parameterized conditions, conditions are
//! assembled into plans, and plans are run by the execution gateway.

mod builder;
mod executor;
mod filter;
mod plan;

pub use builder::{effective_limit, LookupKey, QueryPlanBuilder, DEFAULT_LIMIT, MAX_LIMIT};
pub use executor::ExecutionGateway;
pub use filter::{meta_keys, Condition, FilterOp, FilterSpec, FilterTranslator, FilterValue};
pub use plan::{QueryParam, QueryPlan};
