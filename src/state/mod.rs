//! State module for request spacing
//!
//! - `DomainState`: last request instant and request count for one domain
//! - `GlobalRateState`: the last request instant across all domains

mod domain_state;

pub use domain_state::{DomainState, GlobalRateState};
