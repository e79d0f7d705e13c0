//! Core HPO types

mod direction;
mod parameter;
mod space;
mod trial;


// Re-export all public types
pub use direction::Direction;
pub use parameter::{ParameterDomain, ParameterValue};
pub use space::{HyperparameterSpace, HyperparameterSpec};
pub(crate) use trial::PruningContext;
pub use trial::{Trial, TrialState, UserAttr, NETWORK_ATTR};
