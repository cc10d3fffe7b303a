//! Convenient single import for gate consumers.

pub use crate::error::{GateError, GateResult};
pub use crate::gate::Gate;
pub use crate::store::{
    MemoryOrgStore, MemorySessionStore, Organization, OrgStore, Session, SessionStore,
    SubscriptionStatus,
};
