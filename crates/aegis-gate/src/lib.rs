//! Aegis Gate - turning claimed identity into established identity.
//!
//! A bearer token is a claim. The gate validates the claim against the
//! session store, checks the organization it points at (existence,
//! deletion, subscription), and only then mints the [`SecurityContext`]
//! the rest of the platform trusts. Each failure mode is a distinct
//! [`GateError`] variant so an expired session is never reported as a
//! billing problem, and every rejection leaves an audit event behind.
//!
//! [`SecurityContext`]: aegis_core::SecurityContext

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod gate;
mod store;

pub use error::{GateError, GateResult, StoreUnavailable};
pub use gate::Gate;
pub use store::{
    MemoryOrgStore, MemorySessionStore, Organization, OrgStore, Session, SessionStore,
    SubscriptionStatus,
};
