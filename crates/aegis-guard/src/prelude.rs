//! Convenient single import for guard consumers.

pub use crate::client::{DataSource, GuardedClient};
pub use crate::error::{GuardError, GuardResult};
pub use crate::middleware::{Enforcement, ScopeDecision, TenantGuard, TENANT_FIELD};
pub use crate::operation::{DataAction, DataOperation, OperationArgs, QueryResult};
pub use crate::registry::{ModelEntry, ModelRegistry, ModelRegistryBuilder, ModelScope};
