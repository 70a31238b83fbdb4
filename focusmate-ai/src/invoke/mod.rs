pub mod invoker;
pub mod modes;
pub mod policy;
pub mod result;
pub mod tasks;

pub use invoker::CapabilityInvoker;
pub use modes::{OperationKind, ProcessingMode};
pub use policy::{MissingCapabilityPolicy, OperationPolicy};
pub use result::{InvocationErrorKind, InvocationResult};
pub use tasks::{extract_tasks, format_numbered, TaskItem, TaskPattern};
