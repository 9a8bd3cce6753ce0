//! Domain model (tasks, errors, IDs, dispatch states).

pub mod errors;
pub mod ids;
pub mod state;
pub mod task;

pub use self::errors::{DispatchError, ErrorKind, ProtocolMisuse, TaskError};
pub use self::ids::{ReportId, TaskId};
pub use self::state::TaskState;
pub use self::task::{Named, Task, named};
