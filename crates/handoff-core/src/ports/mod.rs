//! Ports - 抽象化レイヤー
//!
//! dispatcher が外部に依存する点（owning context の run-queue、エラー報告、時刻、ID）を
//! trait として切り出しています。

pub mod clock;
pub mod id_generator;
pub mod reporter;
pub mod run_queue;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::reporter::ErrorReporter;
pub use self::run_queue::{Job, PostError, RunQueue};
