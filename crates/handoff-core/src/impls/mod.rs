//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **EventLoop / LoopHandle**: 単一スレッドの owning context（RunQueue）
//! - **TracingReporter / RecordingReporter / FanoutReporter**: ErrorReporter
//!
//! 実アプリでは GUI ツールキットのイベントループに RunQueue を実装します。

pub mod event_loop;
pub mod reporters;

pub use self::event_loop::{EventLoop, LoopHandle, SpawnedLoop};
pub use self::reporters::{
    CauseKind, FanoutReporter, RecordingReporter, ReportRecord, TracingReporter,
};
