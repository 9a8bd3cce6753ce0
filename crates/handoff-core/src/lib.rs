//! handoff-core
//!
//! 任意のスレッドから単一の owning context（UI スレッド / イベントループ）へ task を渡し、
//! 完了まで同期的に待つための building blocks です。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Task, TaskError, DispatchError, TaskId, TaskState）
//! - **ports**: 抽象化レイヤー（RunQueue, ErrorReporter, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（ResultCarrier, SyncDispatcher, builder, config）
//! - **impls**: 実装（EventLoop, TracingReporter, RecordingReporter）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{DispatcherBuilder, DispatcherConfig, FailurePolicy, ResultCarrier, SyncDispatcher};
pub use domain::{DispatchError, Task, TaskError, named};
