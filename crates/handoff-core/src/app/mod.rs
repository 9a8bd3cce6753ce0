//! App - アプリケーション層
//!
//! ports を組み合わせて同期ディスパッチを実装します。
//!
//! # 主要コンポーネント
//! - **ResultCarrier**: owning context → 呼び出し側への一回きりの結果転送
//! - **SyncDispatcher**: task を owning context で実行し、完了まで待つ
//! - **DispatcherBuilder**: 依存の注入と起動時検証
//! - **DispatcherConfig**: TOML 設定

pub mod builder;
pub mod carrier;
pub mod config;
pub mod dispatcher;

pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::carrier::{Completer, ResultCarrier};
pub use self::config::{ConfigError, DispatcherConfig};
pub use self::dispatcher::{FailurePolicy, SyncDispatcher};
