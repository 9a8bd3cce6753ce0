//! DispatcherBuilder - SyncDispatcher の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 依存（RunQueue / ErrorReporter）をグローバルではなく構築時に注入する

use std::sync::Arc;

use crate::app::config::{ConfigError, DispatcherConfig};
use crate::app::dispatcher::SyncDispatcher;
use crate::ports::{ErrorReporter, IdGenerator, RunQueue, SystemClock, UlidGenerator};

/// DispatcherBuilder は SyncDispatcher を構築
///
/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .run_queue(spawned.handle())
///     .reporter(Arc::new(TracingReporter))
///     .config(DispatcherConfig::load("handoff.toml")?)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - run_queue と reporter は必須。足りなければ build() が BuildError を返す
/// - config は build() 時に validate される
pub struct DispatcherBuilder {
    run_queue: Option<Arc<dyn RunQueue>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: DispatcherConfig,
}

/// BuildError は dispatcher 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no run-queue configured; call `run_queue()` before `build()`")]
    MissingRunQueue,

    #[error("no error reporter configured; call `reporter()` before `build()`")]
    MissingReporter,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            run_queue: None,
            reporter: None,
            ids: None,
            config: DispatcherConfig::default(),
        }
    }

    /// The owning context's run-queue.
    pub fn run_queue(mut self, run_queue: impl RunQueue + 'static) -> Self {
        self.run_queue = Some(Arc::new(run_queue));
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Override task id generation (defaults to ULIDs from the system clock).
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SyncDispatcher, BuildError> {
        self.config.validate()?;
        let run_queue = self.run_queue.ok_or(BuildError::MissingRunQueue)?;
        let reporter = self.reporter.ok_or(BuildError::MissingReporter)?;
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        Ok(SyncDispatcher::new(
            run_queue,
            reporter,
            ids,
            self.config.error_title,
        ))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{EventLoop, TracingReporter};

    #[test]
    fn test_build_success() {
        let (_event_loop, handle) = EventLoop::new();
        let dispatcher = DispatcherBuilder::new()
            .run_queue(handle)
            .reporter(Arc::new(TracingReporter))
            .build();
        assert!(dispatcher.is_ok());
    }

    #[test]
    fn test_build_missing_run_queue() {
        let result = DispatcherBuilder::new()
            .reporter(Arc::new(TracingReporter))
            .build();
        assert!(matches!(result, Err(BuildError::MissingRunQueue)));
    }

    #[test]
    fn test_build_missing_reporter() {
        let (_event_loop, handle) = EventLoop::new();
        let result = DispatcherBuilder::new().run_queue(handle).build();
        assert!(matches!(result, Err(BuildError::MissingReporter)));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let (_event_loop, handle) = EventLoop::new();
        let config = DispatcherConfig {
            error_title: String::new(),
            ..Default::default()
        };
        let result = DispatcherBuilder::new()
            .run_queue(handle)
            .reporter(Arc::new(TracingReporter))
            .config(config)
            .build();
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::Invalid(_)))
        ));
    }
}
