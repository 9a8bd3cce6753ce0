//! RunQueue port - owning context の run-queue
//!
//! GUI ツールキットのイベントループ（UI スレッド）を抽象化したものです。
//!
//! # 実装
//! - **LoopHandle**（impls::event_loop）: 専用スレッドで回す参照実装

/// A unit of work posted to the owning context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostError {
    #[error("run-queue is closed")]
    Closed,
}

/// RunQueue は owning context へのハンドオフ口
///
/// # 設計原則
/// - `post` は FIFO で、いずれ必ず処理される（closed でない限り）
/// - owning context は post された job を 1 つずつ順番に実行する
/// - 拒否された job は呼び出し側に返さず drop する
pub trait RunQueue: Send + Sync {
    fn post(&self, job: Job) -> Result<(), PostError>;

    /// Is the current thread the owning context?
    fn is_owning_context(&self) -> bool;
}
