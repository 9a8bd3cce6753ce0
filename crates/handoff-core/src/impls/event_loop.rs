//! EventLoop - owning context の参照実装
//!
//! GUI ツールキットなしで dispatcher を動かすための単一スレッドのイベントループです。
//!
//! # 学習ポイント
//! - Mutex + Condvar による blocking pop（FIFO run-queue）
//! - `OnceLock<ThreadId>` による「今 owning context 上にいるか」の判定
//! - catch_unwind で job の panic からループを守る

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crate::domain::TaskError;
use crate::ports::{Job, PostError, RunQueue};

struct LoopState {
    jobs: VecDeque<Job>,
    closed: bool,
}

struct Inner {
    state: Mutex<LoopState>,
    available: Condvar,
    owner: OnceLock<ThreadId>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) -> VecDeque<Job> {
        let mut state = self.lock();
        state.closed = true;
        let leftover = std::mem::take(&mut state.jobs);
        drop(state);
        self.available.notify_all();
        leftover
    }
}

/// EventLoop は post された job を 1 つずつ FIFO で実行する
///
/// # 使用例
/// ```ignore
/// // 現在のスレッドを owning context にする
/// let (event_loop, handle) = EventLoop::new();
/// let dispatcher = DispatcherBuilder::new().run_queue(handle.clone())...build()?;
/// std::thread::spawn(move || { dispatcher.execute(task); handle.shutdown(); });
/// event_loop.run();
/// ```
///
/// # 停止
/// - `LoopHandle::shutdown()` 以降の post は `PostError::Closed`
/// - shutdown 前に積まれた job は実行してから `run` が戻る
/// - `run` されずに drop された EventLoop は積まれた job を drop する
///   （dispatcher 側の呼び出しは `DispatchError::Closed` で戻る）
pub struct EventLoop {
    inner: Arc<Inner>,
}

/// Clonable handle used to post jobs to an [`EventLoop`].
#[derive(Clone)]
pub struct LoopHandle {
    inner: Arc<Inner>,
}

impl EventLoop {
    pub fn new() -> (Self, LoopHandle) {
        let inner = Arc::new(Inner {
            state: Mutex::new(LoopState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
            owner: OnceLock::new(),
        });
        let handle = LoopHandle {
            inner: Arc::clone(&inner),
        };
        (Self { inner }, handle)
    }

    /// Run a loop on a dedicated thread named `name`.
    pub fn spawn(name: impl Into<String>) -> std::io::Result<SpawnedLoop> {
        let (event_loop, handle) = Self::new();
        let join = thread::Builder::new()
            .name(name.into())
            .spawn(move || event_loop.run())?;
        Ok(SpawnedLoop {
            handle,
            join: Some(join),
        })
    }

    /// Service jobs on the current thread until shutdown.
    pub fn run(self) {
        let _ = self.inner.owner.set(thread::current().id());
        tracing::debug!(thread = ?thread::current().name(), "event loop started");

        while let Some(job) = self.next_job() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                let err = TaskError::from_panic(payload);
                tracing::error!(error = %err, "job panicked on event loop");
            }
        }

        tracing::debug!("event loop stopped");
    }

    fn next_job(&self) -> Option<Job> {
        let mut state = self.inner.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            state = self
                .inner
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        // Jobs are dropped outside the lock: their captures may take other locks.
        let leftover = self.inner.close();
        if !leftover.is_empty() {
            tracing::warn!(count = leftover.len(), "event loop dropped with queued jobs");
        }
    }
}

impl LoopHandle {
    /// Stop accepting jobs. The loop exits once the queue is drained.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock();
        state.closed = true;
        drop(state);
        self.inner.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().jobs.len()
    }
}

impl RunQueue for LoopHandle {
    fn post(&self, job: Job) -> Result<(), PostError> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(PostError::Closed);
        }
        state.jobs.push_back(job);
        drop(state);
        self.inner.available.notify_one();
        Ok(())
    }

    fn is_owning_context(&self) -> bool {
        self.inner.owner.get() == Some(&thread::current().id())
    }
}

/// An [`EventLoop`] running on its own thread.
pub struct SpawnedLoop {
    handle: LoopHandle,
    join: Option<JoinHandle<()>>,
}

impl SpawnedLoop {
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Shutdown and wait for queued jobs to finish.
    pub fn shutdown_and_join(mut self) {
        self.handle.shutdown();
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::warn!("event loop thread panicked");
        }
    }
}

impl Drop for SpawnedLoop {
    fn drop(&mut self) {
        // Not joined: drop may happen on the loop thread itself.
        self.handle.shutdown();
    }
}
