//! SyncDispatcher - task を owning context で同期実行する
//!
//! # フロー
//! 1. 呼び出し側が task を作って `execute` を呼ぶ
//! 2. 既に owning context 上なら inline 実行（ハンドオフしない = deadlock しない）
//! 3. そうでなければ RunQueue に post し、ResultCarrier で完了を待つ
//! 4. owning context が task を実行し、失敗なら（AbsorbAndReport のとき）その場で reporter に報告
//! 5. 呼び出し側は値を受け取る。吸収された失敗は `None`
//!
//! # 学習ポイント
//! - 同じ dispatch core を 2 つの薄い入口（`execute` / `try_execute`）で共有
//! - tracing span をスレッドを跨いで持ち回す

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::app::carrier::ResultCarrier;
use crate::domain::{DispatchError, Task, TaskError, TaskId, TaskState};
use crate::ports::{ErrorReporter, IdGenerator, RunQueue};

/// What to do with a failed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report through the `ErrorReporter` and hide the failure from the caller.
    AbsorbAndReport,
    /// Return the failure to the caller; nothing is reported.
    Propagate,
}

/// SyncDispatcher は task を owning context に渡して完了までブロックする
///
/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .run_queue(event_loop.handle())
///     .reporter(Arc::new(TracingReporter))
///     .build()?;
///
/// let rows = dispatcher.execute(named("count-rows", || Ok(count_rows()?)));
/// ```
///
/// # 保証
/// - `execute` は task が完全に終わるまで戻らない
/// - 失敗した task 1 つにつき reporter はちょうど 1 回呼ばれる（成功時は 0 回）
/// - owning context 上からの呼び出しは inline で呼び出し順に実行される
///
/// # 既知の制約
/// - キャンセル / タイムアウトはない。戻ってこない task は呼び出し側と owning context を両方止める
#[derive(Clone)]
pub struct SyncDispatcher {
    run_queue: Arc<dyn RunQueue>,
    reporter: Arc<dyn ErrorReporter>,
    ids: Arc<dyn IdGenerator>,
    error_title: Arc<str>,
}

impl SyncDispatcher {
    pub(crate) fn new(
        run_queue: Arc<dyn RunQueue>,
        reporter: Arc<dyn ErrorReporter>,
        ids: Arc<dyn IdGenerator>,
        error_title: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            run_queue,
            reporter,
            ids,
            error_title: error_title.into(),
        }
    }

    /// Run `task` on the owning context, reporting any failure.
    ///
    /// Returns `None` when the task failed; the failure has already been
    /// reported by the time this returns.
    pub fn execute<K: Task>(&self, task: K) -> Option<K::Output> {
        self.execute_with(task, FailurePolicy::AbsorbAndReport).ok()
    }

    /// Run `task` on the owning context and hand failures back.
    pub fn try_execute<K: Task>(&self, task: K) -> Result<K::Output, DispatchError> {
        self.execute_with(task, FailurePolicy::Propagate)
    }

    /// Dispatch core shared by [`execute`](Self::execute) and
    /// [`try_execute`](Self::try_execute).
    ///
    /// Under [`FailurePolicy::AbsorbAndReport`] every `Err` returned here has
    /// already been reported.
    pub fn execute_with<K: Task>(
        &self,
        task: K,
        policy: FailurePolicy,
    ) -> Result<K::Output, DispatchError> {
        let execution = Execution {
            id: self.ids.generate_task_id(),
            name: task.describe().into_owned(),
            policy,
            reporter: Arc::clone(&self.reporter),
            error_title: Arc::clone(&self.error_title),
        };
        let span = tracing::debug_span!(
            "dispatch",
            task_id = %execution.id,
            task = %execution.name
        );
        let _entered = span.enter();

        if self.run_queue.is_owning_context() {
            let result = execution
                .run(task, TaskState::Created)
                .map_err(DispatchError::Task);
            execution.finish(&result);
            return result;
        }

        let carrier = ResultCarrier::new();
        let completer = carrier.completer();
        let job_execution = execution.clone();
        let job_span = span.clone();

        execution.transition(TaskState::Created, TaskState::Dispatched);
        let posted = self.run_queue.post(Box::new(move || {
            let _entered = job_span.enter();
            let result = job_execution.run(task, TaskState::Dispatched);
            if let Err(misuse) = completer.settle(result) {
                debug_assert!(false, "fresh carrier settled twice: {misuse}");
                tracing::error!(error = %misuse, "dispatch result dropped");
            }
        }));

        let result = match posted {
            Ok(()) => carrier.wait(),
            Err(e) => {
                tracing::warn!(error = %e, "owning context rejected task");
                Err(DispatchError::Closed)
            }
        };

        // Task failures were reported on the owning context; anything else
        // never reached it.
        if let Err(err) = &result
            && err.task_error().is_none()
        {
            execution.report(err);
        }
        execution.finish(&result);
        result
    }
}

/// Per-call context that travels with the task to the owning context.
#[derive(Clone)]
struct Execution {
    id: TaskId,
    name: String,
    policy: FailurePolicy,
    reporter: Arc<dyn ErrorReporter>,
    error_title: Arc<str>,
}

impl Execution {
    /// Run the task body, catching panics as task failures.
    ///
    /// Failures are reported here under [`FailurePolicy::AbsorbAndReport`].
    fn run<K: Task>(&self, task: K, from: TaskState) -> Result<K::Output, TaskError> {
        self.transition(from, TaskState::Running);

        let result = catch_unwind(AssertUnwindSafe(|| task.run()))
            .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));

        match result {
            Ok(value) => {
                self.transition(TaskState::Running, TaskState::Completed);
                Ok(value)
            }
            Err(error) => match self.policy {
                FailurePolicy::AbsorbAndReport => {
                    let cause = DispatchError::Task(error);
                    self.report(&cause);
                    self.transition(TaskState::Running, TaskState::FailedAndReported);
                    match cause {
                        DispatchError::Task(error) => Err(error),
                        _ => unreachable!("cause wraps the task error"),
                    }
                }
                FailurePolicy::Propagate => {
                    self.transition(TaskState::Running, TaskState::Failed);
                    Err(error)
                }
            },
        }
    }

    /// Hand `cause` to the reporter. A panicking reporter still counts as the
    /// one report for this task: it is logged and the dispatch carries on.
    fn report(&self, cause: &DispatchError) {
        if self.policy != FailurePolicy::AbsorbAndReport {
            return;
        }
        let message = format!("Internal error: task '{}' ({}) failed", self.name, self.id);
        let reported = catch_unwind(AssertUnwindSafe(|| {
            self.reporter.report(&self.error_title, &message, cause)
        }));
        if let Err(payload) = reported {
            let panic = TaskError::from_panic(payload);
            tracing::error!(
                task_id = %self.id,
                cause = %cause,
                reason = panic.message(),
                "error reporter panicked"
            );
        }
    }

    fn finish<T>(&self, result: &Result<T, DispatchError>) {
        let last = match result {
            Ok(_) => TaskState::Completed,
            Err(DispatchError::Task(_)) => match self.policy {
                FailurePolicy::AbsorbAndReport => TaskState::FailedAndReported,
                FailurePolicy::Propagate => TaskState::Failed,
            },
            Err(_) => TaskState::Dispatched,
        };
        self.transition(last, TaskState::Finished);
    }

    fn transition(&self, from: TaskState, to: TaskState) {
        debug_assert!(
            from.can_transition_to(to),
            "invalid task transition {from:?} -> {to:?}"
        );
        tracing::debug!(task_id = %self.id, ?from, ?to, "task state");
    }
}
