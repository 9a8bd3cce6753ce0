//! ResultCarrier - owning context から待機中の呼び出し側へ結果を 1 つだけ運ぶ
//!
//! # 学習ポイント
//! - Mutex + Condvar による blocking wait
//! - Drop guard による「settle されずに捨てられた」ことの検出
//! - 状態遷移を enum で表現（Pending → Value | Failed | Abandoned → Taken）

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::domain::errors::{DispatchError, ProtocolMisuse, TaskError};

enum Outcome<T> {
    Pending,
    Value(T),
    Failed(TaskError),
    /// Every producer was dropped without settling.
    Abandoned,
    /// The waiter already consumed the outcome.
    Taken,
}

struct Shared<T> {
    outcome: Mutex<Outcome<T>>,
    ready: Condvar,
}

/// ResultCarrier は 1 回分の結果（値 or 失敗）を運ぶ
///
/// # 使用例
/// ```ignore
/// let carrier = ResultCarrier::new();
/// let completer = carrier.completer();
/// std::thread::spawn(move || completer.complete(42));
/// assert_eq!(carrier.wait()?, 42);
/// ```
///
/// # 不変条件
/// - settle（complete / fail）は 1 回だけ。2 回目は `ProtocolMisuse::AlreadySettled`
/// - wait で取り出せるのも 1 回だけ。2 回目は `ProtocolMisuse::AlreadyTaken`
/// - 値の書き込みと読み出しは同じ Mutex を通るので、torn read は起きない
pub struct ResultCarrier<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ResultCarrier<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for ResultCarrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultCarrier<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                outcome: Mutex::new(Outcome::Pending),
                ready: Condvar::new(),
            }),
        }
    }

    /// A producer handle that abandons the carrier if dropped unsettled.
    pub fn completer(&self) -> Completer<T> {
        Completer {
            carrier: self.clone(),
        }
    }

    pub fn complete(&self, value: T) -> Result<(), ProtocolMisuse> {
        self.transition(Outcome::Value(value))
    }

    pub fn fail(&self, error: TaskError) -> Result<(), ProtocolMisuse> {
        self.transition(Outcome::Failed(error))
    }

    pub fn settle(&self, result: Result<T, TaskError>) -> Result<(), ProtocolMisuse> {
        match result {
            Ok(value) => self.complete(value),
            Err(error) => self.fail(error),
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(*self.lock(), Outcome::Pending)
    }

    /// Block until the outcome is available and take it.
    pub fn wait(&self) -> Result<T, DispatchError> {
        let mut guard = self.lock();
        loop {
            if let Some(result) = take(&mut guard) {
                return result;
            }
            guard = self
                .shared
                .ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Returns `None` if the carrier is still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, DispatchError>> {
        let guard = self.lock();
        let (mut guard, _) = self
            .shared
            .ready
            .wait_timeout_while(guard, timeout, |o| matches!(o, Outcome::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        take(&mut guard)
    }

    fn abandon(&self) {
        // Already settled is the normal case here.
        let _ = self.transition(Outcome::Abandoned);
    }

    fn transition(&self, next: Outcome<T>) -> Result<(), ProtocolMisuse> {
        let mut guard = self.lock();
        if !matches!(*guard, Outcome::Pending) {
            return Err(ProtocolMisuse::AlreadySettled);
        }
        *guard = next;
        drop(guard);
        self.shared.ready.notify_all();
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Outcome<T>> {
        self.shared
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn take<T>(outcome: &mut Outcome<T>) -> Option<Result<T, DispatchError>> {
    if matches!(outcome, Outcome::Pending) {
        return None;
    }
    Some(match std::mem::replace(outcome, Outcome::Taken) {
        Outcome::Value(value) => Ok(value),
        Outcome::Failed(error) => Err(DispatchError::Task(error)),
        Outcome::Abandoned => Err(DispatchError::Closed),
        Outcome::Taken | Outcome::Pending => Err(ProtocolMisuse::AlreadyTaken.into()),
    })
}

/// Completer は producer 側のハンドル
///
/// settle せずに drop されると carrier は Abandoned になり、
/// 待機中の呼び出し側は `DispatchError::Closed` を受け取ります。
/// （例: owning loop が job を実行せずに停止した場合）
pub struct Completer<T> {
    carrier: ResultCarrier<T>,
}

impl<T> Completer<T> {
    pub fn complete(&self, value: T) -> Result<(), ProtocolMisuse> {
        self.carrier.complete(value)
    }

    pub fn fail(&self, error: TaskError) -> Result<(), ProtocolMisuse> {
        self.carrier.fail(error)
    }

    pub fn settle(&self, result: Result<T, TaskError>) -> Result<(), ProtocolMisuse> {
        self.carrier.settle(result)
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        self.carrier.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::thread;

    #[test]
    fn complete_then_wait_returns_value() {
        let carrier = ResultCarrier::new();
        carrier.complete(42).unwrap();
        assert!(carrier.is_settled());
        assert_eq!(carrier.wait().unwrap(), 42);
    }

    #[test]
    fn fail_then_wait_returns_task_error() {
        let carrier = ResultCarrier::<i32>::new();
        carrier.fail(TaskError::new("boom")).unwrap();
        let err = carrier.wait().unwrap_err();
        assert_eq!(err.task_error().map(TaskError::message), Some("boom"));
    }

    #[rstest]
    #[case::complete_complete(true, true)]
    #[case::complete_fail(true, false)]
    #[case::fail_complete(false, true)]
    #[case::fail_fail(false, false)]
    fn second_settle_is_misuse(#[case] first_ok: bool, #[case] second_ok: bool) {
        let carrier = ResultCarrier::new();
        let settle = |ok: bool| {
            if ok {
                carrier.complete(1)
            } else {
                carrier.fail(TaskError::new("x"))
            }
        };
        settle(first_ok).unwrap();
        assert_eq!(settle(second_ok), Err(ProtocolMisuse::AlreadySettled));
    }

    #[test]
    fn second_wait_is_misuse() {
        let carrier = ResultCarrier::new();
        carrier.complete("done").unwrap();
        carrier.wait().unwrap();
        assert!(matches!(
            carrier.wait(),
            Err(DispatchError::Misuse(ProtocolMisuse::AlreadyTaken))
        ));
    }

    #[test]
    fn wait_blocks_until_another_thread_completes() {
        let carrier = ResultCarrier::new();
        let completer = carrier.completer();

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            completer.complete(vec![1, 2, 3]).unwrap();
        });

        assert_eq!(carrier.wait().unwrap(), vec![1, 2, 3]);
        producer.join().unwrap();
    }

    #[test]
    fn dropped_completer_abandons_carrier() {
        let carrier = ResultCarrier::<i32>::new();
        let completer = carrier.completer();

        thread::spawn(move || drop(completer)).join().unwrap();

        assert!(matches!(carrier.wait(), Err(DispatchError::Closed)));
    }

    #[test]
    fn settled_completer_drop_keeps_value() {
        let carrier = ResultCarrier::new();
        {
            let completer = carrier.completer();
            completer.settle(Ok(7)).unwrap();
        }
        assert_eq!(carrier.wait().unwrap(), 7);
    }

    #[test]
    fn wait_timeout_returns_none_while_pending() {
        let carrier = ResultCarrier::<()>::new();
        assert!(carrier.wait_timeout(Duration::from_millis(20)).is_none());
        assert!(!carrier.is_settled());
    }
}
