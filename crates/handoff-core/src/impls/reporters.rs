//! ErrorReporter の実装
//!
//! - **TracingReporter**: `tracing::error!` に流すだけ（本番用のデフォルト）
//! - **RecordingReporter**: 報告を記録する（テスト / CLI の集計用）
//! - **FanoutReporter**: 複数の reporter に同じ報告を配る

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DispatchError, ErrorKind};
use crate::domain::ids::ReportId;
use crate::ports::{Clock, ErrorReporter, IdGenerator, SystemClock, UlidGenerator};

/// Logs every report at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, title: &str, message: &str, cause: &DispatchError) {
        tracing::error!(title, cause = %cause, "{message}");
    }
}

/// What kind of failure a report was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseKind {
    Failed,
    Panicked,
    Closed,
    Misuse,
}

impl From<&DispatchError> for CauseKind {
    fn from(cause: &DispatchError) -> Self {
        match cause {
            DispatchError::Task(e) => match e.kind() {
                ErrorKind::Failed => CauseKind::Failed,
                ErrorKind::Panicked => CauseKind::Panicked,
            },
            DispatchError::Closed => CauseKind::Closed,
            DispatchError::Misuse(_) => CauseKind::Misuse,
        }
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: ReportId,
    pub title: String,
    pub message: String,
    pub cause: String,
    pub cause_kind: CauseKind,
    pub reported_at: DateTime<Utc>,
}

/// RecordingReporter は受け取った報告をすべて保持する
///
/// # 使用例
/// ```ignore
/// let reporter = Arc::new(RecordingReporter::new());
/// let dispatcher = DispatcherBuilder::new().reporter(reporter.clone())...;
/// dispatcher.execute(failing_task);
/// assert_eq!(reporter.len(), 1);
/// ```
pub struct RecordingReporter<C = SystemClock> {
    clock: C,
    ids: UlidGenerator<C>,
    records: Mutex<Vec<ReportRecord>>,
}

impl RecordingReporter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RecordingReporter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Clone> RecordingReporter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            ids: UlidGenerator::new(clock.clone()),
            clock,
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<C> RecordingReporter<C> {
    pub fn records(&self) -> Vec<ReportRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReportRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> ErrorReporter for RecordingReporter<C> {
    fn report(&self, title: &str, message: &str, cause: &DispatchError) {
        let record = ReportRecord {
            id: self.ids.generate_report_id(),
            title: title.to_string(),
            message: message.to_string(),
            cause: cause.to_string(),
            cause_kind: CauseKind::from(cause),
            reported_at: self.clock.now(),
        };
        self.lock().push(record);
    }
}

/// Forwards each report to every inner reporter, in order.
#[derive(Clone, Default)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn ErrorReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

impl ErrorReporter for FanoutReporter {
    fn report(&self, title: &str, message: &str, cause: &DispatchError) {
        for reporter in &self.reporters {
            reporter.report(title, message, cause);
        }
    }
}
