//! Per-task dispatch state machine.

use serde::{Deserialize, Serialize};

/// TaskState follows one `execute` call.
///
/// State transitions:
/// - Created -> Dispatched -> Running -> Completed -> Finished
/// - Created -> Dispatched -> Running -> FailedAndReported -> Finished
/// - Created -> Dispatched -> Running -> Failed -> Finished (propagating policy)
/// - Created -> Running -> ... (inline on the owning context, no hand-off)
/// - Created -> Dispatched -> Finished (owning context closed before the task ran)
///
/// No retries, no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,

    /// Posted to the owning context's run-queue.
    Dispatched,

    Running,

    Completed,

    /// Failed and handed to the error reporter.
    FailedAndReported,

    /// Failed and returned to the caller.
    Failed,

    /// The caller has observed the outcome.
    Finished,
}

impl TaskState {
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, Dispatched)
                | (Created, Running)
                | (Created, Finished)
                | (Dispatched, Running)
                | (Dispatched, Finished)
                | (Running, Completed)
                | (Running, FailedAndReported)
                | (Running, Failed)
                | (Completed, Finished)
                | (FailedAndReported, Finished)
                | (Failed, Finished)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskState::Created, TaskState::Dispatched)]
    #[case(TaskState::Created, TaskState::Running)]
    #[case(TaskState::Dispatched, TaskState::Running)]
    #[case(TaskState::Dispatched, TaskState::Finished)]
    #[case(TaskState::Running, TaskState::FailedAndReported)]
    #[case(TaskState::Completed, TaskState::Finished)]
    fn allowed_transitions(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case(TaskState::Finished, TaskState::Running)]
    #[case(TaskState::Completed, TaskState::Running)]
    #[case(TaskState::Running, TaskState::Dispatched)]
    #[case(TaskState::Created, TaskState::Completed)]
    fn rejected_transitions(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&TaskState::FailedAndReported).unwrap();
        assert_eq!(s, "\"failed_and_reported\"");
    }
}
