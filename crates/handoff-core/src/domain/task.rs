//! Task trait - owning context で実行される作業単位
//!
//! # 学習ポイント
//! - Associated type (`type Output`)
//! - クロージャへの blanket impl（サブクラス化の代わり）
//! - `self` を消費する `run`（single use を型で保証）

use std::any::type_name;
use std::borrow::Cow;

use super::errors::TaskError;

/// Task は「`run` を持つもの」なら何でもよい
///
/// # 使用例
/// ```ignore
/// // クロージャはそのまま Task になる
/// dispatcher.execute(|| Ok::<_, TaskError>(42));
///
/// // エラーメッセージ用の名前を付ける
/// dispatcher.execute(named("refresh-navigator", || refresh()));
/// ```
///
/// # Trait Bounds
/// - `Send + 'static`: owning context のスレッドへ移動するため
pub trait Task: Send + 'static {
    type Output: Send + 'static;

    /// Run the task body. Called exactly once, on the owning context.
    fn run(self) -> Result<Self::Output, TaskError>;

    /// Identity used in failure reports.
    fn describe(&self) -> Cow<'_, str> {
        Cow::Borrowed(type_name::<Self>())
    }
}

impl<F, T> Task for F
where
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn run(self) -> Result<T, TaskError> {
        self()
    }
}

/// A closure with a human-readable name.
pub struct Named<F> {
    name: Cow<'static, str>,
    body: F,
}

/// Attach `name` to a closure so failure reports can identify it.
pub fn named<F, T>(name: impl Into<Cow<'static, str>>, body: F) -> Named<F>
where
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    T: Send + 'static,
{
    Named {
        name: name.into(),
        body,
    }
}

impl<F, T> Task for Named<F>
where
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn run(self) -> Result<T, TaskError> {
        (self.body)()
    }

    fn describe(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountRows {
        table: String,
    }

    impl Task for CountRows {
        type Output = usize;

        fn run(self) -> Result<usize, TaskError> {
            Ok(self.table.len())
        }

        fn describe(&self) -> Cow<'_, str> {
            Cow::Owned(format!("count rows of {}", self.table))
        }
    }

    #[test]
    fn closures_are_tasks() {
        let task = || Ok::<_, TaskError>(42);
        assert_eq!(task.run().unwrap(), 42);
    }

    #[test]
    fn named_task_reports_its_name() {
        let task = named("refresh", || Ok::<_, TaskError>(()));
        assert_eq!(task.describe(), "refresh");
        task.run().unwrap();
    }

    #[test]
    fn custom_task_types_are_supported() {
        let task = CountRows {
            table: "orders".to_string(),
        };
        assert_eq!(task.describe(), "count rows of orders");
        assert_eq!(task.run().unwrap(), 6);
    }
}
