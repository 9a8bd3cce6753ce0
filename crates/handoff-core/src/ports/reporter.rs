//! ErrorReporter port - 失敗をユーザー / ログに見せる外部サービス
//!
//! dispatcher は reporter を所有せず、構築時に注入された `Arc<dyn ErrorReporter>` を参照するだけです。

use crate::domain::errors::DispatchError;

/// ErrorReporter は `(title, message, cause)` を受け取って失敗を表面化する
///
/// # 設計原則
/// - 同期呼び出し。戻った時点で報告は終わっている
/// - task の失敗は owning context 上で呼ばれる
/// - 同じ dispatcher に foreign thread から dispatch し直してはいけない（reentrancy deadlock）
pub trait ErrorReporter: Send + Sync {
    fn report(&self, title: &str, message: &str, cause: &DispatchError);
}
