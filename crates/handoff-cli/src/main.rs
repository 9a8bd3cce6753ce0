use std::sync::Arc;

use handoff_core::impls::{EventLoop, FanoutReporter, RecordingReporter, TracingReporter};
use handoff_core::{DispatcherBuilder, DispatcherConfig, SyncDispatcher, TaskError, named};
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<DispatcherConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(DispatcherConfig::load(path)?),
        None => Ok(DispatcherConfig::default()),
    }
}

/// Blocking caller on tokio's blocking pool: the "background thread" of a desktop app.
async fn call<T, F>(dispatcher: &SyncDispatcher, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(SyncDispatcher) -> Option<T> + Send + 'static,
{
    let dispatcher = dispatcher.clone();
    match tokio::task::spawn_blocking(move || f(dispatcher)).await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "caller thread failed");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // (A) 設定と owning context（専用スレッドのイベントループ）
    let config = load_config()?;
    let owner = EventLoop::spawn(config.loop_thread_name.clone())?;

    // (B) reporter を注入して dispatcher を組み立てる
    let recorder = Arc::new(RecordingReporter::new());
    let reporter = FanoutReporter::new()
        .with(Arc::new(TracingReporter))
        .with(recorder.clone());
    let dispatcher = DispatcherBuilder::new()
        .run_queue(owner.handle())
        .reporter(Arc::new(reporter))
        .config(config)
        .build()?;

    // (C) 成功 / 失敗 / panic / ネスト
    let answer = call(&dispatcher, |d| d.execute(named("answer", || Ok::<_, TaskError>(42)))).await;
    tracing::info!(?answer, "answer task finished");

    let failed = call(&dispatcher, |d| {
        d.execute(named("boom", || Err::<i32, _>(TaskError::new("boom"))))
    })
    .await;
    tracing::info!(?failed, "failing task finished");

    let panicked = call(&dispatcher, |d| {
        d.execute(named("panic", || -> Result<i32, TaskError> { panic!("unexpected state") }))
    })
    .await;
    tracing::info!(?panicked, "panicking task finished");

    let nested = call(&dispatcher, |d| {
        let inner = d.clone();
        d.execute(named("outer", move || {
            let value = inner.execute(named("inner", || Ok::<_, TaskError>(21)));
            Ok::<_, TaskError>(value.map(|v| v * 2))
        }))
    })
    .await;
    tracing::info!(?nested, "nested task finished");

    // (D) owning context を止めて、記録されたレポートを JSON で出す
    tokio::task::spawn_blocking(move || owner.shutdown_and_join()).await?;
    println!("{}", serde_json::to_string_pretty(&recorder.records())?);

    Ok(())
}
