//! # Example: service
//!
//! A small service with two components sharing one worker pool:
//! - `ticker` submits a job to the pool every 200ms until shutdown;
//! - `watchdog` stops the whole app after a few seconds (or press Ctrl-C).
//!
//! ## Flow
//! ```text
//! App::run()
//!     ├─► ticker.start   ──► pool.submit(job) every tick
//!     ├─► watchdog.start ──► sleep ──► return (first exit cancels the group)
//!     ├─► ticker.stop    ──► pool.shutdown() (drain queue, join workers)
//!     └─► AppStopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=servekit=debug,service=info cargo run --example service
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use servekit::{
    App, ComponentError, ComponentFn, ComponentRef, Config, LogWriter, Pool, RunContext,
    Subscribe, Task,
};
use tracing_subscriber::EnvFilter;

fn ticker(pool: Arc<Pool>, done: Arc<AtomicU64>) -> ComponentRef {
    let stop_pool = Arc::clone(&pool);
    ComponentFn::arc(
        "ticker",
        move |ctx: RunContext| {
            let (pool, done) = (Arc::clone(&pool), Arc::clone(&done));
            async move {
                let mut tick = tokio::time::interval(Duration::from_millis(200));
                let mut n = 0u64;
                loop {
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => return Err::<(), _>(ComponentError::Canceled),
                        _ = tick.tick() => {}
                    }
                    n += 1;
                    let done = Arc::clone(&done);
                    pool.submit(Task::new(
                        move |job: u64| async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            done.fetch_add(1, Ordering::Relaxed);
                            tracing::info!(job, "job finished");
                        },
                        n,
                    ))
                    .await
                    .map_err(|e| match ctx.is_cancelled() {
                        // The stop side closed the pool first.
                        true => ComponentError::Canceled,
                        false => ComponentError::failed(e),
                    })?;
                }
            }
        },
        move |_ctx: RunContext| {
            let pool = Arc::clone(&stop_pool);
            async move {
                pool.shutdown().await;
                Ok::<_, ComponentError>(())
            }
        },
    )
}

fn watchdog(after: Duration) -> ComponentRef {
    ComponentFn::arc(
        "watchdog",
        move |ctx: RunContext| async move {
            tokio::select! {
                _ = ctx.cancelled() => Err(ComponentError::Canceled),
                _ = tokio::time::sleep(after) => {
                    tracing::info!("watchdog elapsed, shutting down");
                    Ok(())
                }
            }
        },
        |_ctx: RunContext| async { Ok::<_, ComponentError>(()) },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("servekit=debug,service=info")),
        )
        .init();

    let pool = Arc::new(
        Pool::builder(4)
            .with_panic_handler(|fault| tracing::warn!(%fault, "job panicked"))
            .build()?,
    );
    let done = Arc::new(AtomicU64::new(0));

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let app = App::builder(Config::new("service", env!("CARGO_PKG_VERSION")))
        .with_component(ticker(Arc::clone(&pool), Arc::clone(&done)))
        .with_component(watchdog(Duration::from_secs(3)))
        .with_subscribers(subs)
        .build();

    app.run().await?;
    tracing::info!(jobs = done.load(Ordering::Relaxed), "service exited");
    Ok(())
}
