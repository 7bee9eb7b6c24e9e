//! # Panic containment at execution boundaries.
//!
//! Every independently scheduled unit of work in this crate (pool task, component
//! `start`/`stop`, subscriber callback) runs behind [`catch_panic`], so a panic is turned
//! into a [`Fault`] value at the boundary instead of tearing down the surrounding worker.
//!
//! [`spawn_guarded`] applies the same boundary to a detached future: the panic is logged
//! and the task simply ends.
//!
//! **Warning**: `AssertUnwindSafe` is used, so shared state behind a lock may be left
//! inconsistent by a panicking body.

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::task::JoinHandle;

use crate::error::Fault;

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Polls `fut` to completion, converting a panic into a [`Fault`].
pub async fn catch_panic<F>(fut: F) -> Result<F::Output, Fault>
where
    F: Future,
{
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|payload| Fault::new(panic_message(&*payload)))
}

/// Spawns `fut` on the current tokio runtime behind a panic boundary.
///
/// The handle resolves to `Some(output)` on completion and `None` if the future panicked;
/// the panic is logged with the given name.
pub fn spawn_guarded<F>(name: impl Into<Cow<'static, str>>, fut: F) -> JoinHandle<Option<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let name = name.into();
    tokio::spawn(async move {
        match catch_panic(fut).await {
            Ok(out) => Some(out),
            Err(fault) => {
                tracing::error!(task = %name, panic = %fault.message(), "guarded task panicked");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_panic_passes_output_through() {
        let out = catch_panic(async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_panic_static_str_payload() {
        let out: Result<(), Fault> = catch_panic(async {
            panic!("boom");
        })
        .await;
        assert_eq!(out.unwrap_err().message(), "boom");
    }

    #[tokio::test]
    async fn test_catch_panic_formatted_payload() {
        let code = 42;
        let out: Result<(), Fault> = catch_panic(async move {
            panic!("code {code}");
        })
        .await;
        assert_eq!(out.unwrap_err().message(), "code 42");
    }

    #[test]
    fn test_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(5_u8);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }

    #[tokio::test]
    async fn test_spawn_guarded_contains_panic() {
        let failed = spawn_guarded("doomed", async {
            panic!("inside");
        });
        assert_eq!(failed.await.ok(), Some(None));

        let ok = spawn_guarded("fine", async { "done" });
        assert_eq!(ok.await.ok(), Some(Some("done")));
    }
}
