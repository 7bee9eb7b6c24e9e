//! # Concurrent task group with shared cancellation.
//!
//! Every member shares one [`CancellationToken`]. The first member to finish, whatever
//! its outcome, cancels it; [`Group::wait`] joins all members and returns the first
//! error by completion order, discarding the rest.
//!
//! Members are labelled with the component and phase they run, so a task that dies
//! outside its own panic guard (runtime abort, unguarded panic) is still attributed.

use std::collections::HashMap;
use std::future::Future;

use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::{Fault, Phase, RuntimeError};
use crate::guard::panic_message;

pub(crate) struct Group {
    set: JoinSet<Result<(), RuntimeError>>,
    labels: HashMap<Id, (String, Phase)>,
    token: CancellationToken,
}

impl Group {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            set: JoinSet::new(),
            labels: HashMap::new(),
            token,
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Spawns a member running `phase` of `component`; its completion cancels the group.
    pub(crate) fn spawn<F>(&mut self, component: &str, phase: Phase, fut: F)
    where
        F: Future<Output = Result<(), RuntimeError>> + Send + 'static,
    {
        let token = self.token.clone();
        let handle = self.set.spawn(async move {
            let res = fut.await;
            token.cancel();
            res
        });
        self.labels.insert(handle.id(), (component.to_string(), phase));
    }

    /// Waits for every member; returns the first error.
    pub(crate) async fn wait(mut self) -> Result<(), RuntimeError> {
        let mut first: Option<RuntimeError> = None;
        while let Some(joined) = self.set.join_next().await {
            let res = joined.unwrap_or_else(|e| Err(self.join_failure(e)));
            if let Err(e) = res {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn join_failure(&mut self, err: JoinError) -> RuntimeError {
        // A dead member never reaches its own `token.cancel()`.
        self.token.cancel();
        let (component, phase) = self
            .labels
            .remove(&err.id())
            .unwrap_or_else(|| ("<unknown>".to_string(), Phase::Start));

        match err.try_into_panic() {
            Ok(payload) => RuntimeError::ComponentPanicked {
                component,
                phase,
                fault: Fault::new(panic_message(&*payload)),
            },
            Err(_) => RuntimeError::ComponentAborted { component, phase },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;

    #[tokio::test]
    async fn test_first_completion_cancels_group() {
        let mut group = Group::new(CancellationToken::new());
        let token = group.token().clone();

        let waiter = token.clone();
        group.spawn("waiter", Phase::Stop, async move {
            waiter.cancelled().await;
            Ok(())
        });
        group.spawn("oneshot", Phase::Start, async { Ok(()) });

        assert!(group.wait().await.is_ok());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_first_error_wins() {
        let mut group = Group::new(CancellationToken::new());
        let token = group.token().clone();

        group.spawn("a", Phase::Start, async {
            Err(RuntimeError::ComponentStart {
                component: "a".into(),
                source: ComponentError::failed("first"),
            })
        });
        group.spawn("b", Phase::Stop, async move {
            token.cancelled().await;
            Err(RuntimeError::ComponentStop {
                component: "b".into(),
                source: ComponentError::failed("second"),
            })
        });

        let err = group.wait().await.unwrap_err();
        assert_eq!(err.component(), Some("a"));
    }

    #[tokio::test]
    async fn test_unguarded_panic_is_attributed_to_its_member() {
        let mut group = Group::new(CancellationToken::new());
        let token = group.token().clone();

        group.spawn("db", Phase::Stop, async {
            if true {
                panic!("driver gone");
            }
            Ok(())
        });

        match group.wait().await.unwrap_err() {
            RuntimeError::ComponentPanicked {
                component,
                phase,
                fault,
            } => {
                assert_eq!(component, "db");
                assert_eq!(phase, Phase::Stop);
                assert_eq!(fault.message(), "driver gone");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_aborted_member_is_reported_with_its_phase() {
        let mut group = Group::new(CancellationToken::new());
        group.spawn("http", Phase::Stop, std::future::pending());
        group.set.abort_all();

        match group.wait().await.unwrap_err() {
            RuntimeError::ComponentAborted { component, phase } => {
                assert_eq!(component, "http");
                assert_eq!(phase, Phase::Stop);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
