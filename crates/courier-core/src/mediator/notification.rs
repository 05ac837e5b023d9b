//! Notification fan-out.
//!
//! `publish` filters the handlers captured at construction by identity
//! (ASCII case-insensitive), spawns one task per match and returns without
//! waiting. Each task owns its failure: errors and panics are logged and
//! never reach the publisher or sibling handlers.
//!
//! The returned [`PublishHandle`] can be dropped (tasks keep running) or
//! joined to observe completion.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use courier_types::Notification;
use futures_util::FutureExt;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::Mediator;
use crate::identity::MessageIdentity;

/// How a single handler invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryOutcome {
    Delivered,
    Failed,
    Panicked,
}

/// Summary of a joined publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub scheduled: usize,
    pub delivered: usize,
    pub failed: usize,
    pub panicked: usize,
}

impl PublishReport {
    pub fn all_delivered(&self) -> bool {
        self.delivered == self.scheduled
    }
}

/// Handles to the tasks spawned by one `publish` call.
///
/// Dropping the handle detaches the tasks; they still run to completion.
#[derive(Debug)]
pub struct PublishHandle {
    identity: MessageIdentity,
    dispatch_id: Uuid,
    tasks: Vec<JoinHandle<DeliveryOutcome>>,
}

impl PublishHandle {
    pub fn identity(&self) -> &MessageIdentity {
        &self.identity
    }

    pub fn dispatch_id(&self) -> Uuid {
        self.dispatch_id
    }

    /// Number of handler invocations scheduled.
    pub fn scheduled(&self) -> usize {
        self.tasks.len()
    }

    /// Whether every scheduled invocation has finished.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Wait for every scheduled invocation and summarize the outcomes.
    pub async fn join(self) -> PublishReport {
        let mut report = PublishReport {
            scheduled: self.tasks.len(),
            ..PublishReport::default()
        };
        for result in join_all(self.tasks).await {
            match result {
                Ok(DeliveryOutcome::Delivered) => report.delivered += 1,
                Ok(DeliveryOutcome::Failed) => report.failed += 1,
                Ok(DeliveryOutcome::Panicked) => report.panicked += 1,
                Err(err) => {
                    warn!(
                        identity = %self.identity,
                        dispatch_id = %self.dispatch_id,
                        error = %err,
                        "notification task did not complete"
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl Mediator {
    /// Broadcast a notification to every matching handler.
    ///
    /// Returns as soon as the invocations are scheduled. Handler side
    /// effects are not guaranteed to be visible yet; use
    /// [`PublishHandle::join`] to wait for them. The caller's cancellation
    /// token is forwarded to every handler.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        cancel: Option<CancellationToken>,
    ) -> PublishHandle {
        let identity = MessageIdentity::of::<N>(&self.options);
        let dispatch_id = Uuid::now_v7();
        let cancel = cancel.unwrap_or_default();
        let notification: Arc<dyn Any + Send + Sync> = Arc::new(notification);

        let tasks: Vec<_> = self
            .notification_handlers
            .iter()
            .filter(|handler| identity.matches_ignore_case(handler.identity().as_str()))
            .map(|handler| {
                let handler = Arc::clone(handler);
                let notification = Arc::clone(&notification);
                let options = Arc::clone(&self.options);
                let cancel = cancel.clone();
                let identity = identity.clone();

                tokio::spawn(async move {
                    let name = handler.handler_name();
                    let invocation = handler.handle_erased(notification.as_ref(), &options, cancel);
                    match AssertUnwindSafe(invocation).catch_unwind().await {
                        Ok(Ok(())) => {
                            debug!(
                                %identity,
                                %dispatch_id,
                                handler = name,
                                "notification handled"
                            );
                            DeliveryOutcome::Delivered
                        }
                        Ok(Err(err)) => {
                            error!(
                                %identity,
                                %dispatch_id,
                                handler = name,
                                error = %format_args!("{err:#}"),
                                "notification handler failed"
                            );
                            DeliveryOutcome::Failed
                        }
                        Err(_) => {
                            error!(
                                %identity,
                                %dispatch_id,
                                handler = name,
                                "notification handler panicked"
                            );
                            DeliveryOutcome::Panicked
                        }
                    }
                })
            })
            .collect();

        debug!(%identity, %dispatch_id, scheduled = tasks.len(), "published notification");
        PublishHandle {
            identity,
            dispatch_id,
            tasks,
        }
    }
}
