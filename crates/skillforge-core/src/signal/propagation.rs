//! Routes a raised signal to its subscribed handler skills.
//!
//! The subscription directory (an external collaborator) maps a signal name
//! to handler skills; each handler is dispatched independently and
//! concurrently through the execution dispatcher, with the triggering event
//! -- Source and immutable RootSource -- attached to the run request.
//!
//! One handler's failure never prevents dispatch to its siblings.
//!
//! Deliberately absent: recursion-depth and fan-out caps. This component
//! exposes the full RootSource chain so the external router can enforce
//! caps with complete provenance.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use skillforge_types::error::{DispatchError, ResolveError, SignalError};
use skillforge_types::org::OrganizationIdentifier;
use skillforge_types::runner::{SkillRunRequest, SkillRunResponse};
use skillforge_types::signal::SignalEvent;
use skillforge_types::skill::SkillLanguage;

use crate::dispatch::dispatcher::{ExecutionDispatcher, SkillRunner};
use crate::dispatch::retry::RetryPolicy;
use crate::endpoint::resolver::EndpointResolver;
use crate::endpoint::store::EndpointOverrideStore;

// ---------------------------------------------------------------------------
// Subscription directory port
// ---------------------------------------------------------------------------

/// One handler skill registered for a signal name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSubscription {
    pub skill_name: String,
    pub language: SkillLanguage,
    pub code: String,
}

/// External collaborator resolving signal name -> handler skills.
///
/// This core only consumes the list; registration and storage live
/// elsewhere.
pub trait SubscriptionDirectory: Send + Sync {
    fn handlers_for(
        &self,
        org: &OrganizationIdentifier,
        signal_name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SignalSubscription>, SignalError>> + Send;
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a single handler's dispatch failed.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The isolated result of dispatching one handler.
#[derive(Debug)]
pub struct HandlerOutcome {
    pub skill_name: String,
    pub result: Result<SkillRunResponse, HandlerFailure>,
}

// ---------------------------------------------------------------------------
// Propagation service
// ---------------------------------------------------------------------------

/// Fans a raised signal out to every subscribed handler.
pub struct SignalPropagation<D, S, R, P> {
    directory: D,
    resolver: EndpointResolver<S>,
    dispatcher: ExecutionDispatcher<R, P>,
}

impl<D, S, R, P> SignalPropagation<D, S, R, P>
where
    D: SubscriptionDirectory,
    S: EndpointOverrideStore,
    R: SkillRunner,
    P: RetryPolicy,
{
    pub fn new(
        directory: D,
        resolver: EndpointResolver<S>,
        dispatcher: ExecutionDispatcher<R, P>,
    ) -> Self {
        Self {
            directory,
            resolver,
            dispatcher,
        }
    }

    /// Raise a signal: dispatch every registered handler concurrently.
    ///
    /// Returns one [`HandlerOutcome`] per handler, in subscription order.
    /// Only a directory lookup failure is an `Err`; per-handler failures
    /// are data in the outcome list.
    pub async fn raise(
        &self,
        org: &OrganizationIdentifier,
        event: &SignalEvent,
        cancel: &CancellationToken,
    ) -> Result<Vec<HandlerOutcome>, SignalError> {
        let handlers = self.directory.handlers_for(org, &event.name).await?;
        debug!(
            signal = %event.name,
            source = %event.source.skill_name,
            handlers = handlers.len(),
            "propagating signal"
        );

        let dispatches = handlers.into_iter().map(|handler| async move {
            let result = self.dispatch_handler(org, &handler, event, cancel).await;
            if let Err(ref failure) = result {
                warn!(
                    signal = %event.name,
                    handler = %handler.skill_name,
                    error = %failure,
                    "signal handler failed"
                );
            }
            HandlerOutcome {
                skill_name: handler.skill_name,
                result,
            }
        });

        Ok(join_all(dispatches).await)
    }

    async fn dispatch_handler(
        &self,
        org: &OrganizationIdentifier,
        handler: &SignalSubscription,
        event: &SignalEvent,
        cancel: &CancellationToken,
    ) -> Result<SkillRunResponse, HandlerFailure> {
        let endpoint = self.resolver.resolve(org, handler.language).await?;
        let request = SkillRunRequest::new(
            handler.skill_name.clone(),
            event.arguments.clone(),
            handler.code.clone(),
        )
        .with_signal(event.clone());

        Ok(self.dispatcher.dispatch(&endpoint, &request, cancel).await?)
    }
}
