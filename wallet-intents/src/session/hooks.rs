//! Lifecycle hooks around request dispatch.
//!
//! Hooks run at three points of every dispatch that passes the capability
//! gate:
//!
//! - **Before**: Inspect the request or abort it
//! - **After fulfil**: Observe a successful response
//! - **On reject**: Observe a rejection
//!
//! Rejections by the capability gate skip the before hooks but are still
//! reported to `on_reject`.
//!
//! All methods have default no-op implementations. Implement only the hooks
//! you need.

use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;

use super::Session;
use super::rpc::{Rejection, ResponseEnvelope, RpcRequest};

/// Decision returned by [`DispatchHooks::before_dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    /// Let the request proceed.
    Continue,
    /// Reject the request.
    Abort {
        /// Machine-readable reason (e.g., `"origin_blocked"`).
        reason: String,
        /// Human-readable explanation.
        message: String,
    },
}

/// What the hooks see of a dispatch.
pub struct DispatchContext<'a> {
    /// The session the request arrived on.
    pub session: &'a Session,
    /// The request being dispatched.
    pub request: &'a RpcRequest,
}

impl Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("session", &self.session.id)
            .field("request_id", &self.request.id)
            .field("action", &self.request.action.name())
            .finish()
    }
}

/// Lifecycle hooks for request dispatch.
///
/// Hooks execute in registration order:
///
/// 1. **`before_dispatch`**: first abort wins, remaining hooks are skipped
/// 2. **Handler runs**
/// 3. **`after_fulfil`** or **`on_reject`**: every hook runs
pub trait DispatchHooks: Send + Sync {
    /// Called before the handler runs.
    fn before_dispatch<'a>(
        &'a self,
        _ctx: &'a DispatchContext<'a>,
    ) -> Pin<Box<dyn Future<Output = HookDecision> + Send + 'a>> {
        Box::pin(async { HookDecision::Continue })
    }

    /// Called after a request was fulfilled.
    fn after_fulfil<'a>(
        &'a self,
        _ctx: &'a DispatchContext<'a>,
        _response: &'a ResponseEnvelope,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    /// Called after a request was rejected, for any reason.
    fn on_reject<'a>(
        &'a self,
        _ctx: &'a DispatchContext<'a>,
        _rejection: &'a Rejection,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}
