//! Authorization decorator for domain services.
//!
//! A service exposes its capabilities as a trait. [`AuthorizationMiddleware`]
//! wraps any implementation of that trait and implements the same trait
//! again: every method looks up its [`Operation`] in the service's table,
//! asks the [`AccessClient`] and only then forwards to the wrapped value.
//!
//! ```ignore
//! mod operations {
//!     pub const GET_POST: Operation<str> = Operation::item(SERVICE_NAME, "getPost", post_id);
//! }
//!
//! #[async_trait]
//! impl<S: PostService> PostService for AuthorizationMiddleware<S> {
//!     async fn get_post(&self, ctx: &Context, post_id: &str) -> Result<Post, ContentsError> {
//!         self.authorize(ctx, &operations::GET_POST, post_id)?;
//!         self.next().get_post(ctx, post_id).await
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use tracing::debug;

use crate::client::AccessClient;
use crate::context::Context;
use crate::error::AuthzError;

/// How an operation derives its resource from its arguments.
pub enum Scope<A: ?Sized> {
    /// No resource: matched only by `-` rules.
    Collection,
    /// The resource identifier computed from the arguments.
    Item(fn(&A) -> Cow<'_, str>),
}

/// One row of a service's authorization table.
pub struct Operation<A: ?Sized> {
    pub service: &'static str,
    pub action: &'static str,
    pub scope: Scope<A>,
}

impl<A: ?Sized> Operation<A> {
    pub const fn collection(service: &'static str, action: &'static str) -> Self {
        Operation {
            service,
            action,
            scope: Scope::Collection,
        }
    }

    pub const fn item(
        service: &'static str,
        action: &'static str,
        extract: fn(&A) -> Cow<'_, str>,
    ) -> Self {
        Operation {
            service,
            action,
            scope: Scope::Item(extract),
        }
    }

    /// The resource checked for a call with `args`; empty for collection scope.
    pub fn resource<'a>(&self, args: &'a A) -> Cow<'a, str> {
        match self.scope {
            Scope::Collection => Cow::Borrowed(""),
            Scope::Item(extract) => extract(args),
        }
    }
}

impl<A: ?Sized> Debug for Operation<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let scope = match self.scope {
            Scope::Collection => "collection",
            Scope::Item(_) => "item",
        };
        f.debug_struct("Operation")
            .field("service", &self.service)
            .field("action", &self.action)
            .field("scope", &scope)
            .finish()
    }
}

/// Wraps `next` so that every call is checked before it is forwarded.
#[derive(Debug, Clone)]
pub struct AuthorizationMiddleware<S> {
    client: AccessClient,
    next: S,
}

impl<S> AuthorizationMiddleware<S> {
    pub fn new(client: AccessClient, next: S) -> Self {
        AuthorizationMiddleware { client, next }
    }

    pub fn client(&self) -> &AccessClient {
        &self.client
    }

    /// The wrapped implementation. Calls made on it directly are unchecked.
    pub fn next(&self) -> &S {
        &self.next
    }

    pub fn into_inner(self) -> S {
        self.next
    }

    /// Check the caller in `ctx` against `op` for a call with `args`.
    pub fn authorize<A: ?Sized>(
        &self,
        ctx: &Context,
        op: &Operation<A>,
        args: &A,
    ) -> Result<(), AuthzError> {
        let resource = op.resource(args);
        debug!(
            event = "Authorize",
            phase = "Check",
            service = op.service,
            action = op.action,
            resource = %resource
        );
        self.client
            .check_access(ctx, op.service, &resource, op.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPolicyStore;
    use std::sync::Arc;

    const SERVICE: &str = "scribble/widgets";

    const POLICY: &str = r#"
p, alice, scribble/widgets, -, listWidgets
p, alice, scribble/widgets, w1, getWidget
p, bob, scribble/widgets, *, getWidget
p, bob, scribble/widgets, shelf:top, moveWidget
"#;

    struct Shelf {
        name: String,
        level: String,
    }

    fn widget_id(id: &str) -> Cow<'_, str> {
        Cow::Borrowed(id)
    }

    fn shelf_key(shelf: &Shelf) -> Cow<'_, str> {
        Cow::Owned(format!("{}:{}", shelf.name, shelf.level))
    }

    fn collection_marker(_: &()) -> Cow<'_, str> {
        Cow::Borrowed("-")
    }

    const LIST: Operation<()> = Operation::collection(SERVICE, "listWidgets");
    const LIST_BY_MARKER: Operation<()> =
        Operation::item(SERVICE, "listWidgets", collection_marker);
    const GET_BY_MARKER: Operation<()> = Operation::item(SERVICE, "getWidget", collection_marker);
    const GET: Operation<str> = Operation::item(SERVICE, "getWidget", widget_id);
    const MOVE: Operation<Shelf> = Operation::item(SERVICE, "moveWidget", shelf_key);

    async fn middleware() -> AuthorizationMiddleware<()> {
        let store = Arc::new(MemoryPolicyStore::new_from_str(POLICY).unwrap());
        let client = AccessClient::connect(store).await.unwrap();
        AuthorizationMiddleware::new(client, ())
    }

    #[test]
    fn test_operation_resource() {
        assert_eq!(LIST.resource(&()), "");
        assert_eq!(GET.resource("w7"), "w7");
        let shelf = Shelf {
            name: "shelf".to_string(),
            level: "top".to_string(),
        };
        assert_eq!(MOVE.resource(&shelf), "shelf:top");
    }

    #[test]
    fn test_operation_debug() {
        assert_eq!(
            format!("{GET:?}"),
            r#"Operation { service: "scribble/widgets", action: "getWidget", scope: "item" }"#
        );
    }

    #[tokio::test]
    async fn test_authorize_collection() {
        let mw = middleware().await;
        let alice = Context::background().with_subject("alice");
        let bob = Context::background().with_subject("bob");

        assert!(mw.authorize(&alice, &LIST, &()).is_ok());
        let err = mw.authorize(&bob, &LIST, &()).unwrap_err();
        assert!(err.is_access_denied());
    }

    #[tokio::test]
    async fn test_authorize_item() {
        let mw = middleware().await;
        let alice = Context::background().with_subject("alice");
        let bob = Context::background().with_subject("bob");

        assert!(mw.authorize(&alice, &GET, "w1").is_ok());
        assert!(mw.authorize(&alice, &GET, "w2").is_err());
        assert!(mw.authorize(&bob, &GET, "w2").is_ok());
    }

    #[tokio::test]
    async fn test_authorize_composite_resource() {
        let mw = middleware().await;
        let bob = Context::background().with_subject("bob");
        let top = Shelf {
            name: "shelf".to_string(),
            level: "top".to_string(),
        };
        let bottom = Shelf {
            name: "shelf".to_string(),
            level: "bottom".to_string(),
        };

        assert!(mw.authorize(&bob, &MOVE, &top).is_ok());
        match mw.authorize(&bob, &MOVE, &bottom) {
            Err(AuthzError::AccessDenied { resource, .. }) => assert_eq!(resource, "shelf:bottom"),
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_marker_resource_is_collection_scope() {
        let mw = middleware().await;
        let alice = Context::background().with_subject("alice");
        let bob = Context::background().with_subject("bob");

        assert_eq!(LIST_BY_MARKER.resource(&()), "-");
        assert!(mw.authorize(&alice, &LIST_BY_MARKER, &()).is_ok());
        assert!(mw.authorize(&bob, &LIST_BY_MARKER, &()).is_err());

        // bob's "*" grant covers items only.
        assert!(mw.authorize(&bob, &GET_BY_MARKER, &()).is_err());
        assert!(mw.authorize(&bob, &GET, "w2").is_ok());

        let client = mw.client();
        assert!(client.check_access(&alice, SERVICE, "-", "listWidgets").is_ok());
        assert!(client.check_access(&bob, SERVICE, "-", "getWidget").is_err());
    }
}
