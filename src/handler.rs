//! Handler trait and type erasure.
//!
//! # How typed handlers are stored
//!
//! The route table holds handlers of different types in one map, so each is
//! erased behind `dyn ErasedHandler`. Unlike a plain `Fn(Request)` handler,
//! a route handler names what it needs by parameter type, and the erased
//! wrapper binds those parameters from the [`RequestContext`] before calling
//! it:
//!
//! ```text
//! async fn create(json: JsonObject) -> anyhow::Result<Reply>   ← user writes this
//!        ↓ service.post("/create", create)
//! create.into_boxed_handler()                        ← Handler<(JsonObject,)> impl
//!        ↓
//! Arc::new(FnHandler::new(create))                   ← stored as BoxedHandler
//!        ↓
//! handler.call(&cx)  at request time                 ← binds JsonObject, one vtable call
//!        ↓
//! Box::pin(async { create(json).await.into_outcome() })
//! ```
//!
//! Parameter binding failures (a `JsonObject` handler sent an array) surface
//! from [`ErasedHandler::call`] before the handler runs. The shape of the
//! signature, which parameters and whether the return value carries the
//! result, is available as a [`Signature`] without calling anything, so the
//! route table validates it when it is built.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{DispatchError, HandlerError};
use crate::extract::{FromContext, ParamKind, RequestContext};
use crate::reply::{CsvReply, JsonReply, Reply, ServletReply};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to the handler's [`Outcome`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Internal dispatch interface.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, cx: &RequestContext) -> Result<BoxFuture, DispatchError>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// What a handler's parameters and return type look like.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub params: Vec<ParamKind>,
    /// `true` when the return value is the result (a [`Reply`]); `false` for
    /// `()`, where the handler writes through the response handle.
    pub carries_result: bool,
}

impl Signature {
    pub fn count(&self, kind: ParamKind) -> usize {
        self.params.iter().filter(|p| **p == kind).count()
    }
}

/// What a handler invocation produced.
#[derive(Debug)]
pub enum Outcome {
    Reply(Reply),
    /// Returned `()`; any output went through the response handle.
    Void,
    /// Declared a result but produced none.
    Missing,
    Failed(HandlerError),
}

// ── Return types ──────────────────────────────────────────────────────────────

/// Implemented for the return types a handler may have.
///
/// [`Reply`] and its three variants carry a result; `()` does not.
/// `Option<R>` yields [`Outcome::Missing`] on `None`, and `Result<R, E>` maps
/// `Err` to a handler failure.
pub trait IntoOutcome: Send + 'static {
    const CARRIES_RESULT: bool;

    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Reply {
    const CARRIES_RESULT: bool = true;

    fn into_outcome(self) -> Outcome {
        Outcome::Reply(self)
    }
}

macro_rules! reply_outcome {
    ($($ty:ty),*) => {
        $(impl IntoOutcome for $ty {
            const CARRIES_RESULT: bool = true;

            fn into_outcome(self) -> Outcome {
                Outcome::Reply(self.into())
            }
        })*
    };
}

reply_outcome!(JsonReply, CsvReply, ServletReply);

impl IntoOutcome for () {
    const CARRIES_RESULT: bool = false;

    fn into_outcome(self) -> Outcome {
        Outcome::Void
    }
}

impl<R> IntoOutcome for Option<R>
where
    R: Into<Reply> + Send + 'static,
{
    const CARRIES_RESULT: bool = true;

    fn into_outcome(self) -> Outcome {
        match self {
            Some(reply) => Outcome::Reply(reply.into()),
            None => Outcome::Missing,
        }
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<HandlerError> + Send + 'static,
{
    const CARRIES_RESULT: bool = T::CARRIES_RESULT;

    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => value.into_outcome(),
            Err(err) => Outcome::Failed(err.into()),
        }
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any `async fn` (or
/// closure returning a future) taking up to three parameters from
/// [`extract`](crate::extract) and returning an [`IntoOutcome`] type:
///
/// ```text
/// async fn name(p1: P1, p2: P2, p3: P3) -> impl IntoOutcome
/// ```
///
/// `Args` is the parameter tuple; it only exists to keep the impls for
/// different arities apart. The trait is sealed.
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn signature(&self) -> Signature;

    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<Args> {}
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete handler `F` and the parameter tuple it is called with.
struct FnHandler<F, Args> {
    f: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> FnHandler<F, Args> {
    fn new(f: F) -> Self {
        Self { f, _args: PhantomData }
    }
}

macro_rules! impl_handler {
    ($($param:ident),*) => {
        impl<F, Fut, R, $($param,)*> private::Sealed<($($param,)*)> for F
        where
            F: Fn($($param),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome,
            $($param: FromContext,)*
        {
        }

        impl<F, Fut, R, $($param,)*> Handler<($($param,)*)> for F
        where
            F: Fn($($param),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome,
            $($param: FromContext,)*
        {
            fn signature(&self) -> Signature {
                Signature {
                    params: vec![$(<$param as FromContext>::KIND),*],
                    carries_result: R::CARRIES_RESULT,
                }
            }

            fn into_boxed_handler(self) -> BoxedHandler {
                Arc::new(FnHandler::<F, ($($param,)*)>::new(self))
            }
        }

        impl<F, Fut, R, $($param,)*> ErasedHandler for FnHandler<F, ($($param,)*)>
        where
            F: Fn($($param),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome,
            $($param: FromContext,)*
        {
            #[allow(non_snake_case, unused_variables)]
            fn call(&self, cx: &RequestContext) -> Result<BoxFuture, DispatchError> {
                $(let $param = <$param as FromContext>::from_context(cx)?;)*
                let fut = (self.f)($($param),*);
                Ok(Box::pin(async move { fut.await.into_outcome() }))
            }
        }
    };
}

impl_handler!();
impl_handler!(P1);
impl_handler!(P1, P2);
impl_handler!(P1, P2, P3);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::extract::tests::context;
    use crate::extract::{JsonObject, PathSuffix, ResponseHandle};
    use crate::negotiate::Body;

    async fn no_params() -> ServletReply {
        ServletReply::success("ok")
    }

    async fn writes(_json: JsonObject, res: ResponseHandle) {
        res.success("written");
    }

    async fn fallible(_suffix: PathSuffix) -> anyhow::Result<JsonReply> {
        anyhow::bail!("database offline")
    }

    async fn maybe() -> Option<Reply> {
        None
    }

    fn signature_of<A, H: Handler<A>>(handler: H) -> Signature {
        handler.signature()
    }

    #[test]
    fn signatures_reflect_parameters_and_return() {
        assert_eq!(signature_of(no_params), Signature { params: vec![], carries_result: true });
        assert_eq!(
            signature_of(writes),
            Signature { params: vec![ParamKind::JsonObject, ParamKind::ResponseHandle], carries_result: false }
        );
        assert!(signature_of(fallible).carries_result);
        assert!(signature_of(maybe).carries_result);
        assert_eq!(signature_of(writes).count(ParamKind::ResponseHandle), 1);
    }

    #[tokio::test]
    async fn call_binds_and_runs() {
        let cx = context(Body::Json(json!({"name": "widget"})));
        let outcome = writes.into_boxed_handler().call(&cx).unwrap().await;
        assert!(matches!(outcome, Outcome::Void));
        assert_eq!(cx.response.take().unwrap().text(), "written");
    }

    #[tokio::test]
    async fn binding_failure_skips_the_handler() {
        let cx = context(Body::Json(json!([1, 2, 3])));
        let err = writes.into_boxed_handler().call(&cx).err().unwrap();
        assert!(matches!(err, DispatchError::JsonTypeMismatch { .. }));
        assert!(!cx.response.is_written());
    }

    #[tokio::test]
    async fn errors_and_none_become_outcomes() {
        let cx = context(Body::Text(String::new()));
        let outcome = fallible.into_boxed_handler().call(&cx).unwrap().await;
        let Outcome::Failed(err) = outcome else { panic!("expected failure") };
        assert_eq!(err.root_message(), "database offline");

        let outcome = maybe.into_boxed_handler().call(&cx).unwrap().await;
        assert!(matches!(outcome, Outcome::Missing));
    }
}
