use futures::ready;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower_layer::Layer;
use tower_service::Service;

use crate::interceptor::Outcome;
use crate::pipeline::{HookChain, Terminals};

/// Runs a `HookChain` around every request sent through an inner service.
#[derive(Clone, Debug)]
pub struct Pipeline<S> {
    inner: S,
    hooks: HookChain,
}

/// Wraps services in a `Pipeline` using a shared `HookChain`.
#[derive(Clone, Debug)]
pub struct PipelineLayer {
    hooks: HookChain,
}

pin_project! {
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        terminals: Option<Terminals>,
    }
}

pin_project! {
    /// A response body that reports how the request ended once it is
    /// consumed, fails or is dropped.
    pub struct TrackedBody<B> {
        #[pin]
        inner: B,
        terminals: Terminals,
    }
}

// ===== impl PipelineLayer =====

impl PipelineLayer {
    pub fn new(hooks: HookChain) -> Self {
        Self { hooks }
    }

    /// A layer running `HookChain::shared()`.
    pub fn shared() -> Self {
        Self::new(HookChain::shared().clone())
    }
}

impl<S> Layer<S> for PipelineLayer {
    type Service = Pipeline<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Pipeline::new(inner, self.hooks.clone())
    }
}

// ===== impl Pipeline =====

impl<S> Pipeline<S> {
    pub fn new(inner: S, hooks: HookChain) -> Self {
        Self { inner, hooks }
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }
}

impl<S, A, B> Service<http::Request<A>> for Pipeline<S>
where
    S: Service<http::Request<A>, Response = http::Response<B>>,
    B: Body,
{
    type Response = http::Response<TrackedBody<B>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<A>) -> Self::Future {
        let terminals = self.hooks.dispatch(req.extensions_mut());
        ResponseFuture {
            inner: self.inner.call(req),
            terminals: Some(terminals),
        }
    }
}

// ===== impl ResponseFuture =====

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<http::Response<B>, E>>,
    B: Body,
{
    type Output = Result<http::Response<TrackedBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        let mut terminals = this.terminals.take().unwrap_or_default();

        match result {
            Ok(rsp) => {
                if rsp.body().is_end_stream() {
                    terminals.finish(Outcome::Success);
                }
                Poll::Ready(Ok(rsp.map(|inner| TrackedBody { inner, terminals })))
            }
            Err(e) => {
                terminals.finish(Outcome::Failure);
                Poll::Ready(Err(e))
            }
        }
    }
}

// ===== impl TrackedBody =====

impl<B: Body> Body for TrackedBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        let frame = ready!(this.inner.as_mut().poll_frame(cx));
        match &frame {
            None => {
                this.terminals.finish(Outcome::Success);
            }
            Some(Err(_)) => {
                this.terminals.finish(Outcome::Failure);
            }
            Some(Ok(_)) => {
                if this.inner.is_end_stream() {
                    this.terminals.finish(Outcome::Success);
                }
            }
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B: fmt::Debug> fmt::Debug for TrackedBody<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TrackedBody")
            .field("inner", &self.inner)
            .field("finished", &self.terminals.is_finished())
            .finish()
    }
}
