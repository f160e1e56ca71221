//! Handles to exchanges running on the client's executor.

use crate::error::HttpResult;
use crate::models::HttpResponse;
use futures::future::{join_all, FutureExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// A response that has not arrived yet.
///
/// Await it from async code, or call [`wait`](Self::wait) from a plain
/// thread. Dropping it does not cancel the exchange; [`abort`](Self::abort)
/// does.
#[derive(Debug)]
pub struct PendingResponse {
    request_id: String,
    handle: JoinHandle<HttpResult<HttpResponse>>,
}

impl PendingResponse {
    pub(crate) fn new(request_id: String, handle: JoinHandle<HttpResult<HttpResponse>>) -> Self {
        Self { request_id, handle }
    }

    /// Id of the request this response answers.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the exchange. Awaiting afterwards yields an execution error.
    pub fn abort(&self) {
        log::debug!("aborting request {}", self.request_id);
        self.handle.abort();
    }

    /// Blocks the current thread until the response arrives.
    ///
    /// Must not be called from inside an async task: it parks the thread the
    /// task runs on.
    pub fn wait(self) -> HttpResult<HttpResponse> {
        futures::executor::block_on(self)
    }

    /// Maps the response once it arrives. Errors pass through untouched.
    pub fn then_apply<F, T>(self, f: F) -> impl Future<Output = HttpResult<T>>
    where
        F: FnOnce(HttpResponse) -> T,
    {
        self.map(|result| result.map(f))
    }
}

impl Future for PendingResponse {
    type Output = HttpResult<HttpResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_error)) => Poll::Ready(Err(join_error.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Waits for every pending response. Results keep the input order.
pub async fn all_of(pending: Vec<PendingResponse>) -> Vec<HttpResult<HttpResponse>> {
    join_all(pending).await
}
