use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoff;
use tripwhisper_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tracing::Instrument;

use crate::error::ProviderError;

/// Callback receiving reply deltas as they stream in.
pub(crate) type TranscriptFn = Arc<dyn Fn(&str) + Send + Sync>;

type SendRequestResult = Result<ModelClientResponse, ProviderError>;
type AttemptResult = Result<ModelClientResponse, FailedAttempt>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, TranscriptFn) -> BoxedSendRequestFuture
        + Send + Sync
>;

/// A wrapper around a completion provider that erases its type and
/// applies the host's timeout and retry policy to every request.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    timeout: Option<Duration>,
    retry: Option<ExponentialBackoff>,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_transcript| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_transcript).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            timeout: None,
            retry: None,
        }
    }

    /// Limits how long a single attempt may take.
    #[inline]
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Retries transient failures with the given backoff.
    #[inline]
    pub fn set_retry(&mut self, retry: Option<ExponentialBackoff>) {
        self.retry = retry;
    }

    /// Sends a request and returns the complete reply.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_transcript: Option<TranscriptFn>,
    ) -> Result<ModelClientResponse, ProviderError> {
        let Some(retry) = &self.retry else {
            return self
                .send_once(req, on_transcript)
                .await
                .map_err(|failed| failed.error);
        };

        backoff::future::retry(retry.clone(), || {
            let fut = self.send_once(req.clone(), on_transcript.clone());
            async move {
                fut.await.map_err(|failed| {
                    // Once a delta reached the host, a second attempt
                    // would print the reply twice.
                    if failed.streamed || !failed.error.kind().is_transient() {
                        backoff::Error::permanent(failed.error)
                    } else {
                        debug!("retrying after: {}", failed.error);
                        backoff::Error::transient(failed.error)
                    }
                })
            }
        })
        .await
    }

    fn send_once(
        &self,
        req: ModelRequest,
        on_transcript: Option<TranscriptFn>,
    ) -> impl Future<Output = AttemptResult> + Send + 'static {
        let streamed = Arc::new(AtomicBool::new(false));
        let tracked: TranscriptFn = {
            let streamed = Arc::clone(&streamed);
            Arc::new(move |delta: &str| {
                streamed.store(true, Ordering::Relaxed);
                if let Some(on_transcript) = &on_transcript {
                    on_transcript(delta);
                }
            })
        };
        let fut = (self.handler_fn)(req, tracked);
        let timeout = self.timeout;
        async move {
            let result = match timeout {
                None => fut.await,
                Some(timeout) => tokio::time::timeout(timeout, fut)
                    .await
                    .unwrap_or_else(|_| {
                        warn!("request timed out after {timeout:?}");
                        Err(ProviderError::new(
                            ErrorKind::Timeout,
                            format!("no reply within {timeout:?}"),
                        ))
                    }),
            };
            result.map_err(|error| FailedAttempt {
                error,
                streamed: streamed.load(Ordering::Relaxed),
            })
        }
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    pub transcript: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

struct FailedAttempt {
    error: ProviderError,
    streamed: bool,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_transcript: TranscriptFn,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(ProviderError::from_provider(&err));
        }
    };

    let mut transcript = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(ProviderError::from_provider(&err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                on_transcript(&delta);
                transcript.push_str(&delta);
            }
            ModelResponseEvent::Completed(ModelFinishReason::ContentFilter) => {
                warn!("reply was cut by the content filter");
                return Err(ProviderError::new(
                    ErrorKind::Moderated,
                    "the reply was blocked by the provider's content filter",
                ));
            }
            ModelResponseEvent::Completed(reason) => {
                if reason != ModelFinishReason::Stop {
                    debug!("reply finished early: {reason:?}");
                }
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        transcript,
        finish_reason,
    })
}
