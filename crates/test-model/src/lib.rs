//! A local fake completion provider for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use tripwhisper_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<PresetEvent>,
    completed: bool,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        let Some(sleep) = &mut this.sleep else {
            this.sleep = Some(Box::pin(sleep(this.delay)));
            return Pin::new(this).poll_next_event(cx);
        };
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        match this.events.pop_front() {
            Some(PresetEvent::MessageDelta(delta)) => {
                Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(delta))))
            }
            Some(PresetEvent::Error(kind)) => {
                // Nothing is delivered after a broken stream.
                this.events.clear();
                this.completed = true;
                Poll::Ready(Err(Error {
                    message: "preset stream error",
                    kind,
                }))
            }
            Some(PresetEvent::Completed(reason)) => {
                this.events.clear();
                this.completed = true;
                Poll::Ready(Ok(Some(ModelResponseEvent::Completed(reason))))
            }
            None if !this.completed => {
                this.completed = true;
                Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))))
            }
            // In case this method is called after completion.
            None => Poll::Ready(Ok(None)),
        }
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how
/// the model should respond to each request. Preset responses are
/// consumed in order, one per request. If there are no responses left,
/// an error will be returned.
///
/// Every request is recorded, so tests can inspect the exact prompt the
/// provider has observed. Clones share the same script.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script().responses.push_back(preset);
    }

    #[inline]
    pub fn add_text_response<S: Into<String>>(&mut self, text: S) {
        self.add_response(PresetResponse::with_text(text));
    }

    /// Sets the delay before each event is delivered.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.script().requests.clone()
    }

    /// Returns the number of preset responses not consumed yet.
    pub fn remaining_responses(&self) -> usize {
        self.script().responses.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("remaining_responses", &self.remaining_responses())
            .field("delay", &self.delay)
            .finish()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.script();
        script.requests.push(req.clone());

        let result = match script.responses.pop_front() {
            None => Err(Error {
                message: "no enough responses",
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                rejection: Some(kind),
                ..
            }) => Err(Error {
                message: "preset rejection",
                kind,
            }),
            Some(preset) => Ok(TestModelResponse {
                events: preset.events.into(),
                completed: false,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use tripwhisper_model::ModelMessage;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<String, Error> {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            if let ModelResponseEvent::MessageDelta(delta) = event {
                msg.push_str(&delta);
            }
        }
        Ok(msg)
    }

    fn request(input: &str) -> ModelRequest {
        ModelRequest {
            model: "test".to_owned(),
            messages: vec![ModelMessage::User(input.to_owned())],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Try ".to_owned()),
            PresetEvent::MessageDelta("Bali.".to_owned()),
        ]));
        provider.add_text_response("Street food in Ubud.");

        let resp = provider.send_request(&request("Where?")).await.unwrap();
        assert_eq!(collect_response(resp).await.unwrap(), "Try Bali.");

        let resp = provider.send_request(&request("Food?")).await.unwrap();
        assert_eq!(
            collect_response(resp).await.unwrap(),
            "Street food in Ubud."
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages[0].content(), "Food?");
        assert_eq!(provider.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::rejected(
            ErrorKind::Authentication,
        ));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Partial".to_owned()),
            PresetEvent::Error(ErrorKind::Network),
        ]));

        let Err(err) = provider.send_request(&request("Hi")).await else {
            panic!("expected a rejection");
        };
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let resp = provider.send_request(&request("Hi")).await.unwrap();
        let err = collect_response(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        let Err(err) = provider.send_request(&request("Hi")).await else {
            panic!("expected an exhausted script");
        };
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
