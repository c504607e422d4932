//! The two-outcome async result threaded between stages.

use std::any::Any;

use futures::FutureExt;
use futures::future::BoxFuture;

/// Settled outcome of a stage: the payload, or a message describing the failure.
pub type PipeOutcome<P> = Result<P, String>;

/// An in-flight stage result.
pub type PipeTask<P> = BoxFuture<'static, PipeOutcome<P>>;

/// A task that is already settled with `payload`.
pub fn success<P: Send + 'static>(payload: P) -> PipeTask<P> {
    futures::future::ready(Ok(payload)).boxed()
}

/// A task that is already settled with a failure message.
pub fn failure<P: Send + 'static>(message: impl Into<String>) -> PipeTask<P> {
    futures::future::ready(Err(message.into())).boxed()
}

/// What a stage runner accepts: a raw payload or the output of a prior stage.
pub enum PipeInput<P> {
    Payload(P),
    Task(PipeTask<P>),
}

impl<P> PipeInput<P> {
    pub fn payload(payload: P) -> Self {
        Self::Payload(payload)
    }

    pub fn task(task: PipeTask<P>) -> Self {
        Self::Task(task)
    }
}

/// Extract a human-readable message from a panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settled_tasks_resolve_immediately() {
        assert_eq!(success(7).await, Ok(7));
        assert_eq!(failure::<i32>("nope").await, Err("nope".to_string()));
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "non-string panic payload");
    }
}
