//! Agent invocation seam.
//!
//! The emitter treats the underlying agent as opaque: either a single
//! awaited text result or an async sequence of text chunks.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use relaykit_a2a::Message;

use crate::error::BridgeResult;

/// A boxed stream of text chunks from a streaming agent invocation
pub type TextChunkStream = Pin<Box<dyn Stream<Item = BridgeResult<String>> + Send>>;

/// Generic tool-calling agent invocation.
///
/// Implementations wrap whatever actually produces text (a language-model
/// call, an agent framework run, a remote service). Network-level timeouts
/// are the implementation's responsibility.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Invoke the agent and wait for the complete response text.
    async fn invoke(&self, messages: &[Message]) -> BridgeResult<String>;

    /// Invoke the agent and stream the response as text chunks.
    ///
    /// The default implementation wraps [`invoke`](Self::invoke) in a
    /// single-chunk stream for agents without streaming support.
    async fn invoke_streaming(&self, messages: &[Message]) -> BridgeResult<TextChunkStream> {
        let text = self.invoke(messages).await?;
        Ok(Box::pin(futures::stream::iter([Ok(text)])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct EchoInvoker;

    #[async_trait]
    impl AgentInvoker for EchoInvoker {
        async fn invoke(&self, messages: &[Message]) -> BridgeResult<String> {
            Ok(messages.last().map(|m| m.text()).unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_default_streaming_wraps_invoke() {
        let invoker = EchoInvoker;
        let messages = vec![Message::user("hello")];

        let mut stream = invoker.invoke_streaming(&messages).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "hello");
        assert!(stream.next().await.is_none());
    }
}
