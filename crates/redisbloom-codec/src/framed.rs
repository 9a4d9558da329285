//! Framed RESP stream for async I/O.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use pin_project_lite::pin_project;
use resp_protocol::{Command, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::error::CodecError;
use crate::resp_codec::RespCodec;

pin_project! {
    /// A framed RESP stream over an async I/O transport.
    ///
    /// This wraps a tokio-util `Framed` codec. Clients use
    /// [`request`](RespStream::request) for one command at a time; the
    /// server side reads requests as a `Stream` of values and answers
    /// through the `Sink<Value>` impl.
    pub struct RespStream<T> {
        #[pin]
        inner: Framed<T, RespCodec>,
    }
}

impl<T> RespStream<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Create a new RESP stream over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            inner: Framed::new(transport, RespCodec::new()),
        }
    }
}

impl<T> RespStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Send one command and wait for its reply.
    ///
    /// Server error replies are returned as [`Value::Error`]; only transport
    /// and framing failures produce `Err`.
    pub async fn request(&mut self, command: &Command) -> Result<Value, CodecError> {
        self.inner.send(command).await?;
        self.read_value().await
    }

    /// Read the next value from the stream.
    pub async fn read_value(&mut self) -> Result<Value, CodecError> {
        match self.inner.next().await {
            Some(result) => result,
            None => Err(CodecError::ConnectionClosed),
        }
    }
}

impl<T> Stream for RespStream<T>
where
    T: AsyncRead + Unpin,
{
    type Item = Result<Value, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl<T> Sink<Value> for RespStream<T>
where
    T: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Sink::<Value>::poll_ready(self.project().inner, cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Value) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Sink::<Value>::poll_flush(self.project().inner, cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Sink::<Value>::poll_close(self.project().inner, cx)
    }
}

impl<T> std::fmt::Debug for RespStream<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespStream")
            .field("transport", self.inner.get_ref())
            .finish()
    }
}
