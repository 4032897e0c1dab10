// Accumulates streamed text increments and re-renders after each one

use futures::{Stream, StreamExt};

use crate::error::GenerateError;
use crate::render::RenderSink;

/// Drain a stream of text increments into one Markdown string.
///
/// The accumulated text starts empty, grows strictly in arrival order, and is
/// handed to `sink` in full after every increment. Returns the final text, or
/// the first error; partial output is not preserved on error.
pub async fn consume<S, R>(mut increments: S, sink: &mut R) -> Result<String, GenerateError>
where
    S: Stream<Item = Result<String, GenerateError>> + Unpin,
    R: RenderSink + ?Sized,
{
    let mut accumulated = String::new();

    while let Some(increment) = increments.next().await {
        accumulated.push_str(&increment?);
        sink.render(&accumulated);
    }

    Ok(accumulated)
}
