// Rendering seam between the stream consumer and whatever displays the output

/// Replaces the displayed content with the given Markdown.
///
/// Called after every increment with the whole accumulated response, so an
/// implementation must be idempotent: rendering the same text twice shows the
/// same thing once.
pub trait RenderSink {
    fn render(&mut self, markdown: &str);
}

