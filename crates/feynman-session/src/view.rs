use std::borrow::Cow;

const FENCE: &str = "```";

/// Shown in place of a code block that has not been closed yet
pub const PROCESSING_PLACEHOLDER: &str = "\n\n_Processing code block..._";

/// True when the text has an odd number of code fence markers
pub fn has_open_fence(content: &str) -> bool {
    content.matches(FENCE).count() % 2 == 1
}

/// Text up to the unterminated fence, or everything when all fences are closed
pub fn visible_prefix(content: &str) -> &str {
    if !has_open_fence(content) {
        return content;
    }
    match content.rfind(FENCE) {
        Some(index) => &content[..index],
        None => content,
    }
}

/// Renderer-facing form of a (possibly still streaming) message.
///
/// Only the presentation changes; the stored content is never touched.
pub fn render_view(content: &str) -> Cow<'_, str> {
    if has_open_fence(content) {
        Cow::Owned(format!("{}{}", visible_prefix(content), PROCESSING_PLACEHOLDER))
    } else {
        Cow::Borrowed(content)
    }
}
