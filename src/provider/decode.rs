//! Streaming response decoding
//!
//! The provider answers with server-sent events. Each `data:` payload is one
//! frame: either the `[DONE]` sentinel or a JSON chunk carrying the next
//! text delta at `choices[0].delta.content`.

/// Sentinel frame closing the stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// End-of-stream marker
    Done,
    /// Text delta; empty when the chunk carried no content
    Delta(String),
    /// Frame that is not valid JSON
    Malformed(String),
}

/// Decode a single frame payload
pub fn decode_frame(frame: &str) -> StreamChunk {
    if frame == DONE_SENTINEL {
        return StreamChunk::Done;
    }

    let value: serde_json::Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(e) => return StreamChunk::Malformed(e.to_string()),
    };

    let content = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"));

    // scalars keep their text form; null and containers carry nothing
    let text = match content {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };

    StreamChunk::Delta(text)
}

/// Extract the frame payload from one line of the event stream.
///
/// Returns `None` for lines that carry no payload: blanks, comments and the
/// `event:`/`id:`/`retry:` fields. Lines without a field name are passed
/// through whole so newline-delimited JSON streams decode as well.
pub fn frame_from_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    if let Some(data) = line.strip_prefix("data:") {
        let data = data.trim_start();
        return (!data.is_empty()).then_some(data);
    }

    if ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
    {
        return None;
    }

    Some(line)
}

/// Accumulates raw response bytes and yields complete frames.
///
/// Bytes are only decoded as UTF-8 once a full line is available, so
/// multi-byte characters split across network reads survive intact.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and drain every complete frame, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = frame_from_line(&line) {
                frames.push(frame.to_string());
            }
        }
        frames
    }

    /// Flush an unterminated trailing line once the transport has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest);
        frame_from_line(&line).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_sentinel() {
        assert_eq!(decode_frame("[DONE]"), StreamChunk::Done);
    }

    #[test]
    fn test_delta_content() {
        assert_eq!(
            decode_frame(r#"{"choices":[{"delta":{"content":"hi"}}]}"#),
            StreamChunk::Delta("hi".to_string())
        );
    }

    #[test]
    fn test_missing_path_is_empty() {
        for frame in [
            r#"{"choices":[{"delta":{}}]}"#,
            r#"{"choices":[]}"#,
            r#"{"id":"x"}"#,
            r#"{"choices":[{"delta":{"content":null}}]}"#,
            r#"{"choices":[{"delta":{"content":{"text":"x"}}}]}"#,
            r#"{"choices":[{"delta":{"content":["x"]}}]}"#,
            r#"[1,2,3]"#,
        ] {
            assert_eq!(decode_frame(frame), StreamChunk::Delta(String::new()), "{frame}");
        }
    }

    #[test]
    fn test_scalar_content_keeps_text() {
        assert_eq!(
            decode_frame(r#"{"choices":[{"delta":{"content":5}}]}"#),
            StreamChunk::Delta("5".to_string())
        );
        assert_eq!(
            decode_frame(r#"{"choices":[{"delta":{"content":2.5}}]}"#),
            StreamChunk::Delta("2.5".to_string())
        );
        assert_eq!(
            decode_frame(r#"{"choices":[{"delta":{"content":true}}]}"#),
            StreamChunk::Delta("true".to_string())
        );
    }

    #[test]
    fn test_malformed_frame() {
        assert!(matches!(decode_frame("not-json"), StreamChunk::Malformed(_)));
        assert!(matches!(
            decode_frame(r#"{"choices":[{"delta":"#),
            StreamChunk::Malformed(_)
        ));
    }

    #[test]
    fn test_frame_from_line() {
        assert_eq!(frame_from_line("data: [DONE]"), Some("[DONE]"));
        assert_eq!(frame_from_line("data:{\"a\":1}\r"), Some("{\"a\":1}"));
        assert_eq!(frame_from_line(": keep-alive"), None);
        assert_eq!(frame_from_line("event: message"), None);
        assert_eq!(frame_from_line("data:"), None);
        assert_eq!(frame_from_line(""), None);
        assert_eq!(frame_from_line("{\"a\":1}"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_buffer_splits_across_reads() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"data: {\"choices\":[{\"delta\"").is_empty());

        let frames = buffer.push(b":{\"content\":\"A\"}}]}\n\ndata: [DONE]\n\n");
        assert_eq!(
            frames,
            vec![
                r#"{"choices":[{"delta":{"content":"A"}}]}"#.to_string(),
                "[DONE]".to_string(),
            ]
        );
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_buffer_keeps_split_multibyte_chars() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"你好\"}}]}\n";
        let bytes = line.as_bytes();
        // split inside the first character of the content
        let split = line.find('你').unwrap() + 1;

        let mut buffer = FrameBuffer::new();
        let mut frames = buffer.push(&bytes[..split]);
        frames.extend(buffer.push(&bytes[split..]));

        assert_eq!(frames.len(), 1);
        assert_eq!(decode_frame(&frames[0]), StreamChunk::Delta("你好".to_string()));
    }

    #[test]
    fn test_buffer_flushes_trailing_line() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"data: [DONE]").is_empty());
        assert_eq!(buffer.finish(), Some("[DONE]".to_string()));
        assert_eq!(buffer.finish(), None);
    }
}
