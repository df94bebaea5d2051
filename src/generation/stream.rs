//! Incremental decoding of streamed generator responses.
//!
//! The generator answers with a sequence of JSON objects, usually one per line, each carrying a
//! `response` text fragment. Objects may be split across network chunks, so bytes are buffered
//! until a complete object is available.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::{pin_mut, stream::StreamExt};
use serde_json::{Map, Value};

use super::GeneratorError;

/// One decoded object from the generator stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Generated text carried by the object, when `response` is a string.
    pub text: Option<String>,
    /// Whether the generator flagged this object as the last one.
    pub done: bool,
}

impl From<Map<String, Value>> for Fragment {
    fn from(object: Map<String, Value>) -> Self {
        Self {
            text: object
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_owned),
            done: object.get("done").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

/// Buffering decoder turning arbitrary byte chunks into complete fragments.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    buffer: Vec<u8>,
}

impl FragmentDecoder {
    /// Create a decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every object completed by it.
    ///
    /// A trailing partial object stays buffered until the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Fragment>, GeneratorError> {
        self.buffer.extend_from_slice(chunk);
        self.drain(false)
    }

    /// Flush the buffer at end of stream. Leftover bytes that do not form an object are an error.
    pub fn finish(mut self) -> Result<Vec<Fragment>, GeneratorError> {
        self.drain(true)
    }

    fn drain(&mut self, at_end: bool) -> Result<Vec<Fragment>, GeneratorError> {
        let mut fragments = Vec::new();
        let mut objects =
            serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Map<String, Value>>();

        loop {
            match objects.next() {
                Some(Ok(object)) => fragments.push(Fragment::from(object)),
                Some(Err(error)) if error.is_eof() && !at_end => break,
                Some(Err(error)) => return Err(GeneratorError::Decode(error.to_string())),
                None => break,
            }
        }

        let consumed = objects.byte_offset();
        self.buffer.drain(..consumed);
        Ok(fragments)
    }
}

/// Decode a stream of byte chunks into a lazy, finite stream of fragments.
///
/// The returned stream ends when `chunks` ends, and stops at the first transport or decode error.
pub fn fragment_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<Fragment, GeneratorError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<GeneratorError>,
{
    try_stream! {
        let mut decoder = FragmentDecoder::new();
        pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(Into::<GeneratorError>::into)?;
            for fragment in decoder.push(chunk.as_ref())? {
                yield fragment;
            }
        }

        for fragment in decoder.finish()? {
            yield fragment;
        }
    }
}

/// Concatenate fragment text in arrival order.
///
/// Fails with [`GeneratorError::EmptyResult`] when the stream produced no text at all.
pub async fn collect_fragments<S>(fragments: S) -> Result<String, GeneratorError>
where
    S: Stream<Item = Result<Fragment, GeneratorError>>,
{
    pin_mut!(fragments);
    let mut text = String::new();
    let mut count = 0_usize;

    while let Some(fragment) = fragments.next().await {
        if let Some(part) = fragment?.text {
            text.push_str(&part);
            count += 1;
        }
    }

    tracing::debug!(fragments = count, chars = text.len(), "Collected generator fragments");
    if text.is_empty() {
        return Err(GeneratorError::EmptyResult);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(
        parts: Vec<&'static str>,
    ) -> impl Stream<Item = Result<&'static [u8], GeneratorError>> {
        stream::iter(parts.into_iter().map(|part| Ok(part.as_bytes())))
    }

    #[test]
    fn decoder_waits_for_split_objects() {
        let mut decoder = FragmentDecoder::new();
        let first = decoder
            .push(br#"{"response":"Hel"#)
            .expect("partial chunk");
        assert!(first.is_empty());

        let second = decoder
            .push(b"lo \",\"done\":false}\n{\"response\":\"world\",\"done\":true}\n")
            .expect("completed chunk");
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].text.as_deref(), Some("Hello "));
        assert!(second[1].done);

        assert!(decoder.finish().expect("flush").is_empty());
    }

    #[test]
    fn decoder_accepts_concatenated_objects_without_newlines() {
        let mut decoder = FragmentDecoder::new();
        let fragments = decoder
            .push(br#"{"response":"a"}{"response":"b"} {"done":true}"#)
            .expect("fragments");
        let texts: Vec<_> = fragments.iter().map(|f| f.text.clone()).collect();
        assert_eq!(texts, vec![Some("a".into()), Some("b".into()), None]);
    }

    #[test]
    fn decoder_ignores_non_string_responses() {
        let mut decoder = FragmentDecoder::new();
        let fragments = decoder.push(br#"{"response":42}"#).expect("fragment");
        assert_eq!(fragments, vec![Fragment::default()]);
    }

    #[test]
    fn decoder_rejects_truncated_stream() {
        let mut decoder = FragmentDecoder::new();
        decoder.push(br#"{"response":"unterminated"#).expect("buffered");
        let error = decoder.finish().expect_err("truncated object");
        assert!(matches!(error, GeneratorError::Decode(_)));
    }

    #[test]
    fn decoder_rejects_garbage() {
        let mut decoder = FragmentDecoder::new();
        let error = decoder.push(b"not json").expect_err("garbage");
        assert!(matches!(error, GeneratorError::Decode(_)));
    }

    #[tokio::test]
    async fn collects_fragments_across_chunk_boundaries() {
        let stream = fragment_stream(chunks(vec![
            "{\"response\":\"Hello \"}\n{\"resp",
            "onse\":\"world\"}\n",
            "{\"response\":\"\",\"done\":true}\n",
        ]));

        let text = collect_fragments(stream).await.expect("summary");
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn empty_stream_is_an_empty_result() {
        let error = collect_fragments(fragment_stream(chunks(Vec::new())))
            .await
            .expect_err("empty");
        assert!(matches!(error, GeneratorError::EmptyResult));

        let error = collect_fragments(fragment_stream(chunks(vec!["{\"done\":true}\n"])))
            .await
            .expect_err("no text");
        assert!(matches!(error, GeneratorError::EmptyResult));
    }

    #[tokio::test]
    async fn transport_errors_end_the_stream() {
        let parts: Vec<Result<&'static [u8], GeneratorError>> = vec![
            Ok(&b"{\"response\":\"partial\"}\n"[..]),
            Err(GeneratorError::Unavailable("connection reset".into())),
        ];
        let error = collect_fragments(fragment_stream(stream::iter(parts)))
            .await
            .expect_err("transport failure");
        assert!(matches!(error, GeneratorError::Unavailable(_)));
    }
}
