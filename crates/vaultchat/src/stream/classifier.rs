use futures::future;
use futures::stream::StreamExt;
use serde_json::Value;

use super::ChunkStream;
use crate::models::chunk::{ChunkData, RawChunk};

/// Split a wire line into prefix, payload and original text.
///
/// The first character is the prefix and the second is a separator (`:` on the wire);
/// the payload is everything after that. A payload that is not valid JSON is kept as
/// text rather than rejected. Returns `None` only for an empty line.
pub fn classify(line: &str) -> Option<RawChunk> {
    let mut chars = line.chars();
    let prefix = chars.next()?;
    chars.next();
    let payload = chars.as_str();

    let data = match serde_json::from_str::<Value>(payload) {
        Ok(value) => ChunkData::Json(value),
        Err(_) => ChunkData::Raw(payload.to_string()),
    };

    Some(RawChunk {
        prefix,
        data,
        raw: line.to_string(),
    })
}

pub fn classify_lines(lines: ChunkStream<String>) -> ChunkStream<RawChunk> {
    lines
        .filter_map(|line| {
            future::ready(match line {
                Ok(line) => classify(&line).map(Ok),
                Err(err) => Some(Err(err)),
            })
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_json_payload() {
        let chunk = classify("9:{\"toolCallId\":\"t1\",\"toolName\":\"swap\",\"args\":{\"amount\":5}}")
            .unwrap();
        assert_eq!(chunk.prefix, '9');
        assert_eq!(
            chunk.data,
            ChunkData::Json(json!({"toolCallId": "t1", "toolName": "swap", "args": {"amount": 5}}))
        );
        assert_eq!(
            chunk.raw,
            "9:{\"toolCallId\":\"t1\",\"toolName\":\"swap\",\"args\":{\"amount\":5}}"
        );
    }

    #[test]
    fn test_classify_text_payload() {
        let chunk = classify("0:\"Hello \"").unwrap();
        assert_eq!(chunk.prefix, '0');
        assert_eq!(chunk.data, ChunkData::Json(json!("Hello ")));
    }

    #[test]
    fn test_invalid_json_falls_back_to_raw_text() {
        let chunk = classify("0:{\"broken\":\"json").unwrap();
        assert_eq!(chunk.prefix, '0');
        assert_eq!(chunk.data, ChunkData::Raw("{\"broken\":\"json".to_string()));
        assert_eq!(chunk.raw, "0:{\"broken\":\"json");
    }

    #[test]
    fn test_separator_is_not_interpreted() {
        let chunk = classify("x|42").unwrap();
        assert_eq!(chunk.prefix, 'x');
        assert_eq!(chunk.data, ChunkData::Json(json!(42)));
    }

    #[test]
    fn test_prefix_only_line() {
        let chunk = classify("e").unwrap();
        assert_eq!(chunk.prefix, 'e');
        assert_eq!(chunk.data, ChunkData::Raw(String::new()));
        assert!(classify("").is_none());
    }

    #[test]
    fn test_multibyte_prefix() {
        let chunk = classify("\u{e9}:[1]").unwrap();
        assert_eq!(chunk.prefix, '\u{e9}');
        assert_eq!(chunk.data, ChunkData::Json(json!([1])));
    }

    #[tokio::test]
    async fn test_classify_lines_keeps_order_and_errors() {
        use crate::errors::ChatError;
        use futures::stream;

        let lines: ChunkStream<String> = stream::iter(vec![
            Ok("0:\"a\"".to_string()),
            Ok("0:oops".to_string()),
            Err(ChatError::Cancelled),
        ])
        .boxed();

        let chunks: Vec<_> = classify_lines(lines).collect().await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].as_ref().unwrap().data, ChunkData::Json(json!("a")));
        assert_eq!(chunks[1].as_ref().unwrap().data, ChunkData::Raw("oops".into()));
        assert_eq!(chunks[2], Err(ChatError::Cancelled));
    }
}
