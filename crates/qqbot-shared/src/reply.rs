//! Reply formatting: short answers go out as a plain message, long ones
//! as a merged-forward message made of chunk nodes.

use serde::{Deserialize, Serialize};

/// Replies shorter than this (in chars) are sent as plain text.
pub const FORWARD_THRESHOLD: usize = 114;

/// Maximum chars per forward node.
pub const CHUNK_SIZE: usize = 2048;

/// One node of a merged-forward message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardNode {
    /// Display name shown on the node.
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Text { text: String },
    Forward { nodes: Vec<ForwardNode> },
}

impl Reply {
    /// Pick the reply shape for `text`; forward nodes are named `title`.
    pub fn auto(title: &str, text: &str) -> Self {
        if text.chars().count() < FORWARD_THRESHOLD {
            return Reply::Text {
                text: text.to_string(),
            };
        }

        let nodes = split_into_chunks(text, CHUNK_SIZE)
            .into_iter()
            .map(|content| ForwardNode {
                name: title.to_string(),
                content,
            })
            .collect();
        Reply::Forward { nodes }
    }
}

/// Split `text` into pieces of at most `size` chars, never inside a
/// UTF-8 sequence. A `size` of zero is treated as one.
pub fn split_into_chunks(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let chunks = split_into_chunks("一二三四五", 2);
        assert_eq!(chunks, vec!["一二", "三四", "五"]);
        assert!(split_into_chunks("", 2048).is_empty());
        assert_eq!(split_into_chunks("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_short_reply_is_plain_text() {
        let text = "字".repeat(FORWARD_THRESHOLD - 1);
        assert_eq!(Reply::auto("to 10001", &text), Reply::Text { text });
    }

    #[test]
    fn test_long_reply_is_forwarded_in_chunks() {
        let text = "a".repeat(CHUNK_SIZE * 2 + 10);
        let Reply::Forward { nodes } = Reply::auto("to 10001", &text) else {
            panic!("expected a forward reply");
        };

        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.name == "to 10001"));
        assert_eq!(nodes[2].content.len(), 10);
    }

    #[test]
    fn test_threshold_reply_is_forwarded() {
        let text = "b".repeat(FORWARD_THRESHOLD);
        assert!(matches!(Reply::auto("t", &text), Reply::Forward { ref nodes } if nodes.len() == 1));
    }
}
