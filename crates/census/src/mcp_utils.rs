use rmcp::model::{CallToolResult, RawContent};

/// Text payloads of a tool result, in order. Images, audio and embedded
/// resources are skipped.
pub fn text_items(result: &CallToolResult) -> Vec<&str> {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn is_error(result: &CallToolResult) -> bool {
    result.is_error.unwrap_or(false)
}
