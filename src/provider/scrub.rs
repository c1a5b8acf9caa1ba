//! Error-body sanitizing.
//!
//! The provider carries the API key in the URL query string, so a stringified
//! request error can leak it. Redact key-bearing tokens and cap the body
//! length before anything reaches logs or error chains.

const MAX_API_ERROR_CHARS: usize = 400;
const KEY_MARKERS: &[&str] = &["key=", "\"apiKey\":\"", "x-goog-api-key: "];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn redact_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    loop {
        let Some(rel) = scrubbed[search_from..].find(marker) else {
            break;
        };
        let content_start = search_from + rel + marker.len();
        let end = token_end(scrubbed, content_start);
        if end == content_start {
            search_from = content_start;
            continue;
        }
        scrubbed.replace_range(content_start..end, "[REDACTED]");
        search_from = content_start + "[REDACTED]".len();
    }
}

/// Redact credential tokens and truncate an upstream error body.
#[must_use]
pub fn sanitize_api_error(raw: &str) -> String {
    let mut scrubbed = raw.to_string();
    for marker in KEY_MARKERS {
        redact_after_marker(&mut scrubbed, marker);
    }
    if scrubbed.chars().count() > MAX_API_ERROR_CHARS {
        let truncated: String = scrubbed.chars().take(MAX_API_ERROR_CHARS).collect();
        return format!("{truncated}…");
    }
    scrubbed
}
