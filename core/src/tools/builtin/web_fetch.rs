//! Web page fetch tool
//!
//! Fetches an http(s) URL and returns its readable text so the model can use
//! live data. Fetch failures are reported to the model as structured error
//! content; invalid arguments fail the call.

use crate::error::{Result, ToolError};
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};
use url::Url;

const DEFAULT_MAX_CHARS: usize = 5000;
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 5;
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const MAX_FETCHES_PER_MINUTE: usize = 10;
const USER_AGENT: &str = concat!("toolrelay/", env!("CARGO_PKG_VERSION"));

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(div|p|br|li|h[1-6]|tr|td|th|blockquote|pre|article|section|header|footer)\b[^>]*>",
    )
    .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid regex"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// Fetches web pages as plain text
pub struct WebFetchTool {
    client: reqwest::Client,
    recent_fetches: Mutex<VecDeque<Instant>>,
    body_limit: usize,
}

impl WebFetchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            recent_fetches: Mutex::new(VecDeque::new()),
            body_limit: MAX_BODY_BYTES,
        }
    }

    /// Cap on bytes read from a response body
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Sliding one-minute window; returns false when the limit is reached
    fn try_acquire(&self) -> bool {
        let mut recent = match self.recent_fetches.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Instant::now();
        while recent
            .front()
            .is_some_and(|t| now.duration_since(*t) >= Duration::from_secs(60))
        {
            recent.pop_front();
        }

        if recent.len() >= MAX_FETCHES_PER_MINUTE {
            return false;
        }
        recent.push_back(now);
        true
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let mut response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?
            .error_for_status()?;

        // stop reading once the cap is reached; the rest is never downloaded
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = self.body_limit - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a web page over http(s) and return its text content. \
         Scripts, styles and markup are stripped; long pages are truncated."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http:// or https:// URL to fetch"
                },
                "max_chars": {
                    "type": "integer",
                    "description": "Maximum number of characters to return (default 5000)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let raw_url: String = call.get_parameter("url")?;
        let max_chars = call
            .get_optional_parameter::<usize>("max_chars")?
            .unwrap_or(DEFAULT_MAX_CHARS);
        let url = parse_http_url(&raw_url)?;

        if !self.try_acquire() {
            tracing::warn!("web_fetch rate limit reached ({} per minute)", MAX_FETCHES_PER_MINUTE);
            return Ok(ToolResult::json(json!({
                "url": raw_url,
                "error": format!("rate limited: at most {} fetches per minute", MAX_FETCHES_PER_MINUTE),
            })));
        }

        tracing::info!("web_fetch: {}", url);
        let html = match self.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("web_fetch failed for {}: {}", url, e);
                return Ok(ToolResult::json(json!({
                    "url": raw_url,
                    "error": format!("fetch failed: {}", e),
                })));
            }
        };

        let text = html_to_text(&html);
        let length = text.chars().count();
        let truncated = length > max_chars;
        let content = if truncated {
            text.chars().take(max_chars).collect()
        } else {
            text
        };

        Ok(ToolResult::json(json!({
            "url": raw_url,
            "content": content,
            "length": length,
            "truncated": truncated,
        })))
    }
}

fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ToolError::InvalidParameters {
        message: format!("invalid url '{}': {}", raw, e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ToolError::InvalidParameters {
            message: format!("unsupported url scheme '{}', only http and https are allowed", scheme),
        }
        .into()),
    }
}

/// Convert an HTML document to readable plain text
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = BLOCK_TAG_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = SPACE_RE.replace_all(&text, " ");
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        // last, so "&amp;lt;" decodes to "&lt;" rather than "<"
        .replace("&amp;", "&")
}
