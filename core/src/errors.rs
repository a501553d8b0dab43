//! User-facing formatting for API failures.

use std::fmt::Write;

use serde_json::Value;

use resonance_types::truncate_with_ellipsis;

const API_ERROR_BADGE: &str = "[API error]";

#[must_use]
pub fn split_api_error(raw: &str) -> Option<(String, String)> {
    let rest = raw.strip_prefix("API error ")?;
    let (status, body) = rest.split_once(": ")?;
    Some((status.trim().to_string(), body.trim().to_string()))
}

pub fn extract_error_message(raw: &str) -> Option<String> {
    let body = split_api_error(raw).map_or_else(|| raw.trim().to_string(), |(_, body)| body);
    let payload: Value = serde_json::from_str(&body).ok()?;
    payload
        .pointer("/error/message")
        .and_then(|value| value.as_str())
        .or_else(|| payload.pointer("/message").and_then(|value| value.as_str()))
        .or_else(|| payload.as_str())
        .map(ToString::to_string)
}

#[must_use]
pub fn is_auth_error(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    let mentions_key = lower.contains("api key") || lower.contains("authorization");
    let auth_words = lower.contains("invalid")
        || lower.contains("incorrect")
        || lower.contains("missing")
        || lower.contains("unauthorized")
        || lower.contains("not provided")
        || lower.contains("authentication");
    let has_code = lower.contains("401");

    lower.contains("invalid_api_key")
        || lower.contains("you must provide an api key")
        || (mentions_key && auth_words)
        || (mentions_key && has_code)
        || (has_code && lower.contains("unauthorized"))
}

/// Short summary of a provider error, e.g. for the digest's error blocks.
#[must_use]
pub fn summarize_api_error(err: &str) -> String {
    let trimmed = err.trim();
    match split_api_error(trimmed) {
        Some((status, body)) => {
            let detail = extract_error_message(&body).unwrap_or(body);
            truncate_with_ellipsis(&format!("{status}: {detail}"), 200)
        }
        None => truncate_with_ellipsis(trimmed, 200),
    }
}

/// Format an API error for the terminal, with a fix hint for bad credentials.
#[must_use]
pub fn format_api_error(model: &str, err: &str) -> String {
    let trimmed = err.trim();
    let (status, body) =
        split_api_error(trimmed).unwrap_or_else(|| (String::new(), trimmed.to_string()));
    let extracted = extract_error_message(&body).unwrap_or_else(|| body.clone());
    let is_auth = is_auth_error(&extracted) || is_auth_error(trimmed) || is_auth_error(&status);

    let mut content = String::from(API_ERROR_BADGE);
    content.push_str("\n\n");

    if is_auth {
        let _ = write!(content, "OpenAI authentication failed for model {model}.");
        content.push_str("\n\nFix:\n- Set ");
        content.push_str(resonance_config::OPENAI_KEY_ENV_VAR);
        let config_hint = resonance_config::config_path().map_or_else(
            || "~/.resonance/config.toml".to_string(),
            |p| p.display().to_string(),
        );
        let _ = write!(
            content,
            " (env or .env) or add it to {config_hint} under [api_keys].\n- Then rerun the command."
        );

        let detail = if status.trim().is_empty() {
            truncate_with_ellipsis(&extracted, 160)
        } else {
            status.trim().to_string()
        };
        if !detail.is_empty() {
            content.push_str("\n\nDetails: ");
            content.push_str(&detail);
        }
        return content;
    }

    let detail = if !extracted.trim().is_empty() {
        extracted.trim().to_string()
    } else if !trimmed.is_empty() {
        trimmed.to_string()
    } else {
        "unknown error".to_string()
    };
    if status.trim().is_empty() {
        content.push_str("Request failed.");
    } else {
        content.push_str("Request failed (");
        content.push_str(status.trim());
        content.push_str(").");
    }
    content.push_str("\n\nDetails: ");
    content.push_str(&truncate_with_ellipsis(&detail, 200));

    content
}
