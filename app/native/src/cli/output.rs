//! CLI output formatting utilities.
//!
//! This module provides utilities for formatting CLI output including:
//! - Tables for structured data display
//! - JSON syntax highlighting

use colored::Colorize;
use serde::Serialize;
use tabled::Table;
use tabled::settings::Style;

use crate::error::EngineError;

/// Prints JSON with syntax highlighting.
///
/// Colors:
/// - Keys: Cyan
/// - Strings: Green
/// - Numbers: Yellow
/// - Booleans/Null: Magenta
/// - Brackets/Braces: White (default)
pub fn print_highlighted_json(value: &serde_json::Value) {
    let json_str = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", highlight_json(&json_str));
}

/// Serializes `value` and prints it highlighted.
///
/// # Errors
///
/// Returns an error if `value` cannot be represented as JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), EngineError> {
    let value = serde_json::to_value(value)?;
    print_highlighted_json(&value);
    Ok(())
}

/// Colors a pretty-printed JSON string.
fn highlight_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut in_string = false;
    let mut is_key = false;
    let mut escape_next = false;
    let mut current_token = String::new();
    let mut after_colon = false;

    for ch in json.chars() {
        if escape_next {
            current_token.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current_token.push(ch);
            escape_next = true;
            continue;
        }

        match ch {
            '"' if in_string => {
                current_token.push(ch);
                let colored =
                    if is_key { current_token.cyan() } else { current_token.green() };
                out.push_str(&colored.to_string());
                current_token.clear();
                in_string = false;
                is_key = false;
            }
            '"' => {
                flush_token(&mut out, &mut current_token, after_colon);
                current_token.push(ch);
                in_string = true;
                is_key = !after_colon;
                after_colon = false;
            }
            ':' if !in_string => {
                flush_token(&mut out, &mut current_token, false);
                out.push_str(&":".white().to_string());
                after_colon = true;
            }
            ',' if !in_string => {
                flush_token(&mut out, &mut current_token, after_colon);
                out.push_str(&",".white().to_string());
                after_colon = false;
            }
            '{' | '}' | '[' | ']' if !in_string => {
                flush_token(&mut out, &mut current_token, after_colon);
                out.push_str(&ch.to_string().white().bold().to_string());
                after_colon = false;
            }
            _ => current_token.push(ch),
        }
    }

    flush_token(&mut out, &mut current_token, after_colon);
    out
}

/// Appends the current token with appropriate coloring.
fn flush_token(out: &mut String, token: &mut String, is_value: bool) {
    if token.is_empty() {
        return;
    }

    if is_value && !token.trim().is_empty() {
        let start = token.find(|c: char| !c.is_whitespace()).unwrap_or(0);
        let end = token.rfind(|c: char| !c.is_whitespace()).map_or(token.len(), |i| i + 1);
        let (prefix, value, suffix) = (&token[..start], &token[start..end], &token[end..]);

        let colored = if value == "true" || value == "false" || value == "null" {
            value.magenta().to_string()
        } else if value.parse::<f64>().is_ok() {
            value.yellow().to_string()
        } else {
            value.to_string()
        };
        out.push_str(prefix);
        out.push_str(&colored);
        out.push_str(suffix);
    } else {
        out.push_str(token);
    }

    token.clear();
}

/// Renders rows as a rounded table.
#[must_use]
pub fn table<T: tabled::Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Prints a bold section heading with a count.
pub fn heading(title: &str, count: usize) {
    println!("{}", format!("{title} ({count})").bold());
}

/// Formats a boolean as a colored string.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// Formats an optional value, dimming the placeholder.
#[must_use]
pub fn format_option<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".dimmed().to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain<R>(f: impl FnOnce() -> R) -> R {
        colored::control::set_override(false);
        f()
    }

    #[test]
    fn test_highlight_preserves_text() {
        let json = "{\n  \"name\": \"terms\",\n  \"dynamic\": false,\n  \"count\": 3\n}";
        assert_eq!(plain(|| highlight_json(json)), json);
    }

    #[test]
    fn test_highlight_handles_escapes() {
        let json = r#"{"exec": "sh -c \"echo hi\""}"#;
        assert_eq!(plain(|| highlight_json(json)), json);
    }

    #[test]
    fn test_format_bool_true() {
        assert!(format_bool(true).contains('✓'));
    }

    #[test]
    fn test_format_bool_false() {
        assert!(format_bool(false).contains('✗'));
    }

    #[test]
    fn test_format_option() {
        assert_eq!(format_option(Some(3)), "3");
        assert!(plain(|| format_option::<u32>(None)).contains('-'));
    }

    #[test]
    fn test_table_renders_rows() {
        #[derive(tabled::Tabled)]
        struct Row {
            name: &'static str,
        }
        let rendered = table([Row { name: "terms" }]);
        assert!(rendered.contains("terms"));
        assert!(rendered.contains("name"));
    }
}
