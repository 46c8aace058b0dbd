use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data) = data {
                response["data"] = data;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a value as JSON, or hand it to `text` for human output
pub fn output_value(
    output_format: OutputFormat,
    value: &Value,
    text: impl FnOnce(&Value),
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

/// One line per word: id, text, training marks, learned flag, definition
pub fn format_word_line(word: &Value) -> String {
    let flag = |name: &str, mark: char| {
        if word.get(name).and_then(Value::as_bool).unwrap_or(false) {
            mark
        } else {
            '.'
        }
    };
    let learned = word.get("is_learned").and_then(Value::as_bool).unwrap_or(false);

    format!(
        "{:>6}  {:<24} [{}{}{}{}] {:<8} {}",
        word.get("id").and_then(Value::as_i64).unwrap_or_default(),
        word.get("word").and_then(Value::as_str).unwrap_or_default(),
        flag("cards", 'C'),
        flag("word_translation", 'T'),
        flag("constructor", 'K'),
        flag("word_audio", 'A'),
        if learned { "learned" } else { "" },
        word.get("definition").and_then(Value::as_str).unwrap_or_default(),
    )
}

pub fn print_words(words: &Value) {
    match words.as_array() {
        Some(words) if !words.is_empty() => {
            for word in words {
                println!("{}", format_word_line(word));
            }
        }
        _ => println!("No words yet"),
    }
}
