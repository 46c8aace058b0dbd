use std::io::Read;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::config::load_environment_config;
use crate::cli::utils::{format_word_line, output_success, output_value, print_words};
use crate::cli::OutputFormat;
use crate::words::{Training, WordId, WordUpdate};

#[derive(Subcommand)]
pub enum WordsCommands {
    #[command(about = "List your words, newest first")]
    List,

    #[command(about = "Add a word with its definition")]
    Add {
        #[arg(help = "Word")]
        word: String,
        #[arg(help = "Definition")]
        definition: String,
    },

    #[command(about = "Show a single word")]
    Show {
        #[arg(help = "Word id")]
        id: WordId,
    },

    #[command(about = "Delete a word")]
    Delete {
        #[arg(help = "Word id")]
        id: WordId,
    },

    #[command(about = "Apply a batch of field updates read as JSON from stdin")]
    Patch,

    #[command(about = "Override the learned status of a word")]
    Status {
        #[arg(help = "Word id")]
        id: WordId,
        #[arg(help = "true or false", action = clap::ArgAction::Set)]
        learned: bool,
    },

    #[command(about = "Record the result of a training exercise")]
    Train {
        #[arg(help = "Word id")]
        id: WordId,
        #[arg(help = "cards, word_translation, constructor or word_audio", value_parser = parse_training)]
        training: Training,
        #[arg(help = "pass or fail", value_parser = parse_result)]
        result: bool,
    },
}

pub async fn handle(cmd: WordsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let env = load_environment_config()?;
    let client = ApiClient::authenticated(&env)?;

    match cmd {
        WordsCommands::List => {
            let words = client.get("/api/v1/vocab").await?;
            output_value(output_format, &words, print_words)
        }
        WordsCommands::Add { word, definition } => {
            let created = client
                .post("/api/v1/vocab", &json!({ "word": word, "definition": definition }))
                .await?;
            output_success(
                output_format,
                &format!("Added word {}", created["id"]),
                Some(created),
            )
        }
        WordsCommands::Show { id } => {
            let word = client.get(&format!("/api/v1/vocab/{}", id)).await?;
            output_value(output_format, &word, |word| println!("{}", format_word_line(word)))
        }
        WordsCommands::Delete { id } => {
            client.delete(&format!("/api/v1/vocab/{}", id)).await?;
            output_success(output_format, &format!("Deleted word {}", id), None)
        }
        WordsCommands::Patch => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let batch = parse_batch(&input)?;

            let result = client.patch("/api/v1/vocab", &batch).await?;
            output_success(
                output_format,
                &format!("Updated {} word(s)", result["updated"]),
                Some(result),
            )
        }
        WordsCommands::Status { id, learned } => {
            let result = client
                .patch(
                    &format!("/api/v1/vocab/{}/status", id),
                    &json!({ "is_learned": learned }),
                )
                .await?;
            output_success(
                output_format,
                &format!("Word {} marked {}", id, if learned { "learned" } else { "not learned" }),
                Some(result),
            )
        }
        WordsCommands::Train {
            id,
            training,
            result,
        } => {
            let word = client
                .post(
                    &format!("/api/v1/vocab/{}/training", id),
                    &json!({ "training": training, "result": result }),
                )
                .await?;
            output_value(output_format, &word, |word| println!("{}", format_word_line(word)))
        }
    }
}

/// Accepts either a batch array or a single update object
fn parse_batch(input: &str) -> anyhow::Result<Vec<WordUpdate>> {
    let value: Value = serde_json::from_str(input)?;
    let batch = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => anyhow::bail!("Expected a JSON array of word updates"),
    };
    Ok(batch)
}

fn parse_training(s: &str) -> Result<Training, String> {
    Training::ALL
        .into_iter()
        .find(|training| training.as_str() == s.trim())
        .ok_or_else(|| format!("unknown training '{}'", s))
}

fn parse_result(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "pass" | "passed" | "true" | "ok" => Ok(true),
        "fail" | "failed" | "false" => Ok(false),
        other => Err(format!("expected pass or fail, got '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_from_array_or_object() {
        let batch = parse_batch(r#"[{"word_id": 1, "updates": [{"field": "cards", "value": true}]}]"#)
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].word_id, 1);

        let single = parse_batch(r#"{"id": 4, "updates": []}"#).unwrap();
        assert_eq!(single[0].word_id, 4);

        assert!(parse_batch("42").is_err());
    }

    #[test]
    fn training_and_result_parsing() {
        assert_eq!(parse_training("word_audio"), Ok(Training::WordAudio));
        assert!(parse_training("flashcards").is_err());
        assert_eq!(parse_result("PASS"), Ok(true));
        assert_eq!(parse_result("fail"), Ok(false));
        assert!(parse_result("maybe").is_err());
    }
}
