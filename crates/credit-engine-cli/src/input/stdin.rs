use serde_json::Value;
use std::io::{self, Read};

/// Piped stdin as text. Returns None if stdin is a TTY or the pipe is empty.
pub fn read_stdin_text() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(buffer))
}

/// Piped stdin parsed as JSON, falling back to YAML.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let Some(buffer) = read_stdin_text()? else {
        return Ok(None);
    };
    Ok(Some(parse_document(&buffer)?))
}

fn parse_document(text: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(trimmed)
            .map_err(|_| format!("stdin is neither JSON nor YAML: {json_err}").into()),
    }
}
