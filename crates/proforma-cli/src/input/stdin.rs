use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Attempt to read a request from stdin if data is being piped. JSON is tried
/// first, then YAML. Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) if trimmed.starts_with('{') => Err(json_err.into()),
        Err(_) => Ok(Some(serde_yaml::from_str(trimmed)?)),
    }
}

