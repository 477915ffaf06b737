pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Request from `--input`, else from piped stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_request(path);
    }
    stdin::read_stdin()?.ok_or_else(|| format!("--input <file> or stdin required for {what}").into())
}
