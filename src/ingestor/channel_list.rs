use std::path::Path;
use tracing::{debug, error};

/// Parse the operator's channel list: one identifier per line, blank lines and
/// `#` comments ignored.
pub fn parse_channel_identifiers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read the channel list file; a missing or unreadable file yields no channels.
pub async fn read_channel_identifiers(path: &Path) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let identifiers = parse_channel_identifiers(&contents);
            debug!("Read {} channel identifiers from {}", identifiers.len(), path.display());
            identifiers
        }
        Err(e) => {
            error!("Cannot read channel list {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
