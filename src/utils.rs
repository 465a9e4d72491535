//! Utility functions for tubestats
//!
//! - `utils::datetime` for timestamp parsing and storage formatting
//! - `utils::time` for the time zone that decides what "today" is

pub mod datetime;
pub mod time;

/// Sanitize a base URL by removing trailing slashes and ensuring proper format
pub fn sanitize_base_url(base_url: &str) -> String {
    let mut url = base_url.trim().to_string();

    // Remove trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Ensure we have a scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        url = format!("https://{}", url);
    }

    url
}

/// Shorten a title for chart labels, appending an ellipsis when cut
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let cut: String = title.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

/// Public watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            sanitize_base_url("https://www.googleapis.com/youtube/v3/"),
            "https://www.googleapis.com/youtube/v3"
        );
        assert_eq!(sanitize_base_url("localhost:9000//"), "https://localhost:9000");
        assert_eq!(sanitize_base_url("http://127.0.0.1:8080"), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("short", 50), "short");
        let long = "a".repeat(60);
        let truncated = truncate_title(&long, 50);
        assert_eq!(truncated.len(), 53);
        assert!(truncated.ends_with("..."));
        // multi-byte characters are counted, not bytes
        assert_eq!(truncate_title("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("dQw4w9WgXcQ"), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
