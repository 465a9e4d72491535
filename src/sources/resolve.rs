use tracing::{debug, warn};

use super::traits::ChannelLookup;

/// Whether `identifier` already is a canonical `UC…` channel id
pub fn is_channel_id(identifier: &str) -> bool {
    identifier.len() == 24
        && identifier.starts_with("UC")
        && identifier[2..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Resolve a user-supplied identifier to a canonical channel id.
///
/// Strategies run in order: direct id, handle (only for `@name`), username,
/// then name search. The first hit wins; a failing strategy is logged and
/// the next one is tried.
pub async fn resolve_channel_id<L>(lookup: &L, identifier: &str) -> Option<String>
where
    L: ChannelLookup + ?Sized,
{
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }

    if is_channel_id(identifier) {
        return Some(identifier.to_string());
    }

    if let Some(handle) = identifier.strip_prefix('@') {
        match lookup.by_handle(handle).await {
            Ok(Some(id)) => return Some(id),
            Ok(None) => debug!("No channel for handle @{}", handle),
            Err(e) => warn!("Handle lookup failed for @{}: {}", handle, e),
        }
    }

    match lookup.by_username(identifier).await {
        Ok(Some(id)) => return Some(id),
        Ok(None) => debug!("No channel for username {}", identifier),
        Err(e) => warn!("Username lookup failed for {}: {}", identifier, e),
    }

    match lookup.search_by_name(identifier).await {
        Ok(Some(id)) => Some(id),
        Ok(None) => {
            warn!("Could not resolve channel identifier '{}'", identifier);
            None
        }
        Err(e) => {
            warn!("Channel search failed for {}: {}", identifier, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::sources::traits::MockChannelLookup;
    use mockall::predicate::eq;

    const ID: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

    #[test]
    fn test_is_channel_id() {
        assert!(is_channel_id(ID));
        assert!(!is_channel_id("UC_short"));
        assert!(!is_channel_id("@GoogleDevelopers"));
        assert!(!is_channel_id("UC_x5XG1OV2P6uZZ5FSM9Tt!"));
    }

    #[tokio::test]
    async fn test_direct_id_skips_lookups() {
        let lookup = MockChannelLookup::new();
        assert_eq!(resolve_channel_id(&lookup, ID).await.as_deref(), Some(ID));
    }

    #[tokio::test]
    async fn test_handle_hit_stops_resolution() {
        let mut lookup = MockChannelLookup::new();
        lookup
            .expect_by_handle()
            .with(eq("GoogleDevelopers"))
            .times(1)
            .returning(|_| Ok(Some(ID.to_string())));
        lookup.expect_by_username().never();
        lookup.expect_search_by_name().never();

        let resolved = resolve_channel_id(&lookup, "@GoogleDevelopers").await;
        assert_eq!(resolved.as_deref(), Some(ID));
    }

    #[tokio::test]
    async fn test_plain_name_skips_handle_lookup() {
        let mut lookup = MockChannelLookup::new();
        lookup.expect_by_handle().never();
        lookup
            .expect_by_username()
            .with(eq("GoogleDevelopers"))
            .times(1)
            .returning(|_| Ok(Some(ID.to_string())));
        lookup.expect_search_by_name().never();

        assert_eq!(
            resolve_channel_id(&lookup, "GoogleDevelopers").await.as_deref(),
            Some(ID)
        );
    }

    #[tokio::test]
    async fn test_errors_fall_through_to_search() {
        let mut lookup = MockChannelLookup::new();
        lookup.expect_by_handle().times(1).returning(|_| {
            Err(SourceError::Http {
                status: 500,
                message: "backend".to_string(),
            })
        });
        lookup.expect_by_username().times(1).returning(|_| Ok(None));
        lookup
            .expect_search_by_name()
            .with(eq("@someone"))
            .times(1)
            .returning(|_| Ok(Some(ID.to_string())));

        assert_eq!(resolve_channel_id(&lookup, "@someone").await.as_deref(), Some(ID));
    }

    #[tokio::test]
    async fn test_all_strategies_failing_resolves_to_none() {
        let mut lookup = MockChannelLookup::new();
        lookup.expect_by_username().returning(|_| Ok(None));
        lookup
            .expect_search_by_name()
            .returning(|_| Err(SourceError::request_failed("search", "timeout")));

        assert_eq!(resolve_channel_id(&lookup, "nobody").await, None);
        assert_eq!(resolve_channel_id(&lookup, "   ").await, None);
    }
}
