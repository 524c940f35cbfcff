use crate::error::{RecError, RecResult};
use crate::models::*;

pub const MAX_USER_ID_LEN: usize = 128;
pub const MAX_ID_LEN: usize = 128;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_TAGS: usize = 100;
/// Largest second count the stores can persist.
pub const MAX_SECONDS: u32 = i32::MAX as u32;

fn invalid(message: impl Into<String>) -> RecError {
    RecError::InvalidInput(message.into())
}

pub fn validate_user_id(user_id: &str) -> RecResult<()> {
    if user_id.trim().is_empty() {
        return Err(invalid("user_id cannot be empty"));
    }

    if user_id.len() > MAX_USER_ID_LEN {
        return Err(invalid(format!(
            "user_id too long (max {} characters)",
            MAX_USER_ID_LEN
        )));
    }

    Ok(())
}

/// Resolves the requested `k` against the configured default and ceiling.
pub fn validate_k(k: Option<usize>, default_k: usize, max_k: usize) -> RecResult<usize> {
    let k = k.unwrap_or(default_k);
    if k == 0 {
        return Err(invalid("k must be greater than 0"));
    }

    if k > max_k {
        return Err(invalid(format!("k too large (max {})", max_k)));
    }

    Ok(k)
}

fn validate_id(field: &str, value: &str) -> RecResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{} cannot be empty", field)));
    }

    if value.len() > MAX_ID_LEN {
        return Err(invalid(format!(
            "{} too long (max {} characters)",
            field, MAX_ID_LEN
        )));
    }

    Ok(())
}

pub fn validate_interaction(event: &InteractionEvent) -> RecResult<()> {
    validate_user_id(&event.user_id)?;
    validate_id("video_id", &event.video_id)?;

    // Allow a little clock skew from clients
    let max_future = chrono::Utc::now() + chrono::Duration::hours(1);
    if event.timestamp > max_future {
        return Err(invalid("timestamp cannot be more than 1 hour in the future"));
    }

    if event.watch_seconds.is_some() && event.event_type != EventType::Watch {
        return Err(invalid(format!(
            "watch_seconds is only valid for watch events, got {}",
            event.event_type
        )));
    }

    if event.watch_seconds.is_some_and(|s| s > MAX_SECONDS) {
        return Err(invalid(format!("watch_seconds too large (max {})", MAX_SECONDS)));
    }

    Ok(())
}

pub fn validate_catalog_item(item: &CatalogItem) -> RecResult<()> {
    validate_id("video_id", &item.id)?;
    validate_id("channel_id", &item.channel_id)?;

    if item.title.len() > MAX_TITLE_LEN {
        return Err(invalid(format!(
            "title too long (max {} characters)",
            MAX_TITLE_LEN
        )));
    }

    if item.tags.len() > MAX_TAGS {
        return Err(invalid(format!("too many tags (max {})", MAX_TAGS)));
    }

    if item.tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(invalid("tags cannot be empty strings"));
    }

    if item.duration_seconds.is_some_and(|d| d > MAX_SECONDS) {
        return Err(invalid(format!("duration_seconds too large (max {})", MAX_SECONDS)));
    }

    Ok(())
}

pub fn validate_channel(channel: &Channel) -> RecResult<()> {
    validate_id("channel_id", &channel.channel_id)?;

    if channel.title.trim().is_empty() {
        return Err(invalid("channel title cannot be empty"));
    }

    if channel.title.len() > MAX_TITLE_LEN {
        return Err(invalid(format!(
            "channel title too long (max {} characters)",
            MAX_TITLE_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("AbhiKanani07").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id(&"x".repeat(129)).is_err());
        assert!(validate_user_id(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn test_validate_k() {
        assert_eq!(validate_k(None, 20, 100).unwrap(), 20);
        assert_eq!(validate_k(Some(100), 20, 100).unwrap(), 100);
        assert!(matches!(validate_k(Some(0), 20, 100), Err(RecError::InvalidInput(_))));
        assert!(validate_k(Some(101), 20, 100).is_err());
    }

    #[test]
    fn test_validate_interaction() {
        let event = InteractionEvent::watch("u1", "v1", 120);
        assert!(validate_interaction(&event).is_ok());

        let future = InteractionEvent::new("u1", "v1", EventType::Click)
            .with_timestamp(chrono::Utc::now() + chrono::Duration::days(2));
        assert!(validate_interaction(&future).is_err());

        let odd = InteractionEvent::new("u1", "v1", EventType::Like).with_watch_seconds(30);
        assert!(validate_interaction(&odd).is_err());

        let no_video = InteractionEvent::new("u1", "", EventType::Like);
        assert!(validate_interaction(&no_video).is_err());
    }

    #[test]
    fn test_validate_catalog_item_and_channel() {
        let item = CatalogItem::new("v1", "c1", "Title").with_tags(vec!["rust".into()]);
        assert!(validate_catalog_item(&item).is_ok());

        let bad_tags = CatalogItem::new("v1", "c1", "Title").with_tags(vec![" ".into()]);
        assert!(validate_catalog_item(&bad_tags).is_err());

        assert!(validate_channel(&Channel::new("c1", "Systems")).is_ok());
        assert!(validate_channel(&Channel::new("c1", "")).is_err());
    }

    #[test]
    fn test_second_counts_must_fit_the_integer_column() {
        let watch = InteractionEvent::watch("u1", "v1", MAX_SECONDS);
        assert!(validate_interaction(&watch).is_ok());
        let overflow = InteractionEvent::watch("u1", "v1", u32::MAX);
        assert!(matches!(
            validate_interaction(&overflow),
            Err(RecError::InvalidInput(_))
        ));

        let long = CatalogItem::new("v1", "c1", "Title").with_duration(u32::MAX);
        assert!(validate_catalog_item(&long).is_err());
        let fits = CatalogItem::new("v1", "c1", "Title").with_duration(MAX_SECONDS);
        assert!(validate_catalog_item(&fits).is_ok());
    }
}
