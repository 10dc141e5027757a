//! Search result → stored entity normalization.
//!
//! All fallback values are applied here, once; nothing downstream
//! re-derives defaults from a raw provider record.

use chrono::{DateTime, Utc};
use gametrack_rawg::SearchResult;

use crate::types::GameEntity;

/// Description stored when the provider has none.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Image stored when the provider has no cover art.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

/// Platform label stored when the provider sent no platform list.
pub const UNKNOWN_PLATFORM: &str = "Unknown";

/// Fallback values for fields a search result may lack.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub description: String,
    pub image: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            description: NO_DESCRIPTION.to_string(),
            image: PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

/// Converts a search result into an unsaved entity stamped with the current time.
pub fn normalize(result: &SearchResult, defaults: &Defaults) -> GameEntity {
    normalize_at(result, defaults, Utc::now())
}

/// Like [`normalize`], with an explicit creation timestamp.
pub fn normalize_at(result: &SearchResult, defaults: &Defaults, now: DateTime<Utc>) -> GameEntity {
    let platform = match result.platform_names() {
        Some(names) => names.join(", "),
        None => UNKNOWN_PLATFORM.to_string(),
    };

    GameEntity {
        id: None,
        title: result.name.clone(),
        platform,
        description: result
            .description_raw
            .clone()
            .unwrap_or_else(|| defaults.description.clone()),
        image: result
            .background_image
            .clone()
            .unwrap_or_else(|| defaults.image.clone()),
        external_id: Some(result.id),
        added_date: now,
        rating: result.rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gametrack_rawg::{Platform, PlatformEntry};

    fn entry(name: &str) -> PlatformEntry {
        PlatformEntry {
            platform: Platform {
                id: 0,
                name: name.into(),
            },
        }
    }

    fn bare(id: u64, name: &str) -> SearchResult {
        SearchResult {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_platforms_is_unknown() {
        let game = normalize(&bare(1, "A"), &Defaults::default());
        assert_eq!(game.platform, "Unknown");
    }

    #[test]
    fn empty_platform_list_joins_to_empty() {
        let mut result = bare(1, "A");
        result.platforms = Some(vec![]);
        let game = normalize(&result, &Defaults::default());
        assert_eq!(game.platform, "");
    }

    #[test]
    fn platforms_joined_in_order() {
        let mut result = bare(1, "A");
        result.platforms = Some(vec![entry("PC"), entry("PlayStation 4"), entry("Nintendo Switch")]);
        let game = normalize(&result, &Defaults::default());
        assert_eq!(game.platform, "PC, PlayStation 4, Nintendo Switch");
    }

    #[test]
    fn missing_description_uses_sentinel() {
        let game = normalize(&bare(1, "A"), &Defaults::default());
        assert_eq!(game.description, "No description available.");
    }

    #[test]
    fn missing_image_uses_placeholder() {
        let game = normalize(&bare(1, "A"), &Defaults::default());
        assert_eq!(game.image, PLACEHOLDER_IMAGE);

        let custom = Defaults {
            image: "https://cdn.example/none.png".into(),
            ..Defaults::default()
        };
        assert_eq!(normalize(&bare(1, "A"), &custom).image, "https://cdn.example/none.png");
    }

    #[test]
    fn provider_values_win_over_defaults() {
        let mut result = bare(9, "B");
        result.description_raw = Some("Real text".into());
        result.background_image = Some("https://img/b.jpg".into());
        let game = normalize(&result, &Defaults::default());
        assert_eq!(game.description, "Real text");
        assert_eq!(game.image, "https://img/b.jpg");
    }

    #[test]
    fn foo_scenario_fields() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let mut result = bare(42, "Foo");
        result.rating = Some(4.5);

        let game = normalize_at(&result, &Defaults::default(), now);
        assert_eq!(game.id, None);
        assert_eq!(game.title, "Foo");
        assert_eq!(game.platform, "Unknown");
        assert_eq!(game.rating, Some(4.5));
        assert_eq!(game.external_id, Some(42));
        assert_eq!(game.added_date, now);
    }

    #[test]
    fn absent_rating_stays_absent() {
        let game = normalize(&bare(3, "C"), &Defaults::default());
        assert_eq!(game.rating, None);
    }
}
