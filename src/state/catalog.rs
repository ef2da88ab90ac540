/// Per-catalog configuration
///
/// Heroes, skins, eliminations and battle emotes all run the same
/// load / track / filter / render pipeline. The only thing that differs
/// between them is described here: where the JSON lives, which fields
/// carry the identity, name, images and filters, and what the row
/// action does.

use serde::{Deserialize, Serialize};
use std::fmt;

const SOURCE_BASE: &str = "https://raw.githubusercontent.com/AgungDevlop/InjectorMl";

/// Direct link opened by the hero "View" action
const HERO_DIRECT_LINK: &str = "https://obqj2.com/4/9577995";

/// The catalog types the application knows how to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind {
    Heroes,
    Skins,
    Eliminations,
    BattleEmotes,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 4] = [
        CatalogKind::Heroes,
        CatalogKind::Skins,
        CatalogKind::Eliminations,
        CatalogKind::BattleEmotes,
    ];

    /// Short label for navigation
    pub fn label(self) -> &'static str {
        match self {
            CatalogKind::Heroes => "Heroes",
            CatalogKind::Skins => "Skins",
            CatalogKind::Eliminations => "Eliminations",
            CatalogKind::BattleEmotes => "Battle Emotes",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the action control of a row does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionSpec {
    /// Open the URL stored in `field` of the item
    OpenItemUrl { label: String, field: String },
    /// Remember the item's display name as the selection key,
    /// open `link`, then switch to the `navigate_to` catalog
    SelectAndOpen {
        label: String,
        link: String,
        navigate_to: CatalogKind,
    },
}

impl ActionSpec {
    pub fn label(&self) -> &str {
        match self {
            ActionSpec::OpenItemUrl { label, .. } | ActionSpec::SelectAndOpen { label, .. } => {
                label
            }
        }
    }
}

/// Rewrites a row title when `field == equals`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRule {
    pub field: String,
    pub equals: String,
    pub prefix: String,
}

/// Everything that distinguishes one catalog from another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSchema {
    pub kind: CatalogKind,
    /// Page heading, e.g. "View Heroes"
    pub title: String,
    /// Plural noun used in messages, e.g. "heroes"
    pub noun: String,
    pub source_url: String,
    pub id_field: String,
    pub name_field: String,
    /// Fields matched by the search box; empty hides the search box
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub search_placeholder: String,
    /// Image fields in render order
    pub slot_fields: Vec<String>,
    #[serde(default)]
    pub category_field: Option<String>,
    #[serde(default)]
    pub category_options: Vec<String>,
    /// Field compared against the cross-view selection key
    #[serde(default)]
    pub link_field: Option<String>,
    pub placeholder_image: String,
    #[serde(default)]
    pub title_rule: Option<TitleRule>,
    pub action: ActionSpec,
}

impl CatalogSchema {
    /// Built-in schema for a catalog kind
    pub fn builtin(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Heroes => Self {
                kind,
                title: "View Heroes".to_string(),
                noun: "heroes".to_string(),
                source_url: format!("{}/refs/heads/main/Hero.json", SOURCE_BASE),
                id_field: "her".to_string(),
                name_field: "her".to_string(),
                search_fields: vec!["her".to_string(), "roll".to_string()],
                search_placeholder: "Search by Hero or Role".to_string(),
                slot_fields: vec!["URL".to_string()],
                category_field: Some("roll".to_string()),
                category_options: ["Fighter", "Tank", "Mage", "Marksman", "Assassin", "Support"]
                    .iter()
                    .map(|role| role.to_string())
                    .collect(),
                link_field: None,
                placeholder_image: "https://via.placeholder.com/50?text=Hero".to_string(),
                title_rule: None,
                action: ActionSpec::SelectAndOpen {
                    label: "View".to_string(),
                    link: HERO_DIRECT_LINK.to_string(),
                    navigate_to: CatalogKind::Skins,
                },
            },
            CatalogKind::Skins => Self {
                kind,
                title: "View Skins".to_string(),
                noun: "skins".to_string(),
                source_url: format!("{}/main/Skin.json", SOURCE_BASE),
                id_field: "id".to_string(),
                name_field: "name".to_string(),
                search_fields: Vec::new(),
                search_placeholder: String::new(),
                slot_fields: vec!["img1".to_string(), "img2".to_string()],
                category_field: None,
                category_options: Vec::new(),
                link_field: Some("hero".to_string()),
                placeholder_image: "https://via.placeholder.com/40?text=Skin".to_string(),
                title_rule: Some(TitleRule {
                    field: "type".to_string(),
                    equals: "Backup".to_string(),
                    prefix: "Remove ".to_string(),
                }),
                action: ActionSpec::OpenItemUrl {
                    label: "Inject".to_string(),
                    field: "url".to_string(),
                },
            },
            CatalogKind::Eliminations => Self::download_catalog(
                kind,
                "View Eliminations",
                "eliminations",
                "Elimination.json",
                "Search by Elimination Name...",
            ),
            CatalogKind::BattleEmotes => Self::download_catalog(
                kind,
                "View Battle Emotes",
                "battle emotes",
                "BattleEmote.json",
                "Search by Battle Emote Name...",
            ),
        }
    }

    /// Eliminations and battle emotes share one shape
    fn download_catalog(
        kind: CatalogKind,
        title: &str,
        noun: &str,
        file: &str,
        search_placeholder: &str,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            noun: noun.to_string(),
            source_url: format!("{}/main/{}", SOURCE_BASE, file),
            id_field: "id".to_string(),
            name_field: "name".to_string(),
            search_fields: vec!["name".to_string()],
            search_placeholder: search_placeholder.to_string(),
            slot_fields: vec!["img1".to_string(), "img2".to_string()],
            category_field: None,
            category_options: Vec::new(),
            link_field: None,
            placeholder_image: "https://via.placeholder.com/40?text=Item".to_string(),
            title_rule: None,
            action: ActionSpec::OpenItemUrl {
                label: "Download".to_string(),
                field: "url".to_string(),
            },
        }
    }

    /// Resource name used in validation messages (last path segment)
    pub fn resource_name(&self) -> String {
        url::Url::parse(&self.source_url)
            .ok()
            .and_then(|parsed| {
                parsed
                    .path_segments()
                    .and_then(|segments| segments.last().map(str::to_string))
            })
            .filter(|segment| !segment.is_empty())
            .unwrap_or_else(|| self.source_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_match_kind() {
        for kind in CatalogKind::ALL {
            assert_eq!(CatalogSchema::builtin(kind).kind, kind);
        }
    }

    #[test]
    fn test_resource_name() {
        let schema = CatalogSchema::builtin(CatalogKind::Skins);
        assert_eq!(schema.resource_name(), "Skin.json");
    }

    #[test]
    fn test_hero_action_navigates_to_skins() {
        let schema = CatalogSchema::builtin(CatalogKind::Heroes);
        match schema.action {
            ActionSpec::SelectAndOpen { navigate_to, .. } => {
                assert_eq!(navigate_to, CatalogKind::Skins)
            }
            other => panic!("unexpected hero action: {:?}", other),
        }
    }

    #[test]
    fn test_schema_json_uses_defaults_for_optional_fields() {
        let json = r#"{
            "kind": "Eliminations",
            "title": "View Eliminations",
            "noun": "eliminations",
            "source_url": "https://example.com/e.json",
            "id_field": "id",
            "name_field": "name",
            "slot_fields": ["img1"],
            "placeholder_image": "https://example.com/p.png",
            "action": { "type": "OpenItemUrl", "label": "Download", "field": "url" }
        }"#;
        let schema: CatalogSchema = serde_json::from_str(json).unwrap();
        assert!(schema.search_fields.is_empty());
        assert!(schema.category_field.is_none());
        assert_eq!(schema.action.label(), "Download");
    }
}
