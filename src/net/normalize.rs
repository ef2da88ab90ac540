/// Image source normalization
///
/// Catalog payloads sometimes carry escaped slashes and wiki media links
/// that point at a revision page instead of the asset itself. Normalizing
/// happens once, when a record is ingested; only the result is stored, so
/// the prefetch and the renderer always use the same URL.

use url::Url;

/// Wiki media host whose URLs carry a `/revision/...` suffix
pub const WIKI_MEDIA_HOST: &str = "static.wikia.nocookie.net";

/// Start of the revision suffix that gets cut off
const REVISION_SEGMENT: &str = "/revision/";

/// Normalize a raw image field value
///
/// Malformed input (empty, relative, unparsable or non-http) returns
/// `placeholder` instead of an error.
pub fn normalize_image_url(raw: &str, placeholder: &str) -> String {
    let cleaned: String = raw.chars().filter(|&c| c != '\\').collect();
    let cleaned = cleaned.trim();

    let parsed = match Url::parse(cleaned) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
        _ => return placeholder.to_string(),
    };

    let on_wiki_host = parsed
        .host_str()
        .map(|host| host.eq_ignore_ascii_case(WIKI_MEDIA_HOST))
        .unwrap_or(false);

    if on_wiki_host {
        if let Some(index) = cleaned.find(REVISION_SEGMENT) {
            return cleaned[..index].to_string();
        }
    }

    cleaned.to_string()
}
