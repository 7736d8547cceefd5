//! Canonical cache keys for update-check requests.
//!
//! Two requests that can only differ in client identity or post-cache
//! selection inputs must map to the same distributed-cache entry, so the key
//! strips those fields, canonicalizes the app version, and pins a schema
//! token that invalidates every entry when the cached shape changes.

use crate::version::normalize_app_version;
use url::form_urlencoded;

/// Version token embedded in every response-cache key. Bumping it invalidates
/// all existing entries at once.
pub const CACHE_SCHEMA_VERSION: &str = "v2";

/// Query fields that never influence the cacheable response body: client
/// identity and the inputs of post-cache rollout/diff selection.
const DROPPED_FIELDS: &[&str] = &[
    "clientUniqueId",
    "client_unique_id",
    "beta",
    "packageHash",
    "package_hash",
    "label",
];

/// Build the canonical cache key for an update-check request URL
/// (`path?query`). Pure function of the cache-relevant inputs.
pub fn acquisition_cache_key(original_url: &str, schema: &str) -> String {
    let (path, query) = original_url
        .split_once('?')
        .unwrap_or((original_url, ""));

    let mut fields: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !DROPPED_FIELDS.contains(&key.as_ref()))
        .map(|(key, value)| {
            let value = if key == "appVersion" || key == "app_version" {
                normalize_app_version(&value)
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    fields.push(("__cacheSchema".to_string(), schema.to_string()));
    fields.sort();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &fields {
        serializer.append_pair(key, value);
    }
    format!("{path}?{}", serializer.finish())
}
