//! Recursive redaction of sensitive metadata fields
//!
//! Masking only ever rewrites scalar leaves. Arrays and objects are always
//! walked, never replaced, even when their key looks sensitive, so the shape
//! of a masked record matches its input.

use super::config::{PipelineConfig, DEFAULT_MASK_FIELDS, DEFAULT_MASK_REPLACEMENT};
use super::metadata::{LoggerMetadata, MetaValue};
use std::borrow::Cow;

/// Nesting depth past which subtrees are passed through untouched
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Field masker
///
/// Keys match a pattern when the lower-cased key contains the lower-cased
/// pattern, so `"token"` also masks `"accessToken"`.
///
/// # Example
///
/// ```
/// use structured_log_pipeline::{LoggerMetadata, Masker};
///
/// let masker = Masker::default();
/// let meta = LoggerMetadata::new()
///     .with_field("user", "alice")
///     .with_field("accessToken", "abc123");
///
/// let masked = masker.mask_metadata(&meta);
/// assert_eq!(masked.get("accessToken").and_then(|v| v.as_str()), Some("[REDACTED]"));
/// assert_eq!(masked.get("user").and_then(|v| v.as_str()), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Masker {
    enabled: bool,
    patterns: Vec<String>,
    replacement: String,
    max_depth: usize,
}

impl Masker {
    pub fn new<I, S>(patterns: I, replacement: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            enabled: true,
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
            replacement: replacement.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut masker = Self::new(&config.mask_fields, config.mask_pattern.clone());
        masker.enabled = config.mask_enabled;
        masker
    }

    /// A masker that returns every input as-is
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Whether `key` matches any configured pattern
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.patterns.iter().any(|pattern| key.contains(pattern.as_str()))
    }

    /// Mask a single value.
    ///
    /// When masking is disabled the input is borrowed back unchanged.
    pub fn mask<'a>(&self, value: &'a MetaValue) -> Cow<'a, MetaValue> {
        if !self.enabled {
            return Cow::Borrowed(value);
        }
        Cow::Owned(self.mask_value(value, 0))
    }

    /// Mask every field of a metadata map
    pub fn mask_metadata<'a>(&self, metadata: &'a LoggerMetadata) -> Cow<'a, LoggerMetadata> {
        if !self.enabled {
            return Cow::Borrowed(metadata);
        }
        Cow::Owned(self.mask_object(metadata, 0))
    }

    fn mask_value(&self, value: &MetaValue, depth: usize) -> MetaValue {
        if depth > self.max_depth {
            return value.clone();
        }
        match value {
            MetaValue::Array(items) => MetaValue::Array(
                items
                    .iter()
                    .map(|item| self.mask_value(item, depth + 1))
                    .collect(),
            ),
            MetaValue::Object(map) => MetaValue::Object(self.mask_object(map, depth)),
            scalar => scalar.clone(),
        }
    }

    fn mask_object(&self, map: &LoggerMetadata, depth: usize) -> LoggerMetadata {
        map.iter()
            .map(|(key, value)| {
                let masked = if value.is_container() {
                    self.mask_value(value, depth + 1)
                } else if self.is_sensitive_key(key) {
                    MetaValue::String(self.replacement.clone())
                } else {
                    value.clone()
                };
                (key.clone(), masked)
            })
            .collect()
    }
}

impl Default for Masker {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_FIELDS, DEFAULT_MASK_REPLACEMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: serde_json::Value) -> LoggerMetadata {
        LoggerMetadata::from_json_value(value).unwrap()
    }

    #[test]
    fn test_masks_sensitive_scalars() {
        let masker = Masker::default();
        let input = meta(json!({
            "username": "alice",
            "password": "hunter2",
            "accessToken": "abc",
            "retries": 3
        }));

        let masked = masker.mask_metadata(&input);

        assert_eq!(
            masked.to_json_value(),
            json!({
                "username": "alice",
                "password": "[REDACTED]",
                "accessToken": "[REDACTED]",
                "retries": 3
            })
        );
    }

    #[test]
    fn test_case_insensitive_substring_match() {
        let masker = Masker::new(["token"], "***");
        assert!(masker.is_sensitive_key("X-Refresh-TOKEN"));
        assert!(!masker.is_sensitive_key("username"));
    }

    #[test]
    fn test_containers_are_walked_not_replaced() {
        let masker = Masker::default();
        let input = meta(json!({
            "credentials": {"user": "bob", "secret": "s3"},
            "tokens": [{"token": "a"}, "plain"],
        }));

        let masked = masker.mask_metadata(&input).into_owned();

        assert_eq!(
            masked.to_json_value(),
            json!({
                "credentials": {"user": "bob", "secret": "[REDACTED]"},
                "tokens": [{"token": "[REDACTED]"}, "plain"],
            })
        );
    }

    #[test]
    fn test_null_under_sensitive_key_is_replaced() {
        let masker = Masker::default();
        let input = meta(json!({"password": null}));
        let masked = masker.mask_metadata(&input);
        assert_eq!(masked.to_json_value(), json!({"password": "[REDACTED]"}));
    }

    #[test]
    fn test_top_level_scalar_passes_through() {
        let masker = Masker::default();
        let value = MetaValue::from("password");
        assert_eq!(masker.mask(&value).into_owned(), value);
    }

    #[test]
    fn test_disabled_masker_borrows_input() {
        let masker = Masker::disabled();
        let input = meta(json!({"password": "hunter2"}));

        let masked = masker.mask_metadata(&input);

        assert!(matches!(masked, Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*masked, &input));
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig::default()
            .with_mask_fields(["email"])
            .with_mask_pattern("<hidden>");
        let masker = Masker::from_config(&config);

        let input = meta(json!({"email": "a@b.c", "password": "x"}));
        let masked = masker.mask_metadata(&input);
        assert_eq!(
            masked.to_json_value(),
            json!({"email": "<hidden>", "password": "x"})
        );

        let masker = Masker::from_config(&config.with_masking(false));
        assert!(!masker.is_enabled());
    }

    #[test]
    fn test_depth_cap_leaves_deep_subtree_untouched() {
        let masker = Masker::default().with_max_depth(2);

        let mut deep = json!({"password": "deep"});
        for _ in 0..4 {
            deep = json!({"nested": deep});
        }
        let input = meta(json!({"password": "top", "child": deep.clone()}));

        let masked = masker.mask_metadata(&input).into_owned().to_json_value();

        assert_eq!(masked["password"], json!("[REDACTED]"));
        assert_eq!(masked["child"], deep);
    }

    #[test]
    fn test_fifteen_levels_do_not_overflow() {
        let masker = Masker::default();
        let mut value = json!({"secret": "bottom"});
        for _ in 0..15 {
            value = json!({"level": value, "apiKey": "k"});
        }

        let input = meta(value);
        let masked = masker.mask_metadata(&input);

        assert_eq!(masked.len(), input.len());
        assert_eq!(
            masked.get("apiKey").and_then(MetaValue::as_str),
            Some("[REDACTED]")
        );
    }
}
