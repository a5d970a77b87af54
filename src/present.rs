use crate::content::inline;
use crate::ingest::{ImageRef, IngestedImage};

/// Rewrite a persisted image reference into its display-ready form.
/// Inline data takes precedence over a stored path when a transitional row
/// carries both; a row with neither yields `None` and the caller renders a
/// placeholder. Idempotent: normalizing already-normalized output is a
/// no-op.
pub fn display_image(
    inline_encoded: Option<&str>,
    stored_path: Option<&str>,
    public_prefix: &str,
) -> Option<String> {
    if let Some(value) = inline_encoded.map(str::trim).filter(|v| !v.is_empty()) {
        return Some(inline::ensure_marker(value));
    }
    stored_path
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|path| display_path(path, public_prefix))
}

/// Prefix a stored relative path with the public content root. Absolute
/// URLs and already-prefixed paths pass through unchanged.
pub fn display_path(path: &str, public_prefix: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let prefix = public_prefix.trim_end_matches('/');
    let with_slash = format!("{prefix}/");
    if path.starts_with(&with_slash) {
        return path.to_string();
    }
    format!("{with_slash}{}", path.trim_start_matches('/'))
}

pub fn display_ref(image: &ImageRef, public_prefix: &str) -> String {
    match image {
        ImageRef::Inline(value) => inline::ensure_marker(value),
        ImageRef::Files { full, .. } => display_path(full, public_prefix),
    }
}

/// Display form of a fresh ingestion result: the primary representation.
pub fn display_ingested(image: &IngestedImage, public_prefix: &str) -> String {
    display_ref(&image.primary, public_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/static";

    #[test]
    fn inline_takes_precedence_over_path() {
        let out = display_image(
            Some("data:image/jpeg;base64,aGVsbG8="),
            Some("uploads/cats/a.jpg"),
            PREFIX,
        )
        .unwrap();
        assert!(out.starts_with("data:image/"));
    }

    #[test]
    fn raw_base64_gains_the_marker() {
        let out = display_image(Some("aGVsbG8="), None, PREFIX).unwrap();
        assert_eq!(out, "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn relative_path_gains_the_public_prefix() {
        let out = display_image(None, Some("uploads/cats/a.jpg"), PREFIX).unwrap();
        assert_eq!(out, "/static/uploads/cats/a.jpg");
    }

    #[test]
    fn absolute_url_passes_through() {
        for url in [
            "http://example.com/cat.jpg",
            "https://example.com/cat.jpg",
        ] {
            assert_eq!(display_image(None, Some(url), PREFIX).unwrap(), url);
        }
    }

    #[test]
    fn neither_reference_yields_none() {
        assert_eq!(display_image(None, None, PREFIX), None);
        assert_eq!(display_image(Some("  "), Some(""), PREFIX), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            (Some("aGVsbG8="), None),
            (Some("data:image/png;base64,aGVsbG8="), None),
            (None, Some("uploads/cats/a.jpg")),
            (None, Some("/static/uploads/cats/a.jpg")),
            (None, Some("https://example.com/cat.jpg")),
        ];
        for (inline_encoded, stored_path) in inputs {
            let once = display_image(inline_encoded, stored_path, PREFIX).unwrap();
            // Feed the normalized output back through the slot it came from.
            let again = if once.starts_with("data:image/") {
                display_image(Some(&once), None, PREFIX).unwrap()
            } else {
                display_image(None, Some(&once), PREFIX).unwrap()
            };
            assert_eq!(again, once);
        }
    }

    #[test]
    fn display_ref_covers_both_variants() {
        let inline_ref = ImageRef::Inline("aGVsbG8=".to_string());
        assert_eq!(
            display_ref(&inline_ref, PREFIX),
            "data:image/jpeg;base64,aGVsbG8="
        );

        let file_ref = ImageRef::Files {
            full: "uploads/cats/a_full.jpg".to_string(),
            thumbnail: "uploads/thumbnails/a_thumb.jpg".to_string(),
        };
        assert_eq!(
            display_ref(&file_ref, PREFIX),
            "/static/uploads/cats/a_full.jpg"
        );
    }
}
