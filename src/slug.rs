//! URL-safe identifiers derived from titles and names.

/// Lowercases, transliterates, collapses runs of whitespace and punctuation
/// into single hyphens and trims hyphens from both ends.
///
/// Uniqueness is not checked here; the store rejects duplicate slugs.
pub fn slugify(text: &str) -> String {
    ::slug::slugify(text)
}
