const REDIRECT_BASE: &str = "http://askme.invalid/";
const DEFAULT_REDIRECT: &str = "/";

pub struct InputSanitizer;

impl InputSanitizer {
    /// Returns `next` when it points back into this site, `None` otherwise.
    pub fn safe_redirect(next: &str) -> Option<String> {
        let next = next.trim();

        if next.is_empty() || !next.starts_with('/') || next.starts_with("//") {
            return None;
        }

        if next.contains('\\') || next.chars().any(|c| c.is_control()) {
            tracing::warn!("Rejected redirect target: {:?}", next);
            return None;
        }

        let base = url::Url::parse(REDIRECT_BASE).ok()?;
        let joined = base.join(next).ok()?;
        if joined.origin() != base.origin() {
            tracing::warn!("Rejected off-site redirect target: {}", next);
            return None;
        }

        let mut target = joined.path().to_string();
        if let Some(query) = joined.query() {
            target.push('?');
            target.push_str(query);
        }
        if let Some(fragment) = joined.fragment() {
            target.push('#');
            target.push_str(fragment);
        }
        Some(target)
    }

    /// `next` if it is safe, the index page otherwise.
    pub fn redirect_or_default(next: Option<&str>) -> String {
        next.and_then(Self::safe_redirect)
            .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
    }

    /// Trims and drops control characters other than newlines and tabs.
    pub fn clean_text(content: &str) -> String {
        content
            .trim()
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect()
    }
}
