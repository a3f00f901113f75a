/// Query parameters for the assistant directory search.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct AssistantSearch {
    pub area: Option<String>,
    pub name: Option<String>,
}

impl AssistantSearch {
    /// Case-insensitive substring match on area and name. Blank filters match everything.
    pub fn matches(&self, area: Option<&str>, name: &str) -> bool {
        fn contains(haystack: Option<&str>, needle: &Option<String>) -> bool {
            match needle.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                None => true,
                Some(n) => haystack
                    .map(|h| h.to_lowercase().contains(&n.to_lowercase()))
                    .unwrap_or(false),
            }
        }
        contains(area, &self.area) && contains(Some(name), &self.name)
    }
}
