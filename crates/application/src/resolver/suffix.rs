use ferrous_resolver_domain::domain_name;

/// Decides whether a name is tried under the search suffixes first.
#[derive(Debug, Clone, Copy)]
pub struct SuffixPolicy<'a> {
    ndots: u8,
    search: &'a [String],
}

impl<'a> SuffixPolicy<'a> {
    pub fn new(ndots: u8, search: &'a [String]) -> Self {
        Self { ndots, search }
    }

    /// `already_searching` is set when the handler in use is itself a search
    /// fallback, which must never be wrapped again.
    pub fn searchable(&self, domain: &str, already_searching: bool) -> bool {
        if already_searching || self.search.is_empty() {
            return false;
        }
        if domain_name::is_fully_qualified(domain) {
            return false;
        }
        domain_name::count_dots(domain) < usize::from(self.ndots)
    }

    pub fn suffixes(&self) -> &'a [String] {
        self.search
    }
}
