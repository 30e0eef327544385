//! Category block policy shared by the policy-aware adapters

use std::collections::BTreeSet;

/// Which finding categories a tool escalates from `detected` to `block`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPolicy {
    block_all: bool,
    categories: BTreeSet<String>,
}

impl BlockPolicy {
    /// Policy that never blocks; every finding is `detected`
    pub fn detect_only() -> Self {
        Self::default()
    }

    pub fn block_all() -> Self {
        Self {
            block_all: true,
            categories: BTreeSet::new(),
        }
    }

    /// Policy blocking the named categories; the name `all` blocks everything
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::default();
        for name in names {
            let name = name.as_ref().trim().to_ascii_lowercase();
            if name == "all" {
                policy.block_all = true;
            } else if !name.is_empty() {
                policy.categories.insert(name);
            }
        }
        policy
    }

    pub fn blocks(&self, category: &str) -> bool {
        self.block_all || self.categories.contains(category)
    }

    /// True if any of the given categories is blocking
    pub fn blocks_any<'a, I>(&self, categories: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        categories.into_iter().any(|c| self.blocks(c))
    }

    pub fn is_block_all(&self) -> bool {
        self.block_all
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_only() {
        let policy = BlockPolicy::detect_only();
        assert!(!policy.blocks("prompt_injection"));
    }

    #[test]
    fn test_from_names() {
        let policy = BlockPolicy::from_names(["Prompt_Injection", " pii ", ""]);
        assert!(policy.blocks("prompt_injection"));
        assert!(policy.blocks("pii"));
        assert!(!policy.blocks("credentials"));
        assert_eq!(policy.categories().count(), 2);
    }

    #[test]
    fn test_all_keyword() {
        let policy = BlockPolicy::from_names(["all"]);
        assert!(policy.is_block_all());
        assert!(policy.blocks("anything"));
        assert_eq!(policy, BlockPolicy::block_all());
    }

    #[test]
    fn test_blocks_any() {
        let policy = BlockPolicy::from_names(["credentials"]);
        assert!(policy.blocks_any(["pii", "credentials"]));
        assert!(!policy.blocks_any(["pii"]));
        assert!(!policy.blocks_any(std::iter::empty()));
    }
}
