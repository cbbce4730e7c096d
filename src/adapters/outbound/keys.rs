//! Store key layout shared by the store adapters.

/// List holding the post feed, newest first.
pub const POSTS_KEY: &str = "posts";

/// Prefix of the per-user hash holding profile fields and the like counter.
pub const PROFILE_PREFIX: &str = "POST";

/// Hash field holding the like counter.
pub const LIKE_COUNT_FIELD: &str = "like_count";

pub fn profile_key(id: &str) -> String {
    format!("{}:{}", PROFILE_PREFIX, id)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_profile_key() {
        assert_eq!(profile_key("42"), "POST:42");
    }
}
