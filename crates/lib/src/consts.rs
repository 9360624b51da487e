//! Shared constants for headtag.

/// Number of hex characters kept from a SHA-256 digest in derived element keys.
pub const ELEMENT_KEY_HASH_LEN: usize = 32;

/// Token the host template embeds where collected head elements belong.
pub const DEFAULT_PLACEHOLDER: &str = "<!-- {{HEADTAG:PLACEHOLDER:HEAD_ADDITIONAL}} -->";

/// Namespace for fragment-scoped head element entries.
pub const FRAGMENT_KEY_PREFIX: &str = "headtag_fragment_";

/// Tag applied to every fragment-scoped head element entry.
pub const FRAGMENT_CACHE_TAG: &str = "headtag_fragment";

/// Namespace for whole-page head element entries.
pub const PAGE_KEY_PREFIX: &str = "headtag_page_";

/// Tag applied to every whole-page head element entry.
pub const PAGE_CACHE_TAG: &str = "headtag_page";

/// Default lifetime of head element cache entries (30 days).
pub const DEFAULT_CACHE_LIFETIME_SECS: u64 = 60 * 60 * 24 * 30;

/// Version of the on-disk envelope written by the file store.
pub const STORE_ENTRY_VERSION: u32 = 1;

/// Version of serialized fragment head element entries.
pub const FRAGMENT_ENTRY_VERSION: u32 = 2;

/// Fixed key used for the document charset declaration.
pub const CHARSET_KEY: &str = "charset";
