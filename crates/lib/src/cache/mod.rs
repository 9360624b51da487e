//! Persistence of head elements across page requests.
//!
//! Two scopes are cached:
//! - [`FragmentHeadCache`]: the elements a single fragment added, stored next
//!   to the fragment's own content cache entry and sharing its tags
//! - [`PageCacheStrategy`]: the whole collection of a page, keyed by a page
//!   identifier and loaded lazily by the manager
//!
//! Both fail closed: store and serialization failures are logged and reported
//! as empty results.

mod fragment;
mod page;

pub use fragment::{FragmentEntry, FragmentHeadCache};
pub use page::{NullCacheStrategy, PageCacheStrategy, StoreCacheStrategy};
