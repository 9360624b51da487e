//! headtag-lib: Fragment-scoped head element tracking and caching
//!
//! This crate collects the `<head>` declarations (meta, link, script, style)
//! produced while a page is assembled from nested, independently cacheable
//! fragments, and renders them once into the final document:
//! - `HeadTagManager`: the page's ordered, keyed element collection
//! - `ElementTracker`: stack-based before/after instrumentation per fragment
//! - `FragmentHeadCache`: per-fragment element entries replayed on cache hits
//! - `HeadSession`: the render hooks tying them together

pub mod cache;
pub mod config;
pub mod consts;
pub mod element;
pub mod fragment;
pub mod manager;
pub mod page;
pub mod placeholder;
pub mod serializer;
pub mod session;
pub mod store;
pub mod util;
