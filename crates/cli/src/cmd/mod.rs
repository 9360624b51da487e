mod cache;
mod info;
mod render;

pub use cache::{cmd_cache_clean, cmd_cache_flush, cmd_cache_list};
pub use info::cmd_info;
pub use render::cmd_render;
