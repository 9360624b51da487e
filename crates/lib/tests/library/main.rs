mod common;
mod page_tests;
mod replay_tests;
