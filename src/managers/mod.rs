pub mod executor;
pub mod normalizer;
pub mod pager;
