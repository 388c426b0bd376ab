pub mod root;
pub mod feed;
