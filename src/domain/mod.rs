pub mod feed_item;
pub mod viewer;
pub mod module;
pub mod page;
pub mod audience_policy;
pub mod visibility;

pub use feed_item::*;
pub use viewer::*;
pub use module::*;
pub use page::*;
pub use audience_policy::{resolve_audience, AudienceRequest, PolicyError, Resolution};
pub use visibility::{audience_matches, is_visible};
