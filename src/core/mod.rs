mod cookie;
mod expiry;
mod group;
mod report;
mod timestamp;

pub use cookie::{CookieFinding, UNKNOWN_CATEGORY};
pub use expiry::ExpiryView;
pub use group::FindingGroup;
pub use report::Report;
