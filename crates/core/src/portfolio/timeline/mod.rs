mod timeline_resolver;

pub use timeline_resolver::{DayResolution, ResolvedPosition, TimelineResolver};
