pub mod draft;
pub mod grid;
pub mod publisher;
pub mod summary;

pub use draft::AvailabilityDraft;
pub use publisher::AvailabilityPublisher;
pub use summary::summarize;
