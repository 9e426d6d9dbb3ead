pub mod booking;
pub mod fee;

pub use booking::BookingCoordinator;
pub use fee::FeeResolver;
