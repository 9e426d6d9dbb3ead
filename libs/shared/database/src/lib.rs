pub mod memory;
pub mod postgrest;
pub mod state;
pub mod store;
pub mod supabase;

pub use memory::{FaultPoint, InMemoryStore};
pub use postgrest::SupabaseStore;
pub use state::AppState;
pub use store::{BookingLedger, ProfessionalDirectory, SchedulingStore, SlotStore, StoreError};
