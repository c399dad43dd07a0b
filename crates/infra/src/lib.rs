//! `clinic-infra`: adapters to the backend data/auth service.
//!
//! - [`supabase::SupabaseClient`]: HTTP client for the hosted service
//!   (GoTrue-style auth + PostgREST-style tables).
//! - [`memory::InMemoryBackend`]: same contract, in process, for tests/dev.
//! - [`records`]: the typed record access layer the views call.

pub mod error;
pub mod memory;
pub mod query;
pub mod records;
pub mod store;
pub mod supabase;

pub use error::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use query::{EVOLUTIONS_TABLE, Filter, Order, PATIENTS_TABLE, Select};
pub use records::{EvolutionRecords, PatientRecords, Records};
pub use store::DataService;
pub use supabase::SupabaseClient;
