pub mod error;
pub mod supabase;

pub use error::{StoreError, SupabaseError};
pub use supabase::SupabaseClient;
