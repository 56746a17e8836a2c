// Service exports
pub mod cache;
pub mod directory;
pub mod postgres;
pub mod supabase;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use directory::{DirectoryBackend, DirectoryError, DirectoryPolicy, DirectoryService};
pub use postgres::{PostgresClient, PostgresError};
pub use supabase::{DirectoryTables, SupabaseClient, SupabaseError};
