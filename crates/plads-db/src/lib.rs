pub mod pool;
pub mod repos;

// Re-export commonly used items
pub use pool::{create_pool, run_migrations};
pub use repos::place::{NewPlace, PlaceRepo, PlaceRow};
pub use repos::user::{is_unique_violation, NewUser, UserRepo, UserRow};
