pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryRepository;
pub use postgres::{create_pool, PostgresRepository};
pub use repository::TutorRepository;
