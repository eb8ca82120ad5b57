pub mod db;
pub mod directory;
pub mod models;

pub use db::DirectoryDb;
pub use directory::{CompanyDirectory, DEFAULT_SEARCH_LIMIT};
pub use models::{Company, CorpRecord};
