pub mod articles;
pub mod audit;
pub mod categories;
pub mod curation;
pub mod items;
pub mod sources;

pub use articles::{ArticleRepository, ArticleRepositoryTrait};
pub use audit::{AuditRepository, AuditRepositoryTrait};
pub use categories::{CategoryRepository, CategoryRepositoryTrait};
pub use curation::{CurationQueueRow, CurationRepository, CurationRepositoryTrait};
pub use items::{ItemRepository, ItemRepositoryTrait};
pub use sources::{SourceRepository, SourceRepositoryTrait};
