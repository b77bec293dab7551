use crate::classifier::{ChatApi, ChatClient};
use crate::config::Config;
use crate::curation::CurationContext;
use crate::repositories::{
    ArticleRepository, ArticleRepositoryTrait, AuditRepository, AuditRepositoryTrait,
    CategoryRepository, CategoryRepositoryTrait, CurationRepository, CurationRepositoryTrait,
    ItemRepository, ItemRepositoryTrait, SourceRepository, SourceRepositoryTrait,
};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub sources: Arc<dyn SourceRepositoryTrait + Send + Sync>,
    pub items: Arc<dyn ItemRepositoryTrait + Send + Sync>,
    pub curation: Arc<dyn CurationRepositoryTrait + Send + Sync>,
    pub articles: Arc<dyn ArticleRepositoryTrait + Send + Sync>,
    pub categories: Arc<dyn CategoryRepositoryTrait + Send + Sync>,
    pub audit: Arc<dyn AuditRepositoryTrait + Send + Sync>,
    pub chat: Arc<dyn ChatApi>,
    pub config: Arc<Config>,
    pub db_pool: Pool<Postgres>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, config: Config) -> Self {
        Self {
            sources: Arc::new(SourceRepository::new(pool.clone())),
            items: Arc::new(ItemRepository::new(pool.clone())),
            curation: Arc::new(CurationRepository::new(pool.clone())),
            articles: Arc::new(ArticleRepository::new(pool.clone())),
            categories: Arc::new(CategoryRepository::new(pool.clone())),
            audit: Arc::new(AuditRepository::new(pool.clone())),
            chat: Arc::new(ChatClient::from_config(&config)),
            config: Arc::new(config),
            db_pool: pool,
        }
    }

    /// Borrowed view of the state for driving curation transitions.
    pub fn curation_ctx(&self) -> CurationContext<'_> {
        CurationContext {
            curation: self.curation.as_ref(),
            items: self.items.as_ref(),
            articles: self.articles.as_ref(),
            categories: self.categories.as_ref(),
            audit: self.audit.as_ref(),
            author_id: self.config.admin_author_id(),
            fallback_category: self.config.fallback_category(),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    //! Handler-test plumbing: an [`AppState`] backed entirely by mocks and a
    //! lazily-connected pool that is never actually used.

    use super::*;
    use crate::classifier::client::MockChatApi;
    use crate::repositories::articles::MockArticleRepositoryTrait;
    use crate::repositories::audit::MockAuditRepositoryTrait;
    use crate::repositories::categories::MockCategoryRepositoryTrait;
    use crate::repositories::curation::MockCurationRepositoryTrait;
    use crate::repositories::items::MockItemRepositoryTrait;
    use crate::repositories::sources::MockSourceRepositoryTrait;

    pub fn test_pool() -> Pool<Postgres> {
        Pool::<Postgres>::connect_lazy("postgresql://dummy").expect("Failed to create test pool")
    }

    /// Mocks to configure before assembling a state.
    #[derive(Default)]
    pub struct MockParts {
        pub sources: MockSourceRepositoryTrait,
        pub items: MockItemRepositoryTrait,
        pub curation: MockCurationRepositoryTrait,
        pub articles: MockArticleRepositoryTrait,
        pub categories: MockCategoryRepositoryTrait,
        pub audit: MockAuditRepositoryTrait,
        pub chat: MockChatApi,
    }

    impl MockParts {
        pub fn into_state(self) -> AppState {
            AppState {
                sources: Arc::new(self.sources),
                items: Arc::new(self.items),
                curation: Arc::new(self.curation),
                articles: Arc::new(self.articles),
                categories: Arc::new(self.categories),
                audit: Arc::new(self.audit),
                chat: Arc::new(self.chat),
                config: Arc::new(Config::development()),
                db_pool: test_pool(),
            }
        }
    }

    /// A state whose mocks have no expectations: good enough for routes that
    /// never reach a repository.
    pub fn mock_state() -> AppState {
        MockParts::default().into_state()
    }
}
