//! Storage layer.
//!
//! [`Storage`] is the contract route handlers program against. Two backends
//! implement it: [`memory::MemStorage`] for local/demo use and
//! [`mongo::MongoStorage`] for MongoDB. "Not found" is always `Ok(None)` (or
//! `Ok(false)` for deletes); `Err` is reserved for infrastructure failures.

pub mod documents;
pub mod id;
pub mod memory;
pub mod mongo;
pub mod seed;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::schema::*;

pub use id::EntityId;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be reached or configured.
    #[error("connection error: {0}")]
    Connection(String),

    /// A unique constraint rejected the write.
    #[error("{entity} already exists: {detail}")]
    Conflict { entity: &'static str, detail: String },

    /// The backend failed while running an operation.
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: mongodb::error::Error,
    },

    /// A record could not be translated to or from its stored form.
    #[error("{operation}: could not map document: {message}")]
    Mapping {
        operation: &'static str,
        message: String,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle used by the router state.
pub type DynStorage = Arc<dyn Storage>;

/// CRUD contract, one operation set per entity kind.
///
/// Ordering of `get_*s` results: blog posts newest `publishedAt` first,
/// appointments by `date` ascending, testimonials by `displayOrder`
/// ascending, everything else in creation order.
#[async_trait]
pub trait Storage: Send + Sync {
    // ==================== Users ====================

    async fn get_user(&self, id: &EntityId) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn get_users(&self) -> StorageResult<Vec<User>>;
    async fn create_user(&self, input: InsertUser) -> StorageResult<User>;
    async fn update_user(&self, id: &EntityId, patch: UserPatch) -> StorageResult<Option<User>>;
    async fn delete_user(&self, id: &EntityId) -> StorageResult<bool>;

    // ==================== Services ====================

    async fn get_service(&self, id: &EntityId) -> StorageResult<Option<Service>>;
    async fn get_services(&self) -> StorageResult<Vec<Service>>;
    async fn get_featured_services(&self) -> StorageResult<Vec<Service>>;
    async fn create_service(&self, input: InsertService) -> StorageResult<Service>;
    async fn update_service(
        &self,
        id: &EntityId,
        patch: ServicePatch,
    ) -> StorageResult<Option<Service>>;
    /// Removes the service and every portfolio item that references it.
    ///
    /// Dependents go first: if the second step never happens the service is
    /// still there and the delete can simply be retried.
    async fn delete_service(&self, id: &EntityId) -> StorageResult<bool>;

    // ==================== Portfolio ====================

    async fn get_portfolio_item(&self, id: &EntityId) -> StorageResult<Option<PortfolioItem>>;
    async fn get_portfolio_items(&self) -> StorageResult<Vec<PortfolioItem>>;
    async fn get_published_portfolio_items(&self) -> StorageResult<Vec<PortfolioItem>>;
    async fn get_portfolio_items_by_service(
        &self,
        service_id: &EntityId,
    ) -> StorageResult<Vec<PortfolioItem>>;
    async fn create_portfolio_item(
        &self,
        input: InsertPortfolioItem,
    ) -> StorageResult<PortfolioItem>;
    async fn update_portfolio_item(
        &self,
        id: &EntityId,
        patch: PortfolioItemPatch,
    ) -> StorageResult<Option<PortfolioItem>>;
    async fn delete_portfolio_item(&self, id: &EntityId) -> StorageResult<bool>;
    async fn increment_portfolio_view_count(
        &self,
        id: &EntityId,
    ) -> StorageResult<Option<PortfolioItem>>;
    /// Deletes portfolio items whose `serviceId` names no existing service.
    async fn remove_orphaned_portfolio_items(&self) -> StorageResult<u64>;

    // ==================== Blog ====================

    async fn get_blog_post(&self, id: &EntityId) -> StorageResult<Option<BlogPost>>;
    async fn get_blog_posts(&self) -> StorageResult<Vec<BlogPost>>;
    async fn create_blog_post(&self, input: InsertBlogPost) -> StorageResult<BlogPost>;
    async fn update_blog_post(
        &self,
        id: &EntityId,
        patch: BlogPostPatch,
    ) -> StorageResult<Option<BlogPost>>;
    async fn delete_blog_post(&self, id: &EntityId) -> StorageResult<bool>;

    // ==================== Inquiries ====================

    async fn get_inquiry(&self, id: &EntityId) -> StorageResult<Option<Inquiry>>;
    async fn get_inquiries(&self) -> StorageResult<Vec<Inquiry>>;
    async fn create_inquiry(&self, input: InsertInquiry) -> StorageResult<Inquiry>;
    async fn update_inquiry(
        &self,
        id: &EntityId,
        patch: InquiryPatch,
    ) -> StorageResult<Option<Inquiry>>;
    async fn delete_inquiry(&self, id: &EntityId) -> StorageResult<bool>;

    // ==================== Appointments ====================

    async fn get_appointment(&self, id: &EntityId) -> StorageResult<Option<Appointment>>;
    async fn get_appointments(&self) -> StorageResult<Vec<Appointment>>;
    async fn create_appointment(&self, input: InsertAppointment) -> StorageResult<Appointment>;
    async fn update_appointment(
        &self,
        id: &EntityId,
        patch: AppointmentPatch,
    ) -> StorageResult<Option<Appointment>>;
    async fn delete_appointment(&self, id: &EntityId) -> StorageResult<bool>;

    // ==================== Testimonials ====================

    async fn get_testimonial(&self, id: &EntityId) -> StorageResult<Option<Testimonial>>;
    async fn get_testimonials(&self) -> StorageResult<Vec<Testimonial>>;
    async fn create_testimonial(&self, input: InsertTestimonial) -> StorageResult<Testimonial>;
    async fn update_testimonial(
        &self,
        id: &EntityId,
        patch: TestimonialPatch,
    ) -> StorageResult<Option<Testimonial>>;
    async fn delete_testimonial(&self, id: &EntityId) -> StorageResult<bool>;

    // ==================== Metadata ====================

    /// Round-trip to the backend, for the status probe.
    async fn ping(&self) -> StorageResult<Duration>;

    /// Name of this storage backend for logging and the status probe.
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MongoDB connection string. `None` selects the in-memory backend.
    pub uri: Option<String>,
    pub database: String,
    pub connect_timeout_secs: u64,
    pub seed_demo_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: std::env::var("MONGODB_URI")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            database: std::env::var("MONGODB_DB").unwrap_or_else(|_| "business_site".to_string()),
            connect_timeout_secs: std::env::var("MONGODB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            seed_demo_data: std::env::var("SEED_DEMO_DATA")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        }
    }
}

/// Pick a backend from the config.
///
/// A configured but unreachable MongoDB falls back to the in-memory backend
/// so the public site still renders.
pub async fn connect(config: &StoreConfig) -> DynStorage {
    let storage: DynStorage = match &config.uri {
        Some(uri) => match mongo::MongoStorage::connect(uri, config).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to connect to MongoDB. Continuing with in-memory storage."
                );
                Arc::new(memory::MemStorage::new())
            }
        },
        None => {
            tracing::info!("MONGODB_URI not set. Using in-memory storage.");
            Arc::new(memory::MemStorage::new())
        }
    };

    if config.seed_demo_data {
        if let Err(e) = seed::seed_demo_data(storage.as_ref()).await {
            tracing::error!(error = %e, "Failed to seed demo data");
        }
    }

    match storage.remove_orphaned_portfolio_items().await {
        Ok(0) => {}
        Ok(removed) => tracing::warn!(removed, "Removed orphaned portfolio items"),
        Err(e) => tracing::error!(error = %e, "Portfolio reconciliation failed"),
    }

    storage
}
