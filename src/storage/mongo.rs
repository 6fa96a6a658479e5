//! MongoDB storage backend.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::schema::*;
use crate::storage::documents::*;
use crate::storage::{EntityId, Storage, StorageError, StorageResult, StoreConfig};

// ============================================================================
// Collections
// ============================================================================

const USERS: &str = "users";
const SERVICES: &str = "services";
const PORTFOLIO_ITEMS: &str = "portfolio_items";
const BLOG_POSTS: &str = "blog_posts";
const INQUIRIES: &str = "inquiries";
const APPOINTMENTS: &str = "appointments";
const TESTIMONIALS: &str = "testimonials";

const DUPLICATE_KEY: i32 = 11000;

fn backend(operation: &'static str) -> impl FnOnce(mongodb::error::Error) -> StorageError {
    move |source| {
        tracing::error!(operation, error = %source, "MongoDB operation failed");
        StorageError::Backend { operation, source }
    }
}

/// Like [`backend`], for operations addressed to a single document.
fn backend_for<'a>(
    operation: &'static str,
    id: &'a EntityId,
) -> impl FnOnce(mongodb::error::Error) -> StorageError + 'a {
    move |source| {
        tracing::error!(operation, id = %id, error = %source, "MongoDB operation failed");
        StorageError::Backend { operation, source }
    }
}

fn note_missing(operation: &'static str, id: &EntityId) {
    tracing::debug!(operation, id = %id, "No document with this id");
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Maps unique-index violations on users to a conflict, anything else to `fallback`.
fn user_write_error<F>(fallback: F) -> impl FnOnce(mongodb::error::Error) -> StorageError
where
    F: FnOnce(mongodb::error::Error) -> StorageError,
{
    move |source| {
        if is_duplicate_key(&source) {
            StorageError::Conflict {
                entity: "User",
                detail: "username or email is already taken".to_string(),
            }
        } else {
            fallback(source)
        }
    }
}

/// Filter matching a foreign key in any of the forms it may have been stored in.
fn fk_filter(id: &EntityId) -> Document {
    doc! { "$in": [fk_to_bson(id), id.to_string()] }
}

/// Resolve `id` to a native id, logging ids this backend can never hold.
fn lookup(operation: &'static str, id: &EntityId) -> Option<ObjectId> {
    let oid = object_id(id);
    if oid.is_none() {
        tracing::debug!(operation, id = %id, "Id is not an ObjectId; treating as not found");
    }
    oid
}

pub struct MongoStorage {
    client: Client,
    db: Database,
}

impl MongoStorage {
    /// Connect, verify the server answers, and ensure indexes exist.
    pub async fn connect(uri: &str, config: &StoreConfig) -> StorageResult<Self> {
        let timeout = Duration::from_secs(config.connect_timeout_secs.max(1));

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client =
            Client::with_options(options).map_err(|e| StorageError::Connection(e.to_string()))?;
        let db = client.database(&config.database);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self { client, db };
        storage.ensure_indexes().await?;

        tracing::info!(database = %config.database, "Connected to MongoDB");
        Ok(storage)
    }

    async fn ensure_indexes(&self) -> StorageResult<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.users()
            .create_indexes([
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique)
                    .build(),
            ])
            .await
            .map_err(backend("create_user_indexes"))?;

        self.portfolio_items()
            .create_index(IndexModel::builder().keys(doc! { "serviceId": 1 }).build())
            .await
            .map_err(backend("create_portfolio_indexes"))?;

        Ok(())
    }

    fn users(&self) -> Collection<UserDoc> {
        self.db.collection(USERS)
    }

    fn services(&self) -> Collection<ServiceDoc> {
        self.db.collection(SERVICES)
    }

    fn portfolio_items(&self) -> Collection<PortfolioItemDoc> {
        self.db.collection(PORTFOLIO_ITEMS)
    }

    fn blog_posts(&self) -> Collection<BlogPostDoc> {
        self.db.collection(BLOG_POSTS)
    }

    fn inquiries(&self) -> Collection<InquiryDoc> {
        self.db.collection(INQUIRIES)
    }

    fn appointments(&self) -> Collection<AppointmentDoc> {
        self.db.collection(APPOINTMENTS)
    }

    fn testimonials(&self) -> Collection<TestimonialDoc> {
        self.db.collection(TESTIMONIALS)
    }

    // ========================================================================
    // Generic helpers
    // ========================================================================

    async fn find_by_id<D, R>(
        &self,
        coll: Collection<D>,
        operation: &'static str,
        id: &EntityId,
    ) -> StorageResult<Option<R>>
    where
        D: DeserializeOwned + Send + Sync,
        R: From<D>,
    {
        let Some(oid) = lookup(operation, id) else {
            return Ok(None);
        };
        let found = coll
            .find_one(doc! { "_id": oid })
            .await
            .map_err(backend_for(operation, id))?;
        if found.is_none() {
            note_missing(operation, id);
        }
        Ok(found.map(R::from))
    }

    async fn find_many<D, R>(
        &self,
        coll: Collection<D>,
        operation: &'static str,
        filter: Document,
        sort: Document,
    ) -> StorageResult<Vec<R>>
    where
        D: DeserializeOwned + Send + Sync,
        R: From<D>,
    {
        let docs: Vec<D> = coll
            .find(filter)
            .sort(sort)
            .await
            .map_err(backend(operation))?
            .try_collect()
            .await
            .map_err(backend(operation))?;
        Ok(docs.into_iter().map(R::from).collect())
    }

    async fn insert<D>(&self, coll: Collection<D>, operation: &'static str, doc: D) -> StorageResult<()>
    where
        D: Serialize + Send + Sync,
    {
        coll.insert_one(doc).await.map_err(backend(operation))?;
        Ok(())
    }

    async fn update_by_id<D, R>(
        &self,
        coll: Collection<D>,
        operation: &'static str,
        id: &EntityId,
        update: Document,
    ) -> StorageResult<Option<R>>
    where
        D: DeserializeOwned + Send + Sync,
        R: From<D>,
    {
        let Some(oid) = lookup(operation, id) else {
            return Ok(None);
        };
        let updated = coll
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_for(operation, id))?;
        if updated.is_none() {
            note_missing(operation, id);
        }
        Ok(updated.map(R::from))
    }

    async fn delete_by_id<D>(
        &self,
        coll: Collection<D>,
        operation: &'static str,
        id: &EntityId,
    ) -> StorageResult<bool>
    where
        D: Send + Sync,
    {
        let Some(oid) = lookup(operation, id) else {
            return Ok(false);
        };
        let result = coll
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(backend_for(operation, id))?;
        if result.deleted_count == 0 {
            note_missing(operation, id);
        }
        Ok(result.deleted_count > 0)
    }
}

fn by_creation() -> Document {
    doc! { "_id": 1 }
}

#[async_trait]
impl Storage for MongoStorage {
    // ==================== Users ====================

    async fn get_user(&self, id: &EntityId) -> StorageResult<Option<User>> {
        self.find_by_id(self.users(), "get_user", id).await
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let found = self
            .users()
            .find_one(doc! { "username": username })
            .await
            .map_err(backend("get_user_by_username"))?;
        Ok(found.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let found = self
            .users()
            .find_one(doc! { "email": email.trim().to_lowercase() })
            .await
            .map_err(backend("get_user_by_email"))?;
        Ok(found.map(User::from))
    }

    async fn get_users(&self) -> StorageResult<Vec<User>> {
        self.find_many(self.users(), "get_users", doc! {}, by_creation())
            .await
    }

    async fn create_user(&self, input: InsertUser) -> StorageResult<User> {
        let oid = ObjectId::new();
        let user = User::new(entity_id(oid), input, Utc::now());
        self.users()
            .insert_one(UserDoc::from_record(oid, &user))
            .await
            .map_err(user_write_error(backend("create_user")))?;
        Ok(user)
    }

    async fn update_user(&self, id: &EntityId, patch: UserPatch) -> StorageResult<Option<User>> {
        const OP: &str = "update_user";
        let Some(update) = user_update(&patch)? else {
            return self.find_by_id(self.users(), OP, id).await;
        };
        let Some(oid) = lookup(OP, id) else {
            return Ok(None);
        };
        let updated = self
            .users()
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(user_write_error(backend_for(OP, id)))?;
        if updated.is_none() {
            note_missing(OP, id);
        }
        Ok(updated.map(User::from))
    }

    async fn delete_user(&self, id: &EntityId) -> StorageResult<bool> {
        self.delete_by_id(self.users(), "delete_user", id).await
    }

    // ==================== Services ====================

    async fn get_service(&self, id: &EntityId) -> StorageResult<Option<Service>> {
        self.find_by_id(self.services(), "get_service", id).await
    }

    async fn get_services(&self) -> StorageResult<Vec<Service>> {
        self.find_many(self.services(), "get_services", doc! {}, by_creation())
            .await
    }

    async fn get_featured_services(&self) -> StorageResult<Vec<Service>> {
        self.find_many(
            self.services(),
            "get_featured_services",
            doc! { "isFeatured": true },
            by_creation(),
        )
        .await
    }

    async fn create_service(&self, input: InsertService) -> StorageResult<Service> {
        let oid = ObjectId::new();
        let service = Service::new(entity_id(oid), input, Utc::now());
        self.insert(
            self.services(),
            "create_service",
            ServiceDoc::from_record(oid, &service),
        )
        .await?;
        Ok(service)
    }

    async fn update_service(
        &self,
        id: &EntityId,
        patch: ServicePatch,
    ) -> StorageResult<Option<Service>> {
        let update = service_update(&patch, Utc::now());
        self.update_by_id(self.services(), "update_service", id, update)
            .await
    }

    async fn delete_service(&self, id: &EntityId) -> StorageResult<bool> {
        let Some(oid) = lookup("delete_service", id) else {
            return Ok(false);
        };

        let removed = self
            .portfolio_items()
            .delete_many(doc! { "serviceId": fk_filter(id) })
            .await
            .map_err(backend_for("delete_service_portfolio_items", id))?;
        if removed.deleted_count > 0 {
            tracing::info!(
                service_id = %id,
                removed = removed.deleted_count,
                "Deleted portfolio items of service"
            );
        }

        let result = self
            .services()
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(backend_for("delete_service", id))?;
        Ok(result.deleted_count > 0)
    }

    // ==================== Portfolio ====================

    async fn get_portfolio_item(&self, id: &EntityId) -> StorageResult<Option<PortfolioItem>> {
        self.find_by_id(self.portfolio_items(), "get_portfolio_item", id)
            .await
    }

    async fn get_portfolio_items(&self) -> StorageResult<Vec<PortfolioItem>> {
        self.find_many(
            self.portfolio_items(),
            "get_portfolio_items",
            doc! {},
            by_creation(),
        )
        .await
    }

    async fn get_published_portfolio_items(&self) -> StorageResult<Vec<PortfolioItem>> {
        self.find_many(
            self.portfolio_items(),
            "get_published_portfolio_items",
            doc! { "status": "Published" },
            by_creation(),
        )
        .await
    }

    async fn get_portfolio_items_by_service(
        &self,
        service_id: &EntityId,
    ) -> StorageResult<Vec<PortfolioItem>> {
        self.find_many(
            self.portfolio_items(),
            "get_portfolio_items_by_service",
            doc! { "serviceId": fk_filter(service_id) },
            by_creation(),
        )
        .await
    }

    async fn create_portfolio_item(
        &self,
        input: InsertPortfolioItem,
    ) -> StorageResult<PortfolioItem> {
        let oid = ObjectId::new();
        let item = PortfolioItem::new(entity_id(oid), input, Utc::now());
        self.insert(
            self.portfolio_items(),
            "create_portfolio_item",
            PortfolioItemDoc::from_record(oid, &item),
        )
        .await?;
        Ok(item)
    }

    async fn update_portfolio_item(
        &self,
        id: &EntityId,
        patch: PortfolioItemPatch,
    ) -> StorageResult<Option<PortfolioItem>> {
        let update = portfolio_item_update(&patch, Utc::now())?;
        self.update_by_id(self.portfolio_items(), "update_portfolio_item", id, update)
            .await
    }

    async fn delete_portfolio_item(&self, id: &EntityId) -> StorageResult<bool> {
        self.delete_by_id(self.portfolio_items(), "delete_portfolio_item", id)
            .await
    }

    async fn increment_portfolio_view_count(
        &self,
        id: &EntityId,
    ) -> StorageResult<Option<PortfolioItem>> {
        self.update_by_id(
            self.portfolio_items(),
            "increment_portfolio_view_count",
            id,
            doc! { "$inc": { "viewCount": 1_i64 } },
        )
        .await
    }

    async fn remove_orphaned_portfolio_items(&self) -> StorageResult<u64> {
        const OP: &str = "remove_orphaned_portfolio_items";

        let ids = self
            .services()
            .distinct("_id", doc! {})
            .await
            .map_err(backend(OP))?;

        let mut known: Vec<Bson> = Vec::with_capacity(ids.len() * 2);
        for id in ids {
            if let Bson::ObjectId(oid) = &id {
                known.push(Bson::String(oid.to_hex()));
            }
            known.push(id);
        }

        let result = self
            .portfolio_items()
            .delete_many(doc! {
                "serviceId": { "$exists": true, "$ne": Bson::Null, "$nin": known }
            })
            .await
            .map_err(backend(OP))?;
        Ok(result.deleted_count)
    }

    // ==================== Blog ====================

    async fn get_blog_post(&self, id: &EntityId) -> StorageResult<Option<BlogPost>> {
        self.find_by_id(self.blog_posts(), "get_blog_post", id).await
    }

    async fn get_blog_posts(&self) -> StorageResult<Vec<BlogPost>> {
        self.find_many(
            self.blog_posts(),
            "get_blog_posts",
            doc! {},
            doc! { "publishedAt": -1, "createdAt": -1 },
        )
        .await
    }

    async fn create_blog_post(&self, input: InsertBlogPost) -> StorageResult<BlogPost> {
        let oid = ObjectId::new();
        let post = BlogPost::new(entity_id(oid), input, Utc::now());
        self.insert(
            self.blog_posts(),
            "create_blog_post",
            BlogPostDoc::from_record(oid, &post),
        )
        .await?;
        Ok(post)
    }

    async fn update_blog_post(
        &self,
        id: &EntityId,
        patch: BlogPostPatch,
    ) -> StorageResult<Option<BlogPost>> {
        let update = blog_post_update(&patch, Utc::now());
        self.update_by_id(self.blog_posts(), "update_blog_post", id, update)
            .await
    }

    async fn delete_blog_post(&self, id: &EntityId) -> StorageResult<bool> {
        self.delete_by_id(self.blog_posts(), "delete_blog_post", id)
            .await
    }

    // ==================== Inquiries ====================

    async fn get_inquiry(&self, id: &EntityId) -> StorageResult<Option<Inquiry>> {
        self.find_by_id(self.inquiries(), "get_inquiry", id).await
    }

    async fn get_inquiries(&self) -> StorageResult<Vec<Inquiry>> {
        self.find_many(self.inquiries(), "get_inquiries", doc! {}, by_creation())
            .await
    }

    async fn create_inquiry(&self, input: InsertInquiry) -> StorageResult<Inquiry> {
        let oid = ObjectId::new();
        let inquiry = Inquiry::new(entity_id(oid), input, Utc::now());
        self.insert(
            self.inquiries(),
            "create_inquiry",
            InquiryDoc::from_record(oid, &inquiry),
        )
        .await?;
        Ok(inquiry)
    }

    async fn update_inquiry(
        &self,
        id: &EntityId,
        patch: InquiryPatch,
    ) -> StorageResult<Option<Inquiry>> {
        let update = inquiry_update(&patch, Utc::now())?;
        self.update_by_id(self.inquiries(), "update_inquiry", id, update)
            .await
    }

    async fn delete_inquiry(&self, id: &EntityId) -> StorageResult<bool> {
        self.delete_by_id(self.inquiries(), "delete_inquiry", id)
            .await
    }

    // ==================== Appointments ====================

    async fn get_appointment(&self, id: &EntityId) -> StorageResult<Option<Appointment>> {
        self.find_by_id(self.appointments(), "get_appointment", id)
            .await
    }

    async fn get_appointments(&self) -> StorageResult<Vec<Appointment>> {
        self.find_many(
            self.appointments(),
            "get_appointments",
            doc! {},
            doc! { "date": 1 },
        )
        .await
    }

    async fn create_appointment(&self, input: InsertAppointment) -> StorageResult<Appointment> {
        let oid = ObjectId::new();
        let appointment = Appointment::new(entity_id(oid), input, Utc::now());
        self.insert(
            self.appointments(),
            "create_appointment",
            AppointmentDoc::from_record(oid, &appointment),
        )
        .await?;
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        id: &EntityId,
        patch: AppointmentPatch,
    ) -> StorageResult<Option<Appointment>> {
        let update = appointment_update(&patch, Utc::now())?;
        self.update_by_id(self.appointments(), "update_appointment", id, update)
            .await
    }

    async fn delete_appointment(&self, id: &EntityId) -> StorageResult<bool> {
        self.delete_by_id(self.appointments(), "delete_appointment", id)
            .await
    }

    // ==================== Testimonials ====================

    async fn get_testimonial(&self, id: &EntityId) -> StorageResult<Option<Testimonial>> {
        self.find_by_id(self.testimonials(), "get_testimonial", id)
            .await
    }

    async fn get_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        self.find_many(
            self.testimonials(),
            "get_testimonials",
            doc! {},
            doc! { "displayOrder": 1, "_id": 1 },
        )
        .await
    }

    async fn create_testimonial(&self, input: InsertTestimonial) -> StorageResult<Testimonial> {
        let oid = ObjectId::new();
        let testimonial = Testimonial::new(entity_id(oid), input, Utc::now());
        self.insert(
            self.testimonials(),
            "create_testimonial",
            TestimonialDoc::from_record(oid, &testimonial),
        )
        .await?;
        Ok(testimonial)
    }

    async fn update_testimonial(
        &self,
        id: &EntityId,
        patch: TestimonialPatch,
    ) -> StorageResult<Option<Testimonial>> {
        let update = testimonial_update(&patch, Utc::now());
        self.update_by_id(self.testimonials(), "update_testimonial", id, update)
            .await
    }

    async fn delete_testimonial(&self, id: &EntityId) -> StorageResult<bool> {
        self.delete_by_id(self.testimonials(), "delete_testimonial", id)
            .await
    }

    // ==================== Metadata ====================

    async fn ping(&self) -> StorageResult<Duration> {
        let start = Instant::now();
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(backend("ping"))?;
        Ok(start.elapsed())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_lookup_rejects_foreign_ids() {
        assert!(lookup("test", &EntityId::Num(1)).is_none());
        assert!(lookup("test", &EntityId::Str("abc".into())).is_none());
        assert!(lookup("test", &EntityId::Str("65a1f0c2e4b0a1b2c3d4e5f6".into())).is_some());
    }

    #[test]
    fn test_fk_filter_matches_native_and_text_forms() {
        let filter = fk_filter(&EntityId::Str("65a1f0c2e4b0a1b2c3d4e5f6".into()));
        let forms = filter.get_array("$in").unwrap();
        assert_eq!(forms.len(), 2);
        assert!(matches!(forms[0], Bson::ObjectId(_)));
        assert_eq!(forms[1], Bson::String("65a1f0c2e4b0a1b2c3d4e5f6".into()));

        let numeric = fk_filter(&EntityId::Num(4));
        let forms = numeric.get_array("$in").unwrap();
        assert_eq!(forms[0], Bson::Int64(4));
        assert_eq!(forms[1], Bson::String("4".into()));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let config = StoreConfig {
            uri: None,
            database: "test".into(),
            connect_timeout_secs: 1,
            seed_demo_data: false,
        };
        let result = MongoStorage::connect("not-a-mongodb-uri", &config).await;
        assert!(matches!(result, Err(StorageError::Connection(_))));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_single_document_failures_log_operation_and_id() {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let id = EntityId::Str("65a1f0c2e4b0a1b2c3d4e5f6".into());
        let source = ClientOptions::parse("not-a-mongodb-uri").await.unwrap_err();
        let err = backend_for("get_service", &id)(source);
        assert!(matches!(err, StorageError::Backend { operation: "get_service", .. }));
        note_missing("delete_service", &id);

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let failed = text
            .lines()
            .find(|l| l.contains("MongoDB operation failed"))
            .unwrap();
        assert!(failed.contains("ERROR"));
        assert!(failed.contains("get_service"));
        assert!(failed.contains("65a1f0c2e4b0a1b2c3d4e5f6"));
        let missing = text
            .lines()
            .find(|l| l.contains("No document with this id"))
            .unwrap();
        assert!(missing.contains("DEBUG"));
        assert!(missing.contains("delete_service"));
    }

    #[tokio::test]
    async fn test_duplicate_key_check_ignores_other_failures() {
        let err = ClientOptions::parse("not-a-mongodb-uri").await.unwrap_err();
        assert!(!is_duplicate_key(&err));
        let mapped = user_write_error(backend("create_user"))(err);
        assert!(matches!(mapped, StorageError::Backend { operation: "create_user", .. }));
    }
}
