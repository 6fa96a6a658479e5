//! In-memory storage backend.
//!
//! Each entity kind owns a map keyed by an integer id and its own counter.
//! Starts empty; see [`crate::storage::seed`] for demo data.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::schema::*;
use crate::storage::{EntityId, Storage, StorageResult};

/// One entity kind: records by id plus the next id to hand out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, build: impl FnOnce(EntityId) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(EntityId::Num(id));
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: &EntityId) -> Option<T> {
        id.as_int().and_then(|n| self.rows.get(&n).cloned())
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|row| pred(row)).cloned()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| pred(row)).cloned().collect()
    }

    fn update(&mut self, id: &EntityId, change: impl FnOnce(&mut T)) -> Option<T> {
        let row = self.rows.get_mut(&id.as_int()?)?;
        change(row);
        Some(row.clone())
    }

    fn remove(&mut self, id: &EntityId) -> bool {
        match id.as_int() {
            Some(n) => self.rows.remove(&n).is_some(),
            None => false,
        }
    }

    fn retain(&mut self, keep: impl Fn(&T) -> bool) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|_, row| keep(row));
        (before - self.rows.len()) as u64
    }
}

#[derive(Debug)]
struct Tables {
    users: Table<User>,
    services: Table<Service>,
    portfolio_items: Table<PortfolioItem>,
    blog_posts: Table<BlogPost>,
    inquiries: Table<Inquiry>,
    appointments: Table<Appointment>,
    testimonials: Table<Testimonial>,
}

/// In-memory storage backend.
///
/// The lock only makes the type `Sync` for the router; there are no
/// transactions, uniqueness checks or cross-table guarantees.
#[derive(Debug)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                users: Table::new(),
                services: Table::new(),
                portfolio_items: Table::new(),
                blog_posts: Table::new(),
                inquiries: Table::new(),
                appointments: Table::new(),
                testimonials: Table::new(),
            }),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    // ==================== Users ====================

    async fn get_user(&self, id: &EntityId) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.find(|u| u.username == username))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn get_users(&self) -> StorageResult<Vec<User>> {
        Ok(self.tables.read().await.users.all())
    }

    async fn create_user(&self, input: InsertUser) -> StorageResult<User> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.users.insert(|id| User::new(id, input, now)))
    }

    async fn update_user(&self, id: &EntityId, patch: UserPatch) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.update(id, |u| u.apply(patch)))
    }

    async fn delete_user(&self, id: &EntityId) -> StorageResult<bool> {
        Ok(self.tables.write().await.users.remove(id))
    }

    // ==================== Services ====================

    async fn get_service(&self, id: &EntityId) -> StorageResult<Option<Service>> {
        Ok(self.tables.read().await.services.get(id))
    }

    async fn get_services(&self) -> StorageResult<Vec<Service>> {
        Ok(self.tables.read().await.services.all())
    }

    async fn get_featured_services(&self) -> StorageResult<Vec<Service>> {
        Ok(self.tables.read().await.services.filter(|s| s.featured))
    }

    async fn create_service(&self, input: InsertService) -> StorageResult<Service> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.services.insert(|id| Service::new(id, input, now)))
    }

    async fn update_service(
        &self,
        id: &EntityId,
        patch: ServicePatch,
    ) -> StorageResult<Option<Service>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.services.update(id, |s| s.apply(patch, now)))
    }

    async fn delete_service(&self, id: &EntityId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .portfolio_items
            .retain(|item| item.service_id.as_ref() != Some(id));
        if removed > 0 {
            tracing::info!(service_id = %id, removed, "Deleted portfolio items of service");
        }
        Ok(tables.services.remove(id))
    }

    // ==================== Portfolio ====================

    async fn get_portfolio_item(&self, id: &EntityId) -> StorageResult<Option<PortfolioItem>> {
        Ok(self.tables.read().await.portfolio_items.get(id))
    }

    async fn get_portfolio_items(&self) -> StorageResult<Vec<PortfolioItem>> {
        Ok(self.tables.read().await.portfolio_items.all())
    }

    async fn get_published_portfolio_items(&self) -> StorageResult<Vec<PortfolioItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .portfolio_items
            .filter(|item| item.status == PortfolioStatus::Published))
    }

    async fn get_portfolio_items_by_service(
        &self,
        service_id: &EntityId,
    ) -> StorageResult<Vec<PortfolioItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .portfolio_items
            .filter(|item| item.service_id.as_ref() == Some(service_id)))
    }

    async fn create_portfolio_item(
        &self,
        input: InsertPortfolioItem,
    ) -> StorageResult<PortfolioItem> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .portfolio_items
            .insert(|id| PortfolioItem::new(id, input, now)))
    }

    async fn update_portfolio_item(
        &self,
        id: &EntityId,
        patch: PortfolioItemPatch,
    ) -> StorageResult<Option<PortfolioItem>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.portfolio_items.update(id, |p| p.apply(patch, now)))
    }

    async fn delete_portfolio_item(&self, id: &EntityId) -> StorageResult<bool> {
        Ok(self.tables.write().await.portfolio_items.remove(id))
    }

    async fn increment_portfolio_view_count(
        &self,
        id: &EntityId,
    ) -> StorageResult<Option<PortfolioItem>> {
        let mut tables = self.tables.write().await;
        Ok(tables.portfolio_items.update(id, |p| p.view_count += 1))
    }

    async fn remove_orphaned_portfolio_items(&self) -> StorageResult<u64> {
        let mut tables = self.tables.write().await;
        let Tables {
            services,
            portfolio_items,
            ..
        } = &mut *tables;
        Ok(portfolio_items.retain(|item| match &item.service_id {
            Some(service_id) => services.get(service_id).is_some(),
            None => true,
        }))
    }

    // ==================== Blog ====================

    async fn get_blog_post(&self, id: &EntityId) -> StorageResult<Option<BlogPost>> {
        Ok(self.tables.read().await.blog_posts.get(id))
    }

    async fn get_blog_posts(&self) -> StorageResult<Vec<BlogPost>> {
        let mut posts = self.tables.read().await.blog_posts.all();
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(posts)
    }

    async fn create_blog_post(&self, input: InsertBlogPost) -> StorageResult<BlogPost> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.blog_posts.insert(|id| BlogPost::new(id, input, now)))
    }

    async fn update_blog_post(
        &self,
        id: &EntityId,
        patch: BlogPostPatch,
    ) -> StorageResult<Option<BlogPost>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.blog_posts.update(id, |p| p.apply(patch, now)))
    }

    async fn delete_blog_post(&self, id: &EntityId) -> StorageResult<bool> {
        Ok(self.tables.write().await.blog_posts.remove(id))
    }

    // ==================== Inquiries ====================

    async fn get_inquiry(&self, id: &EntityId) -> StorageResult<Option<Inquiry>> {
        Ok(self.tables.read().await.inquiries.get(id))
    }

    async fn get_inquiries(&self) -> StorageResult<Vec<Inquiry>> {
        Ok(self.tables.read().await.inquiries.all())
    }

    async fn create_inquiry(&self, input: InsertInquiry) -> StorageResult<Inquiry> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.inquiries.insert(|id| Inquiry::new(id, input, now)))
    }

    async fn update_inquiry(
        &self,
        id: &EntityId,
        patch: InquiryPatch,
    ) -> StorageResult<Option<Inquiry>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.inquiries.update(id, |i| i.apply(patch, now)))
    }

    async fn delete_inquiry(&self, id: &EntityId) -> StorageResult<bool> {
        Ok(self.tables.write().await.inquiries.remove(id))
    }

    // ==================== Appointments ====================

    async fn get_appointment(&self, id: &EntityId) -> StorageResult<Option<Appointment>> {
        Ok(self.tables.read().await.appointments.get(id))
    }

    async fn get_appointments(&self) -> StorageResult<Vec<Appointment>> {
        let mut appointments = self.tables.read().await.appointments.all();
        appointments.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(appointments)
    }

    async fn create_appointment(&self, input: InsertAppointment) -> StorageResult<Appointment> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .appointments
            .insert(|id| Appointment::new(id, input, now)))
    }

    async fn update_appointment(
        &self,
        id: &EntityId,
        patch: AppointmentPatch,
    ) -> StorageResult<Option<Appointment>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.appointments.update(id, |a| a.apply(patch, now)))
    }

    async fn delete_appointment(&self, id: &EntityId) -> StorageResult<bool> {
        Ok(self.tables.write().await.appointments.remove(id))
    }

    // ==================== Testimonials ====================

    async fn get_testimonial(&self, id: &EntityId) -> StorageResult<Option<Testimonial>> {
        Ok(self.tables.read().await.testimonials.get(id))
    }

    async fn get_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        let mut testimonials = self.tables.read().await.testimonials.all();
        testimonials.sort_by_key(|t| t.display_order);
        Ok(testimonials)
    }

    async fn create_testimonial(&self, input: InsertTestimonial) -> StorageResult<Testimonial> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables
            .testimonials
            .insert(|id| Testimonial::new(id, input, now)))
    }

    async fn update_testimonial(
        &self,
        id: &EntityId,
        patch: TestimonialPatch,
    ) -> StorageResult<Option<Testimonial>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.testimonials.update(id, |t| t.apply(patch, now)))
    }

    async fn delete_testimonial(&self, id: &EntityId) -> StorageResult<bool> {
        Ok(self.tables.write().await.testimonials.remove(id))
    }

    // ==================== Metadata ====================

    async fn ping(&self) -> StorageResult<Duration> {
        let start = Instant::now();
        let _guard = self.tables.read().await;
        Ok(start.elapsed())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lawn_care(featured: bool) -> InsertService {
        InsertService {
            name: "Lawn Care".to_string(),
            description: "Mowing, edging and cleanup".to_string(),
            short_desc: None,
            price: Some("$45".to_string()),
            image_url: None,
            featured,
        }
    }

    fn appointment(service_id: EntityId, day: u32) -> InsertAppointment {
        InsertAppointment {
            first_name: "Sam".into(),
            last_name: "Rivera".into(),
            email: "sam@example.com".into(),
            phone: "555-0100".into(),
            street: "12 Elm St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            service_id,
            date: Utc.with_ymd_and_hms(2024, 7, day, 9, 0, 0).unwrap(),
            priority: Priority::Normal,
            notes: None,
            status: AppointmentStatus::Scheduled,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_returns_input_with_defaults() {
        let store = MemStorage::new();
        let created = store
            .create_portfolio_item(InsertPortfolioItem {
                title: "Patio".into(),
                description: "Flagstone patio".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.id, EntityId::Num(1));

        let fetched = store.get_portfolio_item(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, PortfolioStatus::Draft);
        assert_eq!(fetched.view_count, 0);
    }

    #[tokio::test]
    async fn test_ids_are_per_kind_counters() {
        let store = MemStorage::new();
        let s1 = store.create_service(lawn_care(false)).await.unwrap();
        let s2 = store.create_service(lawn_care(false)).await.unwrap();
        let t1 = store
            .create_testimonial(InsertTestimonial {
                name: "Ana".into(),
                role: None,
                content: "Great".into(),
                rating: 5,
                image_url: None,
                display_order: 0,
            })
            .await
            .unwrap();
        assert_eq!(s1.id, EntityId::Num(1));
        assert_eq!(s2.id, EntityId::Num(2));
        assert_eq!(t1.id, EntityId::Num(1));
    }

    #[tokio::test]
    async fn test_string_ids_resolve_when_numeric() {
        let store = MemStorage::new();
        let created = store.create_service(lawn_care(false)).await.unwrap();
        let by_str = store
            .get_service(&EntityId::Str("1".into()))
            .await
            .unwrap();
        assert_eq!(by_str, Some(created));

        let unknown = store
            .get_service(&EntityId::Str("65a1f0c2e4b0a1b2c3d4e5f6".into()))
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = MemStorage::new();
        let created = store.create_service(lawn_care(false)).await.unwrap();
        assert!(store.delete_service(&created.id).await.unwrap());
        assert!(store.get_service(&created.id).await.unwrap().is_none());
        assert!(!store.delete_service(&created.id).await.unwrap());
    }

    /// Create, read back, delete, then check the record is gone and a
    /// second delete reports nothing removed.
    macro_rules! assert_lifecycle {
        ($store:expr, $create:ident, $get:ident, $delete:ident, $input:expr) => {{
            let created = $store.$create($input).await.unwrap();
            let fetched = $store.$get(&created.id).await.unwrap();
            assert_eq!(fetched.as_ref(), Some(&created), stringify!($get));
            assert!($store.$delete(&created.id).await.unwrap(), stringify!($delete));
            assert!($store.$get(&created.id).await.unwrap().is_none(), stringify!($get));
            assert!(!$store.$delete(&created.id).await.unwrap(), stringify!($delete));
        }};
    }

    #[tokio::test]
    async fn test_every_kind_round_trips_and_deletes_once() {
        let store = MemStorage::new();

        assert_lifecycle!(
            store,
            create_user,
            get_user,
            delete_user,
            InsertUser {
                username: "owner".into(),
                email: "owner@example.com".into(),
                password: "$2b$04$hash".into(),
                role: UserRole::Admin,
            }
        );
        assert_lifecycle!(store, create_service, get_service, delete_service, lawn_care(true));

        let service = store.create_service(lawn_care(false)).await.unwrap();
        assert_lifecycle!(
            store,
            create_portfolio_item,
            get_portfolio_item,
            delete_portfolio_item,
            InsertPortfolioItem {
                title: "Patio".into(),
                description: "Flagstone patio".into(),
                service_id: Some(service.id.clone()),
                ..Default::default()
            }
        );
        assert_lifecycle!(
            store,
            create_blog_post,
            get_blog_post,
            delete_blog_post,
            InsertBlogPost {
                title: "Spring checklist".into(),
                content: "<p>Rake, aerate, seed.</p>".into(),
                published_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()),
                ..Default::default()
            }
        );
        assert_lifecycle!(
            store,
            create_inquiry,
            get_inquiry,
            delete_inquiry,
            InsertInquiry {
                name: "Dana".into(),
                email: "dana@example.com".into(),
                message: "Can you quote a new lawn?".into(),
                service_id: Some(service.id.clone()),
                ..Default::default()
            }
        );
        assert_lifecycle!(
            store,
            create_appointment,
            get_appointment,
            delete_appointment,
            appointment(service.id.clone(), 3)
        );
        assert_lifecycle!(
            store,
            create_testimonial,
            get_testimonial,
            delete_testimonial,
            InsertTestimonial {
                name: "Pat".into(),
                role: Some("Homeowner".into()),
                content: "Great crew.".into(),
                rating: 5,
                image_url: None,
                display_order: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let store = MemStorage::new();
        let service = store.create_service(lawn_care(false)).await.unwrap();
        let created = store
            .create_appointment(appointment(service.id.clone(), 3))
            .await
            .unwrap();

        let updated = store
            .update_appointment(
                &created.id,
                AppointmentPatch {
                    status: Some(AppointmentStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, AppointmentStatus::Completed);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(
            Appointment {
                status: created.status,
                updated_at: created.updated_at,
                ..updated
            },
            created
        );
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = MemStorage::new();
        let result = store
            .update_service(&EntityId::Num(99), ServicePatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_featured_is_subset_of_all() {
        let store = MemStorage::new();
        store.create_service(lawn_care(true)).await.unwrap();
        store.create_service(lawn_care(false)).await.unwrap();
        store.create_service(lawn_care(true)).await.unwrap();

        let all = store.get_services().await.unwrap();
        let featured = store.get_featured_services().await.unwrap();
        let expected: Vec<Service> = all.into_iter().filter(|s| s.featured).collect();
        assert_eq!(featured, expected);
        assert_eq!(featured.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_service_cascades_to_portfolio() {
        let store = MemStorage::new();
        let doomed = store.create_service(lawn_care(false)).await.unwrap();
        let kept = store.create_service(lawn_care(false)).await.unwrap();
        for service_id in [&doomed.id, &doomed.id, &kept.id] {
            store
                .create_portfolio_item(InsertPortfolioItem {
                    title: "Job".into(),
                    description: "Done".into(),
                    service_id: Some(service_id.clone()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        assert!(store.delete_service(&doomed.id).await.unwrap());
        assert!(store
            .get_portfolio_items_by_service(&doomed.id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .get_portfolio_items_by_service(&kept.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_remove_orphaned_portfolio_items() {
        let store = MemStorage::new();
        let service = store.create_service(lawn_care(false)).await.unwrap();
        for service_id in [Some(service.id.clone()), Some(EntityId::Num(42)), None] {
            store
                .create_portfolio_item(InsertPortfolioItem {
                    title: "Job".into(),
                    description: "Done".into(),
                    service_id,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        assert_eq!(store.remove_orphaned_portfolio_items().await.unwrap(), 1);
        assert_eq!(store.get_portfolio_items().await.unwrap().len(), 2);
        assert_eq!(store.remove_orphaned_portfolio_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_view_count_increments() {
        let store = MemStorage::new();
        let item = store
            .create_portfolio_item(InsertPortfolioItem {
                title: "Deck".into(),
                description: "Cedar deck".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store.increment_portfolio_view_count(&item.id).await.unwrap();
        let after = store
            .increment_portfolio_view_count(&item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.view_count, 2);
    }

    #[tokio::test]
    async fn test_natural_sort_orders() {
        let store = MemStorage::new();
        let service = store.create_service(lawn_care(false)).await.unwrap();
        store
            .create_appointment(appointment(service.id.clone(), 20))
            .await
            .unwrap();
        store
            .create_appointment(appointment(service.id.clone(), 5))
            .await
            .unwrap();
        let days: Vec<_> = store
            .get_appointments()
            .await
            .unwrap()
            .iter()
            .map(|a| a.date)
            .collect();
        assert!(days[0] < days[1]);

        for (title, day) in [("old", 1), ("new", 9)] {
            store
                .create_blog_post(InsertBlogPost {
                    title: title.into(),
                    content: "text".into(),
                    published_at: Some(Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let posts = store.get_blog_posts().await.unwrap();
        assert_eq!(posts[0].title, "new");
    }

    #[tokio::test]
    async fn test_user_lookup_by_username_and_email() {
        let store = MemStorage::new();
        store
            .create_user(InsertUser {
                username: "owner".into(),
                email: "owner@example.com".into(),
                password: "hash".into(),
                role: UserRole::Admin,
            })
            .await
            .unwrap();
        assert!(store.get_user_by_username("owner").await.unwrap().is_some());
        assert!(store
            .get_user_by_email("OWNER@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(store.get_user_by_username("nobody").await.unwrap().is_none());
    }
}
