//! Persisted MongoDB document shapes.
//!
//! Records and documents differ in three ways:
//! - ids: `EntityId` in records, `_id: ObjectId` in documents;
//! - foreign keys (`serviceId`, `authorId`) are stored as `ObjectId` when they
//!   parse as one and read back as the hex string;
//! - `featured` on a service is persisted as `isFeatured`.
//!
//! Timestamps are stored as BSON dates. Every document field except `_id` is
//! optional on read so older documents with missing fields still load.

use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::schema::*;
use crate::storage::{EntityId, StorageError, StorageResult};

// ============================================================================
// Identifier and value translation
// ============================================================================

/// Native id for a lookup, or `None` when `id` cannot name a document.
pub fn object_id(id: &EntityId) -> Option<ObjectId> {
    id.as_str().and_then(|s| ObjectId::parse_str(s.trim()).ok())
}

pub fn entity_id(oid: ObjectId) -> EntityId {
    EntityId::Str(oid.to_hex())
}

/// Foreign key as embedded in a child document.
pub fn fk_to_bson(id: &EntityId) -> Bson {
    match (object_id(id), id) {
        (Some(oid), _) => Bson::ObjectId(oid),
        (None, EntityId::Num(n)) => match i64::try_from(*n) {
            Ok(n) => Bson::Int64(n),
            Err(_) => Bson::String(n.to_string()),
        },
        (None, EntityId::Str(s)) => Bson::String(s.clone()),
    }
}

/// Foreign key read back out of a child document.
pub fn fk_from_bson(value: Bson) -> Option<EntityId> {
    match value {
        Bson::ObjectId(oid) => Some(entity_id(oid)),
        Bson::String(s) if !s.is_empty() => Some(EntityId::from(s)),
        Bson::Int32(n) if n >= 0 => Some(EntityId::Num(n as u64)),
        Bson::Int64(n) if n >= 0 => Some(EntityId::Num(n as u64)),
        _ => None,
    }
}

pub fn to_bson_date(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

pub fn from_bson_date(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

/// Stored timestamp, falling back to the id's creation time.
fn stamp(value: Option<bson::DateTime>, id: &ObjectId) -> DateTime<Utc> {
    from_bson_date(value.unwrap_or_else(|| id.timestamp()))
}

fn to_bson<T: Serialize>(operation: &'static str, value: &T) -> StorageResult<Bson> {
    bson::to_bson(value).map_err(|e| StorageError::Mapping {
        operation,
        message: e.to_string(),
    })
}

/// `$set` document for a partial update; `updatedAt` is always stamped.
#[derive(Debug, Default)]
pub struct SetDoc(Document);

impl SetDoc {
    fn new() -> Self {
        Self::default()
    }

    fn field(mut self, key: &str, value: Option<impl Into<Bson>>) -> Self {
        if let Some(v) = value {
            self.0.insert(key, v.into());
        }
        self
    }

    fn serde<T: Serialize>(
        mut self,
        operation: &'static str,
        key: &str,
        value: Option<&T>,
    ) -> StorageResult<Self> {
        if let Some(v) = value {
            self.0.insert(key, to_bson(operation, v)?);
        }
        Ok(self)
    }

    fn fk(self, key: &str, value: Option<&EntityId>) -> Self {
        self.field(key, value.map(fk_to_bson))
    }

    fn date(self, key: &str, value: Option<DateTime<Utc>>) -> Self {
        self.field(key, value.map(to_bson_date))
    }

    /// Update document with `updatedAt` stamped to `now`.
    pub fn into_update(self, now: DateTime<Utc>) -> Document {
        let mut set = self.0;
        set.insert("updatedAt", to_bson_date(now));
        doc! { "$set": set }
    }

    /// Update document without a timestamp (users carry none), or `None`
    /// when the patch touches nothing.
    pub fn into_update_unstamped(self) -> Option<Document> {
        if self.0.is_empty() {
            None
        } else {
            Some(doc! { "$set": self.0 })
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
}

impl UserDoc {
    pub fn from_record(id: ObjectId, user: &User) -> Self {
        Self {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            role: user.role,
            created_at: Some(to_bson_date(user.created_at)),
        }
    }
}

impl From<UserDoc> for User {
    fn from(d: UserDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            id: entity_id(d.id),
            username: d.username,
            email: d.email,
            password: d.password,
            role: d.role,
        }
    }
}

/// `None` when the patch has no fields to write.
pub fn user_update(patch: &UserPatch) -> StorageResult<Option<Document>> {
    Ok(SetDoc::new()
        .field("username", patch.username.clone())
        .field("email", patch.email.clone())
        .field("password", patch.password.clone())
        .serde("update_user", "role", patch.role.as_ref())?
        .into_update_unstamped())
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_desc: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
}

impl ServiceDoc {
    pub fn from_record(id: ObjectId, s: &Service) -> Self {
        Self {
            id,
            name: s.name.clone(),
            description: s.description.clone(),
            short_desc: s.short_desc.clone(),
            price: s.price.clone(),
            image_url: s.image_url.clone(),
            is_featured: s.featured,
            created_at: Some(to_bson_date(s.created_at)),
            updated_at: Some(to_bson_date(s.updated_at)),
        }
    }
}

impl From<ServiceDoc> for Service {
    fn from(d: ServiceDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            updated_at: stamp(d.updated_at.or(d.created_at), &d.id),
            id: entity_id(d.id),
            name: d.name,
            description: d.description,
            short_desc: d.short_desc,
            price: d.price,
            image_url: d.image_url,
            featured: d.is_featured,
        }
    }
}

pub fn service_update(patch: &ServicePatch, now: DateTime<Utc>) -> Document {
    SetDoc::new()
        .field("name", patch.name.clone())
        .field("description", patch.description.clone())
        .field("shortDesc", patch.short_desc.clone())
        .field("price", patch.price.clone())
        .field("imageUrl", patch.image_url.clone())
        .field("isFeatured", patch.featured)
        .into_update(now)
}

// ============================================================================
// Portfolio items
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub before_image_url: Option<String>,
    #[serde(default)]
    pub after_image_url: Option<String>,
    #[serde(default)]
    pub service_id: Option<Bson>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub client_testimonial: Option<ClientTestimonial>,
    #[serde(default)]
    pub seo: Option<Seo>,
    #[serde(default)]
    pub status: PortfolioStatus,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
}

impl PortfolioItemDoc {
    pub fn from_record(id: ObjectId, p: &PortfolioItem) -> Self {
        Self {
            id,
            title: p.title.clone(),
            description: p.description.clone(),
            image_url: p.image_url.clone(),
            before_image_url: p.before_image_url.clone(),
            after_image_url: p.after_image_url.clone(),
            service_id: p.service_id.as_ref().map(fk_to_bson),
            date: p.date,
            location: p.location.clone(),
            duration: p.duration.clone(),
            difficulty: p.difficulty,
            client_testimonial: p.client_testimonial.clone(),
            seo: p.seo.clone(),
            status: p.status,
            view_count: p.view_count,
            created_at: Some(to_bson_date(p.created_at)),
            updated_at: Some(to_bson_date(p.updated_at)),
        }
    }
}

impl From<PortfolioItemDoc> for PortfolioItem {
    fn from(d: PortfolioItemDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            updated_at: stamp(d.updated_at.or(d.created_at), &d.id),
            id: entity_id(d.id),
            title: d.title,
            description: d.description,
            image_url: d.image_url,
            before_image_url: d.before_image_url,
            after_image_url: d.after_image_url,
            service_id: d.service_id.and_then(fk_from_bson),
            date: d.date,
            location: d.location,
            duration: d.duration,
            difficulty: d.difficulty,
            client_testimonial: d.client_testimonial,
            seo: d.seo,
            status: d.status,
            view_count: d.view_count,
        }
    }
}

pub fn portfolio_item_update(
    patch: &PortfolioItemPatch,
    now: DateTime<Utc>,
) -> StorageResult<Document> {
    const OP: &str = "update_portfolio_item";
    Ok(SetDoc::new()
        .field("title", patch.title.clone())
        .field("description", patch.description.clone())
        .field("imageUrl", patch.image_url.clone())
        .field("beforeImageUrl", patch.before_image_url.clone())
        .field("afterImageUrl", patch.after_image_url.clone())
        .fk("serviceId", patch.service_id.as_ref())
        .serde(OP, "date", patch.date.as_ref())?
        .field("location", patch.location.clone())
        .field("duration", patch.duration.clone())
        .serde(OP, "difficulty", patch.difficulty.as_ref())?
        .serde(OP, "clientTestimonial", patch.client_testimonial.as_ref())?
        .serde(OP, "seo", patch.seo.as_ref())?
        .serde(OP, "status", patch.status.as_ref())?
        .field("viewCount", patch.view_count)
        .into_update(now))
}

// ============================================================================
// Blog posts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author_id: Option<Bson>,
    #[serde(default)]
    pub published_at: Option<bson::DateTime>,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
}

impl BlogPostDoc {
    pub fn from_record(id: ObjectId, p: &BlogPost) -> Self {
        Self {
            id,
            title: p.title.clone(),
            content: p.content.clone(),
            excerpt: p.excerpt.clone(),
            image_url: p.image_url.clone(),
            author_id: p.author_id.as_ref().map(fk_to_bson),
            published_at: p.published_at.map(to_bson_date),
            created_at: Some(to_bson_date(p.created_at)),
            updated_at: Some(to_bson_date(p.updated_at)),
        }
    }
}

impl From<BlogPostDoc> for BlogPost {
    fn from(d: BlogPostDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            updated_at: stamp(d.updated_at.or(d.created_at), &d.id),
            id: entity_id(d.id),
            title: d.title,
            content: d.content,
            excerpt: d.excerpt,
            image_url: d.image_url,
            author_id: d.author_id.and_then(fk_from_bson),
            published_at: d.published_at.map(from_bson_date),
        }
    }
}

pub fn blog_post_update(patch: &BlogPostPatch, now: DateTime<Utc>) -> Document {
    SetDoc::new()
        .field("title", patch.title.clone())
        .field("content", patch.content.clone())
        .field("excerpt", patch.excerpt.clone())
        .field("imageUrl", patch.image_url.clone())
        .fk("authorId", patch.author_id.as_ref())
        .date("publishedAt", patch.published_at)
        .into_update(now)
}

// ============================================================================
// Inquiries
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub service_id: Option<Bson>,
    #[serde(default)]
    pub status: InquiryStatus,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
}

impl InquiryDoc {
    pub fn from_record(id: ObjectId, i: &Inquiry) -> Self {
        Self {
            id,
            name: i.name.clone(),
            email: i.email.clone(),
            phone: i.phone.clone(),
            message: i.message.clone(),
            service_id: i.service_id.as_ref().map(fk_to_bson),
            status: i.status,
            created_at: Some(to_bson_date(i.created_at)),
            updated_at: Some(to_bson_date(i.updated_at)),
        }
    }
}

impl From<InquiryDoc> for Inquiry {
    fn from(d: InquiryDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            updated_at: stamp(d.updated_at.or(d.created_at), &d.id),
            id: entity_id(d.id),
            name: d.name,
            email: d.email,
            phone: d.phone,
            message: d.message,
            service_id: d.service_id.and_then(fk_from_bson),
            status: d.status,
        }
    }
}

pub fn inquiry_update(patch: &InquiryPatch, now: DateTime<Utc>) -> StorageResult<Document> {
    Ok(SetDoc::new()
        .field("name", patch.name.clone())
        .field("email", patch.email.clone())
        .field("phone", patch.phone.clone())
        .field("message", patch.message.clone())
        .fk("serviceId", patch.service_id.as_ref())
        .serde("update_inquiry", "status", patch.status.as_ref())?
        .into_update(now))
}

// ============================================================================
// Appointments
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub service_id: Option<Bson>,
    #[serde(default)]
    pub date: Option<bson::DateTime>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
}

impl AppointmentDoc {
    pub fn from_record(id: ObjectId, a: &Appointment) -> Self {
        Self {
            id,
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            email: a.email.clone(),
            phone: a.phone.clone(),
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            zip_code: a.zip_code.clone(),
            service_id: Some(fk_to_bson(&a.service_id)),
            date: Some(to_bson_date(a.date)),
            priority: a.priority,
            notes: a.notes.clone(),
            status: a.status,
            created_at: Some(to_bson_date(a.created_at)),
            updated_at: Some(to_bson_date(a.updated_at)),
        }
    }
}

impl From<AppointmentDoc> for Appointment {
    fn from(d: AppointmentDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            updated_at: stamp(d.updated_at.or(d.created_at), &d.id),
            date: stamp(d.date.or(d.created_at), &d.id),
            id: entity_id(d.id),
            first_name: d.first_name,
            last_name: d.last_name,
            email: d.email,
            phone: d.phone,
            street: d.street,
            city: d.city,
            state: d.state,
            zip_code: d.zip_code,
            service_id: d
                .service_id
                .and_then(fk_from_bson)
                .unwrap_or_else(|| EntityId::Str(String::new())),
            priority: d.priority,
            notes: d.notes,
            status: d.status,
        }
    }
}

pub fn appointment_update(
    patch: &AppointmentPatch,
    now: DateTime<Utc>,
) -> StorageResult<Document> {
    const OP: &str = "update_appointment";
    Ok(SetDoc::new()
        .field("firstName", patch.first_name.clone())
        .field("lastName", patch.last_name.clone())
        .field("email", patch.email.clone())
        .field("phone", patch.phone.clone())
        .field("street", patch.street.clone())
        .field("city", patch.city.clone())
        .field("state", patch.state.clone())
        .field("zipCode", patch.zip_code.clone())
        .fk("serviceId", patch.service_id.as_ref())
        .date("date", patch.date)
        .serde(OP, "priority", patch.priority.as_ref())?
        .field("notes", patch.notes.clone())
        .serde(OP, "status", patch.status.as_ref())?
        .into_update(now))
}

// ============================================================================
// Testimonials
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
    #[serde(default)]
    pub updated_at: Option<bson::DateTime>,
}

impl TestimonialDoc {
    pub fn from_record(id: ObjectId, t: &Testimonial) -> Self {
        Self {
            id,
            name: t.name.clone(),
            role: t.role.clone(),
            content: t.content.clone(),
            rating: t.rating,
            image_url: t.image_url.clone(),
            display_order: t.display_order,
            created_at: Some(to_bson_date(t.created_at)),
            updated_at: Some(to_bson_date(t.updated_at)),
        }
    }
}

impl From<TestimonialDoc> for Testimonial {
    fn from(d: TestimonialDoc) -> Self {
        Self {
            created_at: stamp(d.created_at, &d.id),
            updated_at: stamp(d.updated_at.or(d.created_at), &d.id),
            id: entity_id(d.id),
            name: d.name,
            role: d.role,
            content: d.content,
            rating: d.rating,
            image_url: d.image_url,
            display_order: d.display_order,
        }
    }
}

pub fn testimonial_update(patch: &TestimonialPatch, now: DateTime<Utc>) -> Document {
    SetDoc::new()
        .field("name", patch.name.clone())
        .field("role", patch.role.clone())
        .field("content", patch.content.clone())
        .field("rating", patch.rating)
        .field("imageUrl", patch.image_url.clone())
        .field("displayOrder", patch.display_order)
        .into_update(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    #[test]
    fn test_object_id_parsing_is_defensive() {
        assert!(object_id(&EntityId::Str(HEX.into())).is_some());
        assert!(object_id(&EntityId::Str("not-an-id".into())).is_none());
        assert!(object_id(&EntityId::Num(3)).is_none());
        assert!(object_id(&EntityId::Str(String::new())).is_none());
    }

    #[test]
    fn test_service_id_round_trips_through_object_id() {
        let original = EntityId::Str(HEX.to_string());
        let stored = fk_to_bson(&original);
        assert!(matches!(stored, Bson::ObjectId(_)));

        let back = fk_from_bson(stored).unwrap();
        assert_eq!(back.as_str(), Some(HEX));
    }

    #[test]
    fn test_non_object_id_foreign_keys_are_kept_verbatim() {
        assert_eq!(fk_to_bson(&EntityId::Num(7)), Bson::Int64(7));
        assert_eq!(fk_from_bson(Bson::Int64(7)), Some(EntityId::Num(7)));
        assert_eq!(
            fk_to_bson(&EntityId::Str("legacy".into())),
            Bson::String("legacy".into())
        );
        assert_eq!(fk_from_bson(Bson::Null), None);
    }

    #[test]
    fn test_featured_is_persisted_as_is_featured() {
        let now = Utc::now();
        let oid = ObjectId::new();
        let service = Service {
            id: entity_id(oid),
            name: "Lawn Care".into(),
            description: "Mowing".into(),
            short_desc: None,
            price: None,
            image_url: None,
            featured: true,
            created_at: now,
            updated_at: now,
        };

        let stored = bson::to_document(&ServiceDoc::from_record(oid, &service)).unwrap();
        assert_eq!(stored.get_bool("isFeatured").unwrap(), true);
        assert!(stored.get("featured").is_none());
        assert_eq!(stored.get_object_id("_id").unwrap(), oid);

        let read: ServiceDoc = bson::from_document(stored).unwrap();
        let back = Service::from(read);
        assert!(back.featured);
        assert_eq!(back.id, service.id);
        assert_eq!(back.created_at.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn test_sparse_documents_still_load() {
        let oid = ObjectId::new();
        let read: ServiceDoc = bson::from_document(doc! { "_id": oid, "name": "Old" }).unwrap();
        let service = Service::from(read);
        assert!(!service.featured);
        assert_eq!(service.name, "Old");
        assert_eq!(
            service.created_at.timestamp(),
            from_bson_date(oid.timestamp()).timestamp()
        );
    }

    #[test]
    fn test_portfolio_document_embeds_native_service_id() {
        let now = Utc::now();
        let oid = ObjectId::new();
        let item = PortfolioItem::new(
            entity_id(oid),
            InsertPortfolioItem {
                title: "Patio".into(),
                description: "Stone".into(),
                service_id: Some(EntityId::Str(HEX.into())),
                ..Default::default()
            },
            now,
        );
        let stored = bson::to_document(&PortfolioItemDoc::from_record(oid, &item)).unwrap();
        assert!(stored.get_object_id("serviceId").is_ok());
        assert_eq!(stored.get_str("status").unwrap(), "Draft");
    }

    #[test]
    fn test_service_update_translates_featured() {
        let update = service_update(
            &ServicePatch {
                featured: Some(false),
                ..Default::default()
            },
            Utc::now(),
        );
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_bool("isFeatured").unwrap(), false);
        assert!(set.get("featured").is_none());
        assert!(set.get_datetime("updatedAt").is_ok());
        assert!(set.get("name").is_none());
    }

    #[test]
    fn test_appointment_status_update_only_sets_status() {
        let update = appointment_update(
            &AppointmentPatch {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        let set = update.get_document("$set").unwrap();
        let keys: Vec<&str> = set.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["status", "updatedAt"]);
        assert_eq!(set.get_str("status").unwrap(), "Completed");
    }

    #[test]
    fn test_empty_user_update_writes_nothing() {
        assert!(user_update(&UserPatch::default()).unwrap().is_none());

        let patch = UserPatch {
            email: Some("new@example.com".into()),
            ..UserPatch::default()
        };
        let update = user_update(&patch).unwrap().unwrap();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("email").unwrap(), "new@example.com");
        assert!(!set.contains_key("updatedAt"));
    }

    #[test]
    fn test_foreign_keys_beyond_i64_are_kept_as_text() {
        let huge = EntityId::Num(u64::MAX);
        let stored = fk_to_bson(&huge);
        assert_eq!(stored, Bson::String(u64::MAX.to_string()));
        assert_eq!(fk_from_bson(stored), Some(huge));
    }
}
