//! Entity models - records as returned by storage, insert inputs, and partial updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::coerce;
use crate::storage::EntityId;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortfolioStatus {
    Published,
    #[default]
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    New,
    #[serde(rename = "in-progress")]
    InProgress,
    Resolved,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

// ============================================================================
// Embedded sub-records
// ============================================================================

/// Quote from the client shown alongside a portfolio item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTestimonial {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "coerce::opt_i32")]
    pub rating: Option<i32>,
}

/// Search-engine metadata for a portfolio item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub meta_title: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ============================================================================
// User
// ============================================================================

/// Back-office account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never sent back to clients
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// New user for insertion (password already hashed by the caller)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

/// User update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl User {
    pub fn new(id: EntityId, input: InsertUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: input.username,
            email: input.email,
            password: input.password,
            role: input.role,
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(v) = patch.username {
            self.username = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.password {
            self.password = v;
        }
        if let Some(v) = patch.role {
            self.role = v;
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// A service the business offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub short_desc: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New service for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertService {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub short_desc: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Service update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_desc: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl Service {
    pub fn new(id: EntityId, input: InsertService, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            short_desc: input.short_desc,
            price: input.price,
            image_url: input.image_url,
            featured: input.featured,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: ServicePatch, now: DateTime<Utc>) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if patch.short_desc.is_some() {
            self.short_desc = patch.short_desc;
        }
        if patch.price.is_some() {
            self.price = patch.price;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        if let Some(v) = patch.featured {
            self.featured = v;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Portfolio item
// ============================================================================

/// Completed job shown in the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub before_image_url: Option<String>,
    pub after_image_url: Option<String>,
    pub service_id: Option<EntityId>,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub client_testimonial: Option<ClientTestimonial>,
    pub seo: Option<Seo>,
    pub status: PortfolioStatus,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New portfolio item for creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPortfolioItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub before_image_url: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub after_image_url: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_entity_id")]
    pub service_id: Option<EntityId>,
    #[serde(default, deserialize_with = "coerce::opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub duration: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub client_testimonial: Option<ClientTestimonial>,
    #[serde(default)]
    pub seo: Option<Seo>,
    #[serde(default)]
    pub status: PortfolioStatus,
}

/// Portfolio item update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub before_image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub after_image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_entity_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_id: Option<EntityId>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_testimonial: Option<ClientTestimonial>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PortfolioStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
}

impl PortfolioItem {
    pub fn new(id: EntityId, input: InsertPortfolioItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            before_image_url: input.before_image_url,
            after_image_url: input.after_image_url,
            service_id: input.service_id,
            date: input.date,
            location: input.location,
            duration: input.duration,
            difficulty: input.difficulty,
            client_testimonial: input.client_testimonial,
            seo: input.seo,
            status: input.status,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: PortfolioItemPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        if patch.before_image_url.is_some() {
            self.before_image_url = patch.before_image_url;
        }
        if patch.after_image_url.is_some() {
            self.after_image_url = patch.after_image_url;
        }
        if patch.service_id.is_some() {
            self.service_id = patch.service_id;
        }
        if patch.date.is_some() {
            self.date = patch.date;
        }
        if patch.location.is_some() {
            self.location = patch.location;
        }
        if patch.duration.is_some() {
            self.duration = patch.duration;
        }
        if patch.difficulty.is_some() {
            self.difficulty = patch.difficulty;
        }
        if patch.client_testimonial.is_some() {
            self.client_testimonial = patch.client_testimonial;
        }
        if patch.seo.is_some() {
            self.seo = patch.seo;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.view_count {
            self.view_count = v;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Blog post
// ============================================================================

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub author_id: Option<EntityId>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New blog post for creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertBlogPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_entity_id")]
    pub author_id: Option<EntityId>,
    #[serde(default, deserialize_with = "coerce::opt_datetime")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Blog post update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub excerpt: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_entity_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_id: Option<EntityId>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    pub fn new(id: EntityId, input: InsertBlogPost, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            image_url: input.image_url,
            author_id: input.author_id,
            published_at: input.published_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: BlogPostPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if patch.excerpt.is_some() {
            self.excerpt = patch.excerpt;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        if patch.author_id.is_some() {
            self.author_id = patch.author_id;
        }
        if patch.published_at.is_some() {
            self.published_at = patch.published_at;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Inquiry
// ============================================================================

/// Message sent through the contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub service_id: Option<EntityId>,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New inquiry for creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertInquiry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "coerce::opt_entity_id")]
    pub service_id: Option<EntityId>,
    #[serde(default)]
    pub status: InquiryStatus,
}

/// Inquiry update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_entity_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InquiryStatus>,
}

impl Inquiry {
    pub fn new(id: EntityId, input: InsertInquiry, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            message: input.message,
            service_id: input.service_id,
            status: input.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: InquiryPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
        if let Some(v) = patch.message {
            self.message = v;
        }
        if patch.service_id.is_some() {
            self.service_id = patch.service_id;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Appointment
// ============================================================================

/// Booked on-site visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub service_id: EntityId,
    pub date: DateTime<Utc>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New appointment for creation, produced by the booking forms
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAppointment {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub service_id: EntityId,
    pub date: DateTime<Utc>,
    pub priority: Priority,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
}

/// Appointment update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_entity_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_id: Option<EntityId>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}

impl Appointment {
    pub fn new(id: EntityId, input: InsertAppointment, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            street: input.street,
            city: input.city,
            state: input.state,
            zip_code: input.zip_code,
            service_id: input.service_id,
            date: input.date,
            priority: input.priority,
            notes: input.notes,
            status: input.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: AppointmentPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.first_name {
            self.first_name = v;
        }
        if let Some(v) = patch.last_name {
            self.last_name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.street {
            self.street = v;
        }
        if let Some(v) = patch.city {
            self.city = v;
        }
        if let Some(v) = patch.state {
            self.state = v;
        }
        if let Some(v) = patch.zip_code {
            self.zip_code = v;
        }
        if let Some(v) = patch.service_id {
            self.service_id = v;
        }
        if let Some(v) = patch.date {
            self.date = v;
        }
        if let Some(v) = patch.priority {
            self.priority = v;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Testimonial
// ============================================================================

/// Customer review shown on the public site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: EntityId,
    pub name: String,
    pub role: Option<String>,
    pub content: String,
    pub rating: i32,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_rating() -> i32 {
    5
}

/// New testimonial for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTestimonial {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_rating", deserialize_with = "coerce::lenient_i32")]
    pub rating: i32,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "coerce::lenient_i32")]
    pub display_order: i32,
}

/// Testimonial update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<i32>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::opt_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_order: Option<i32>,
}

impl Testimonial {
    pub fn new(id: EntityId, input: InsertTestimonial, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            role: input.role,
            content: input.content,
            rating: input.rating,
            image_url: input.image_url,
            display_order: input.display_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: TestimonialPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if patch.role.is_some() {
            self.role = patch.role;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if let Some(v) = patch.rating {
            self.rating = v;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        if let Some(v) = patch.display_order {
            self.display_order = v;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquiry_status_wire_names() {
        let s = serde_json::to_string(&InquiryStatus::InProgress).unwrap();
        assert_eq!(s, "\"in-progress\"");
        let parsed: InquiryStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(parsed, InquiryStatus::Archived);
    }

    #[test]
    fn test_user_password_is_not_serialized() {
        let user = User::new(
            EntityId::Num(1),
            InsertUser {
                username: "owner".into(),
                email: "owner@example.com".into(),
                password: "$2b$12$hash".into(),
                role: UserRole::Admin,
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_service_apply_keeps_unspecified_fields() {
        let now = Utc::now();
        let mut service = Service::new(
            EntityId::Num(1),
            InsertService {
                name: "Lawn Care".into(),
                description: "Weekly mowing".into(),
                short_desc: Some("Mowing".into()),
                price: Some("$40".into()),
                image_url: None,
                featured: true,
            },
            now,
        );
        service.apply(
            ServicePatch {
                price: Some("$45".into()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(service.name, "Lawn Care");
        assert_eq!(service.short_desc.as_deref(), Some("Mowing"));
        assert_eq!(service.price.as_deref(), Some("$45"));
        assert!(service.featured);
    }

    #[test]
    fn test_portfolio_insert_defaults() {
        let input: InsertPortfolioItem = serde_json::from_value(serde_json::json!({
            "title": "Backyard",
            "description": "New patio",
            "serviceId": "",
        }))
        .unwrap();
        assert_eq!(input.status, PortfolioStatus::Draft);
        assert!(input.service_id.is_none());

        let item = PortfolioItem::new(EntityId::Num(1), input, Utc::now());
        assert_eq!(item.view_count, 0);
    }

    #[test]
    fn test_testimonial_rating_accepts_string() {
        let input: InsertTestimonial = serde_json::from_value(serde_json::json!({
            "name": "Dana",
            "content": "Great work",
            "rating": "4",
        }))
        .unwrap();
        assert_eq!(input.rating, 4);
        assert_eq!(input.display_order, 0);
    }
}
