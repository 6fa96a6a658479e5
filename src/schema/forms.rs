//! Validation rules per request body, plus the public forms that are
//! narrower than the admin inputs they turn into.

use serde::{Deserialize, Serialize};

use crate::schema::coerce;
use crate::schema::models::*;
use crate::schema::validate::{Schema, ValidationErrors};
use crate::storage::EntityId;

/// Sanitize HTML content using ammonia
fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

fn trimmed(s: String) -> String {
    let t = s.trim();
    if t.len() == s.len() {
        s
    } else {
        t.to_string()
    }
}

// ============================================================================
// Admin inputs
// ============================================================================

impl Schema for InsertUser {
    type Output = InsertUser;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_len("username", &self.username, 3);
        errors.email("email", &self.email);
        errors.min_len("password", &self.password, 8);
        errors.finish(InsertUser {
            username: trimmed(self.username),
            email: trimmed(self.email).to_lowercase(),
            ..self
        })
    }
}

impl Schema for UserPatch {
    type Output = UserPatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.present(self.username.as_deref(), |e, v| e.min_len("username", v, 3));
        errors.present(self.email.as_deref(), |e, v| e.email("email", v));
        errors.present(self.password.as_deref(), |e, v| e.min_len("password", v, 8));
        errors.finish(UserPatch {
            username: self.username.map(trimmed),
            email: self.email.map(|e| trimmed(e).to_lowercase()),
            ..self
        })
    }
}

impl Schema for InsertService {
    type Output = InsertService;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if errors.required("name", &self.name) {
            errors.max_len("name", self.name.trim(), 100);
        }
        errors.required("description", &self.description);
        errors.finish(InsertService {
            name: trimmed(self.name),
            ..self
        })
    }
}

impl Schema for ServicePatch {
    type Output = ServicePatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.present(self.name.as_deref(), |e, v| {
            if e.required("name", v) {
                e.max_len("name", v.trim(), 100);
            }
        });
        errors.present(self.description.as_deref(), |e, v| {
            e.required("description", v);
        });
        errors.finish(ServicePatch {
            name: self.name.map(trimmed),
            ..self
        })
    }
}

fn check_client_testimonial(errors: &mut ValidationErrors, t: &ClientTestimonial) {
    if let Some(rating) = t.rating {
        errors.range("clientTestimonial", rating, 1, 5);
    }
}

impl Schema for InsertPortfolioItem {
    type Output = InsertPortfolioItem;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &self.title);
        errors.required("description", &self.description);
        errors.present(self.client_testimonial.as_ref(), check_client_testimonial);
        errors.finish(InsertPortfolioItem {
            title: trimmed(self.title),
            ..self
        })
    }
}

impl Schema for PortfolioItemPatch {
    type Output = PortfolioItemPatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.present(self.title.as_deref(), |e, v| {
            e.required("title", v);
        });
        errors.present(self.description.as_deref(), |e, v| {
            e.required("description", v);
        });
        errors.present(self.client_testimonial.as_ref(), check_client_testimonial);
        if let Some(count) = self.view_count {
            if count < 0 {
                errors.add("viewCount", "viewCount must not be negative");
            }
        }
        errors.finish(PortfolioItemPatch {
            title: self.title.map(trimmed),
            ..self
        })
    }
}

impl Schema for InsertBlogPost {
    type Output = InsertBlogPost;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &self.title);
        errors.required("content", &self.content);
        let content = sanitize_html(&self.content);
        errors.finish(InsertBlogPost {
            title: trimmed(self.title),
            content,
            ..self
        })
    }
}

impl Schema for BlogPostPatch {
    type Output = BlogPostPatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.present(self.title.as_deref(), |e, v| {
            e.required("title", v);
        });
        errors.present(self.content.as_deref(), |e, v| {
            e.required("content", v);
        });
        errors.finish(BlogPostPatch {
            title: self.title.map(trimmed),
            content: self.content.map(|c| sanitize_html(&c)),
            ..self
        })
    }
}

impl Schema for InsertInquiry {
    type Output = InsertInquiry;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("name", &self.name);
        errors.email("email", &self.email);
        errors.min_len("message", &self.message, 10);
        errors.finish(InsertInquiry {
            name: trimmed(self.name),
            email: trimmed(self.email),
            ..self
        })
    }
}

impl Schema for InquiryPatch {
    type Output = InquiryPatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.present(self.name.as_deref(), |e, v| {
            e.required("name", v);
        });
        errors.present(self.email.as_deref(), |e, v| e.email("email", v));
        errors.present(self.message.as_deref(), |e, v| e.min_len("message", v, 10));
        errors.finish(self)
    }
}

impl Schema for AppointmentPatch {
    type Output = AppointmentPatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ] {
            errors.present(value.as_deref(), |e, v| {
                e.required(field, v);
            });
        }
        errors.present(self.email.as_deref(), |e, v| e.email("email", v));
        errors.finish(self)
    }
}

impl Schema for InsertTestimonial {
    type Output = InsertTestimonial;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("name", &self.name);
        errors.required("content", &self.content);
        errors.range("rating", self.rating, 1, 5);
        errors.finish(InsertTestimonial {
            name: trimmed(self.name),
            ..self
        })
    }
}

impl Schema for TestimonialPatch {
    type Output = TestimonialPatch;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.present(self.name.as_deref(), |e, v| {
            e.required("name", v);
        });
        errors.present(self.content.as_deref(), |e, v| {
            e.required("content", v);
        });
        errors.present(self.rating.as_ref(), |e, v| e.range("rating", *v, 1, 5));
        errors.finish(self)
    }
}

// ============================================================================
// Forms
// ============================================================================

/// POST /api/contact body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
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
}

impl Schema for ContactForm {
    type Output = InsertInquiry;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.min_len("name", &self.name, 2);
        errors.email("email", &self.email);
        errors.min_len("message", &self.message, 10);
        errors.finish(InsertInquiry {
            name: trimmed(self.name),
            email: trimmed(self.email),
            phone: self.phone,
            message: trimmed(self.message),
            service_id: self.service_id,
            status: InquiryStatus::New,
        })
    }
}

/// Contact and address fields shared by both booking forms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
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
    #[serde(default, deserialize_with = "coerce::opt_entity_id")]
    pub service_id: Option<EntityId>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub notes: Option<String>,
}

impl BookingDetails {
    fn into_insert(
        self,
        priority: Priority,
        status: AppointmentStatus,
    ) -> Result<InsertAppointment, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("firstName", &self.first_name);
        errors.required("lastName", &self.last_name);
        errors.email("email", &self.email);
        errors.min_len("phone", &self.phone, 7);
        errors.required("street", &self.street);
        errors.required("city", &self.city);
        errors.required("state", &self.state);
        errors.required("zipCode", &self.zip_code);
        if self.service_id.is_none() {
            errors.add("serviceId", "serviceId is required");
        }
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("date", "date is required");
                None
            }
            Some(raw) => {
                let parsed = coerce::parse_datetime(raw);
                if parsed.is_none() {
                    errors.add("date", "Invalid date");
                }
                parsed
            }
        };

        match (errors.is_empty(), self.service_id, date) {
            (true, Some(service_id), Some(date)) => Ok(InsertAppointment {
                first_name: trimmed(self.first_name),
                last_name: trimmed(self.last_name),
                email: trimmed(self.email),
                phone: trimmed(self.phone),
                street: trimmed(self.street),
                city: trimmed(self.city),
                state: trimmed(self.state),
                zip_code: trimmed(self.zip_code),
                service_id,
                date,
                priority,
                notes: self.notes,
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// POST /api/appointments body. Customers cannot set priority or status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    #[serde(flatten)]
    pub details: BookingDetails,
}

impl Schema for BookingForm {
    type Output = InsertAppointment;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        self.details
            .into_insert(Priority::default(), AppointmentStatus::default())
    }
}

/// POST /api/admin/appointments body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentForm {
    #[serde(flatten)]
    pub details: BookingDetails,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

impl Schema for AppointmentForm {
    type Output = InsertAppointment;

    fn parse(self) -> Result<Self::Output, ValidationErrors> {
        self.details.into_insert(
            self.priority.unwrap_or_default(),
            self.status.unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn booking_json() -> serde_json::Value {
        json!({
            "firstName": "Sam",
            "lastName": "Rivera",
            "email": "sam@example.com",
            "phone": "555-0100",
            "street": "12 Elm St",
            "city": "Springfield",
            "state": "IL",
            "zipCode": "62701",
            "serviceId": 1,
            "date": "2024-07-01T10:00",
        })
    }

    #[test]
    fn test_contact_form_short_message() {
        let form: ContactForm = serde_json::from_value(json!({
            "name": "Jo",
            "email": "jo@example.com",
            "message": "too short",
        }))
        .unwrap();
        let errors = form.parse().unwrap_err();
        assert!(errors.contains("message"));
        assert!(!errors.contains("email"));
    }

    #[test]
    fn test_contact_form_creates_new_inquiry() {
        let form: ContactForm = serde_json::from_value(json!({
            "name": "Jo Smith",
            "email": "jo@example.com",
            "message": "Please quote a spring cleanup.",
            "serviceId": "3",
        }))
        .unwrap();
        let inquiry = form.parse().unwrap();
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert_eq!(inquiry.service_id, Some(EntityId::Num(3)));
    }

    #[test]
    fn test_booking_form_ignores_priority_and_status() {
        let mut body = booking_json();
        body["priority"] = json!("Urgent");
        body["status"] = json!("Completed");
        let form: BookingForm = serde_json::from_value(body).unwrap();
        let appt = form.parse().unwrap();
        assert_eq!(appt.priority, Priority::Normal);
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_admin_appointment_form_accepts_priority() {
        let mut body = booking_json();
        body["priority"] = json!("Urgent");
        let form: AppointmentForm = serde_json::from_value(body).unwrap();
        assert_eq!(form.parse().unwrap().priority, Priority::Urgent);
    }

    #[test]
    fn test_booking_form_missing_fields() {
        let form: BookingForm = serde_json::from_value(json!({ "date": "soon" })).unwrap();
        let errors = form.parse().unwrap_err();
        for field in ["firstName", "email", "zipCode", "serviceId", "date"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_testimonial_rating_range() {
        let input: InsertTestimonial = serde_json::from_value(json!({
            "name": "Ana",
            "content": "Lovely",
            "rating": 6,
        }))
        .unwrap();
        assert!(input.parse().unwrap_err().contains("rating"));
    }

    #[test]
    fn test_blog_content_is_sanitized() {
        let input = InsertBlogPost {
            title: "Spring tips".into(),
            content: "<p>Mulch early</p><script>alert(1)</script>".into(),
            ..Default::default()
        };
        let parsed = input.parse().unwrap();
        assert!(parsed.content.contains("<p>Mulch early</p>"));
        assert!(!parsed.content.contains("script"));
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Completed),
            ..Default::default()
        };
        assert!(patch.parse().is_ok());

        let patch = AppointmentPatch {
            city: Some("  ".into()),
            ..Default::default()
        };
        assert!(patch.parse().unwrap_err().contains("city"));
    }
}
