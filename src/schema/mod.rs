//! Entity shapes and the validation rules applied to incoming requests.

pub mod coerce;
pub mod forms;
pub mod models;
pub mod validate;

pub use forms::{AppointmentForm, BookingForm, ContactForm};
pub use models::*;
pub use validate::{Schema, ValidationErrors};
