//! Contact form submissions.

use sonic_core::{Email, Phone};

/// A validated lead ready to insert.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub company: Option<String>,
    pub message: String,
    pub source: Option<String>,
}
