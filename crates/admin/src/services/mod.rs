//! Business logic services for the admin API.

pub mod auth;
pub mod cloudinary;

pub use auth::{AuthError, AuthService, StaffClaims, StaffTokens};
pub use cloudinary::{CloudinaryClient, CloudinaryError, UploadedImage};
