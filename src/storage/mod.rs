//! Supabase Storage module
//!
//! Handles material file upload/download URLs.

mod materials;

pub use materials::MaterialStorage;
