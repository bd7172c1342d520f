//! Backend for FitFlick, a virtual try-on demo.
//!
//! Accepts a photo of a person and a photo of a garment, asks an image
//! generation model to dress one in the other, and always answers with an
//! image, substituting a placeholder when the model cannot deliver. Also
//! provides simple user registration and login.

pub mod ai;
pub mod auth;
pub mod encoding;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;
pub mod staging;
pub mod tryon;

pub use error::{Error, Result};
