//! Core types for the Dompee directory.
//!
//! This module provides the canonical shapes the rest of the system works with.

pub mod category;
pub mod email;
pub(crate) mod lenient;
pub mod review;
pub mod role;
pub mod shop;
pub mod user;

pub use category::{CATEGORIES, Category};
pub use email::{Email, EmailError};
pub use review::{Review, ReviewError};
pub use role::Role;
pub use shop::{PLACEHOLDER_IMAGE, Shop, ShopDraft, ShopDraftError, registration_number};
pub use user::{PasswordError, User, validate_new_password};
