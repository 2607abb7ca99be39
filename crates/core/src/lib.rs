//! Dompee Core - Shared domain library for the Dompee.lk directory.
//!
//! This crate provides the types and pure logic used by every Dompee component:
//! - `site` - The public directory web site and admin panel
//! - `cli` - Command-line tools for inspecting the remote backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. Shop and user records are owned by the remote
//! spreadsheet backend; this crate only knows how to make sense of them.
//!
//! # Modules
//!
//! - [`types`] - Shops, users, reviews, the category catalogue and emails
//! - [`normalize`] - Mapping loosely-typed backend JSON into canonical shops
//! - [`listing`] - Search, category filter, sort and aggregate helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod listing;
pub mod normalize;
pub mod types;

pub use listing::{CategoryFilter, ListingQuery, SearchField, ShopStats, SortBy, filter_shops};
pub use normalize::{NormalizeError, normalize_shop, normalize_shops};
pub use types::*;
