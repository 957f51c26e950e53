#![doc = "gallery-ingest-core: authenticated batch ingestion into an image gallery API."]

//! Acquires an OAuth2 password-grant token, collects images from a local
//! directory and from a photo-search provider, uploads each one to the
//! gallery API and reads the collection back.
//!
//! The CLI crate only loads configuration and wires the production clients
//! into [`pipeline::ingest`].

pub mod contract;
pub mod error;
pub mod flickr;
pub mod gallery;
mod http;
pub mod local;
pub mod pipeline;
pub mod search;
pub mod token;
pub mod upload;
pub mod verify;

pub use error::GalleryError;
