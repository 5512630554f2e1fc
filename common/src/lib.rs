//! Shared types for the slide workspace: the deck model, image search
//! results, collaborator traits and the API key store.

pub mod credentials;
pub mod services;
pub mod slide;

pub use credentials::{KeyStore, KeyStoreError};
pub use services::{DeckGenerator, ImageSearch};
pub use slide::{ImageResult, SearchCursor, Slide};
