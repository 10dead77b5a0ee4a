//! Full-screen messages shown outside the render loop.

pub mod error;

pub use error::ErrorScreen;
