//! Domain Layer
//!
//! Core business entity definitions

pub mod chat;
pub mod student;

pub use chat::*;
pub use student::*;
