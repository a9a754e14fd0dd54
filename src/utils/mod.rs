//! Small shared helpers.

pub mod text;
