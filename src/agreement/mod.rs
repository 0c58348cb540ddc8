//! Agreement domain - form intake, validation, and the HTTP surface.

pub mod handlers;
pub mod models;
pub mod multipart_parser;
pub mod validation;

#[cfg(test)]
mod mod_tests;
