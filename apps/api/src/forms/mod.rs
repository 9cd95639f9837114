//! Job-application form domain: validation, merge, secret transform,
//! artifact lifecycle, storage, and HTTP handlers.

pub mod artifacts;
pub mod conditional;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod schema;
pub mod secret;
pub mod store;
