// Bulk thesis PDF fetcher for the CAPES Sucupira portal.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod source;
