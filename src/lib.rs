//! Study-materials portal: lists exam and answer-key PDFs, streams
//! downloads, keeps a small catalog of papers and download events, and
//! relays free-text questions to an external answering service.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
