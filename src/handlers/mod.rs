pub mod ask_handlers;
pub mod health_handlers;
pub mod paper_handlers;
