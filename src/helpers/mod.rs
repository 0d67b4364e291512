pub mod fixtures;
pub mod handler_404;
