//! Utility modules shared by the services.
//!
//! - [`pagination`] - page slicing for board and queue listings

pub mod pagination;
