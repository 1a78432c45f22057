//! Request middleware applied around the router.

pub mod method_override;

pub use method_override::method_override;
