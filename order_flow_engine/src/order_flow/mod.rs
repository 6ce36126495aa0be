pub mod api;
pub mod errors;
pub mod order_objects;
