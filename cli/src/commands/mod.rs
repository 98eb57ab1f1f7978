pub mod catalog;
pub mod mapping;
pub mod record;
pub mod ticket;
