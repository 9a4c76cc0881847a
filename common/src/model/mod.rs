pub mod context;
pub mod declaration;
pub mod mapping;
pub mod record;
