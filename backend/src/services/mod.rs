pub mod context;
pub mod declarations;
pub mod jobs;
pub mod render;
