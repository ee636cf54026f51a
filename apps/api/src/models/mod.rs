pub mod plan;
pub mod trip;
pub mod user;
