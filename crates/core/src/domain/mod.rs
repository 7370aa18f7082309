pub mod lifecycle;
pub mod order;
pub mod submission;
