pub mod category;
pub mod report;
pub mod task;
pub mod user;
