pub mod categories;
pub mod recent;
pub mod reports;
pub mod tasks;
pub mod users;
