pub mod booking;
pub mod driver;
pub mod user;
pub mod vehicle;
