pub mod availability;
pub mod lifecycle;
pub mod matching;
pub mod pricing;
