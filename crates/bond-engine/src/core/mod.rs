pub mod atoms;
pub mod time;
pub mod topology;
