pub mod xyz;

pub use xyz::{parse_xyz, XyzError};
