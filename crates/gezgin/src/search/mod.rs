pub mod resolver;

pub use resolver::{LocationResolver, Resolution};
