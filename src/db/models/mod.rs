//! Content models, one module per collection.

pub mod gallery;
pub mod homepage;
pub mod mission;
pub mod news;
pub mod project;
pub mod team;

pub use gallery::*;
pub use homepage::*;
pub use mission::*;
pub use news::*;
pub use project::*;
pub use team::*;
