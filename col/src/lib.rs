//! Reading and writing of COL collision model archives, versions 1 to 4.

pub mod config;
pub mod consts;
pub mod container;
pub mod error;
pub mod header;
pub mod model;
pub mod prelude;
pub mod reader;
pub mod sections;
pub mod writer;
