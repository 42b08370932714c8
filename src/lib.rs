//! Timeline view for a todo manager: maps task dates onto a zoomable,
//! virtualized grid and handles selection and synchronized scrolling.

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod timeline;

pub use error::{ErrorKind, LoadError, TimelineError};
