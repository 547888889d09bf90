//! Chandra MSID telemetry analysis.
//!
//! Loads telemetry channels (MSIDs) exported to CSV, converts their timestamps from CXC seconds
//! (seconds since 1998-01-01T00:00:00 UTC) to plot day numbers (days since January 1, year 1),
//! joins sparsely sampled channels to densely sampled ones on exactly matching timestamps, and
//! renders scatter and line plots described by YAML analysis configurations.
//!
mod align;
mod analysis;
mod channel;
mod error;
mod events;
mod plot;
mod style;
mod time;

pub mod config;

pub use align::*;
pub use analysis::*;
pub use channel::*;
pub use error::*;
pub use events::*;
pub use plot::*;
pub use style::*;
pub use time::*;
