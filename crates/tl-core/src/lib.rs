//! tl-core: shared foundation for tankloop.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real, finiteness checks, operator text parsing, saturation)
//! - clock (wall-clock and manually driven time sources)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod numeric;
pub mod units;

pub use clock::{Clock, ManualClock, WallClock};
pub use error::{TlError, TlResult};
pub use numeric::*;
pub use units::*;
