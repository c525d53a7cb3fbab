//! Facts graph: sessions, participants and laps.
//!
//! These types hold the raw data a reader produced and nothing else. Derived
//! statistics live in [`crate::aggregate`] and are served, memoized, by
//! [`crate::SessionStats`].
//!
//! ## Ownership
//!
//! - A [`Session`] owns its [`Participant`]s, in finishing order
//! - A [`Participant`] owns its [`Lap`]s, in driving order
//! - [`Vehicle`]s and [`Driver`]s are shared through `Arc` and compared by
//!   identity
//!
//! ## Usage Example
//!
//! ```rust
//! use lapstats::types::{Lap, Participant, Sector};
//!
//! let participant = Participant::with_laps([
//!     Lap::new(1).with_sectors([30.0, 40.0, 50.0]),
//!     Lap::new(2).with_time(118.5),
//! ]);
//!
//! assert_eq!(participant.laps()[0].time(), Some(120.0));
//! assert_eq!(participant.laps()[0].sector_time(Sector::Two), Some(40.0));
//! assert_eq!(participant.total_time(), 238.5);
//! ```

mod lap;
mod participant;
mod sector;
mod session;
mod vehicle;

pub use lap::Lap;
pub use participant::{FinishStatus, Participant};
pub use sector::Sector;
pub use session::{LapId, Session, SessionType};
pub use vehicle::{Cut, Driver, Vehicle};
