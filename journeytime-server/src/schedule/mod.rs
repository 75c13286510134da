//! Static transit schedule access.
//!
//! The resolver reads the schedule through the [`ScheduleStore`] trait.
//! [`InMemorySchedule`] is the indexed implementation used in production
//! and tests, populated from a GTFS directory by [`load_gtfs_dir`].

mod error;
mod gtfs;
mod memory;
mod store;

pub use error::ScheduleError;
pub use gtfs::load_gtfs_dir;
pub use memory::InMemorySchedule;
pub use store::ScheduleStore;
