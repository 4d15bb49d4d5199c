//! Scheduler data model module.
//!
//! # Purpose
//! Re-exports the band/membership/rehearsal/availability/attendance and
//! notification models used by the engine, store, and API layers.
mod attendance;
mod availability;
mod band;
mod membership;
mod notification;
mod rehearsal;

pub use attendance::{Attendance, AttendanceStatus};
pub use availability::{Availability, AvailabilityStatus};
pub use band::{Band, BandSummary};
pub use membership::{BandRole, Membership, MembershipStatus};
pub use notification::{Notification, NotificationKind};
pub use rehearsal::{
    AgendaItem, Rehearsal, RehearsalDetail, RehearsalPatch, RehearsalQuery, RehearsalStatus,
    RehearsalSummary, RehearsalWithItems,
};
