pub mod bookings;
mod general;
pub mod slots;

pub use bookings::*;
pub use general::*;
pub use slots::*;
