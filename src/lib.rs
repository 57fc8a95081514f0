//! Kernel task objects: the job/process tree.
//!
//! Jobs form a strict tree of containers; processes are the leaves. A job
//! groups its members so they can be enumerated, controlled and terminated
//! as a unit. See [`task::Job`] for the lifecycle and the kill protocol.

#![no_std]
#![deny(warnings)]

extern crate alloc;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate std;

mod error;
pub mod object;
pub mod task;

pub use self::error::*;
