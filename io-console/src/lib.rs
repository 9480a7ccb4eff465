//! Task/state core of a small I/O console device.
//!
//! Four digital inputs, four digital outputs and one analog channel are
//! mirrored into a shared state table by periodic tasks, while a serial
//! line protocol lets an operator query that state, drive the outputs and
//! retune every task's period at run time.
//!
//! Nothing in here touches hardware: pins, the ADC and the UART are reached
//! through the traits in [`hal`], and every guarded field group is accessed
//! through an RTIC [`Mutex`](sync::Mutex) so the same code runs on RTIC
//! resource proxies and on plain [`Exclusive`](sync::Exclusive) borrows.
#![no_std]
#![deny(unsafe_code)]

pub mod analog;
pub mod assembler;
pub mod command;
pub mod config;
pub mod error;
pub mod hal;
pub mod presenter;
pub mod schedule;
pub mod state;
pub mod sync;
pub mod tasks;

pub use assembler::{Feed, Line, LineAssembler};
pub use command::{Bindings, Command, Machine, Reply};
pub use presenter::Transcript;
pub use schedule::{Period, Release, TaskKind, TaskPeriods, Wake};
pub use state::{AnalogReading, Channel, InputBank, OutputBank};
pub use sync::{Mailbox, PendingOutputs};
