//! Byte-stream plumbing for build contexts
//!
//! `JoinedReader` concatenates heterogeneous sources lazily; `tarball`
//! synthesizes tar entries without going through a full archive writer.

pub mod joined;
pub mod tarball;

pub use joined::{join, ByteSource, JoinedReader};
