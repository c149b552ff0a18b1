//! Destination files: creation, preallocation and positioned writes.
//!
//! A prepared download's file is created and preallocated to its full size
//! (fallocate on Unix when available, else set_len) before any byte is
//! written, so concurrent leaves can `pwrite` into it without growing it.

mod builder;
mod writer;

pub use builder::StorageWriterBuilder;
pub use writer::StorageWriter;
