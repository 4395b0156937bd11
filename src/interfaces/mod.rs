//! Input and output codecs used by the binary.

pub mod csv;
pub mod jsonl;
