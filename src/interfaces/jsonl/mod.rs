pub mod command_reader;
pub mod event_writer;
pub mod session;
