//! The copy engine behind fits-sync: finding capture sessions, working out
//! where they go, and moving finished frames across while the camera is
//! still shooting.
//!
pub mod decision;
pub mod file_copier;
pub mod macros;
pub mod poll_loop;
pub mod resolver;
pub mod rules;
pub mod scanner;
pub mod types;

#[cfg(test)]
pub mod test_helper;
