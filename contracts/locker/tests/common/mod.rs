pub mod contracts;
pub mod helper;
