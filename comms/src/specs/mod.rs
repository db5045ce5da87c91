pub mod diagram;
pub mod job;
