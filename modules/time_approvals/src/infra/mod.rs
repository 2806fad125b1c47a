pub mod push;
pub mod scheduler;
pub mod storage;
