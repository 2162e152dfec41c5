pub mod access;
pub mod statement;
pub mod storage;
