//! Phone shopping assistant: extraction and validation of untrusted model and
//! tool output, plus the chat and recommendation programs built on top of it.

pub mod assistant;
pub mod extract;
pub mod recommend;
pub mod shared;
