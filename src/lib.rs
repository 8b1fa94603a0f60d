pub mod candidates;
pub mod commands;
pub mod consistency;
pub mod forge;
pub mod http;
pub mod retry;
pub mod rewrite;
pub mod runtime;
pub mod tools;
pub mod workflow;
