// lib.rs
pub mod breakpoint;
pub mod breakpoint_index;
pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod paralog;
pub mod reconcile;
pub mod seqidx;
pub mod table;
