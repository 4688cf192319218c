pub mod chain;
pub mod persistence;
pub mod web;
