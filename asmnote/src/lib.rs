pub mod annotate;
pub mod args;
pub mod constant;
pub mod error;
pub mod heap;
pub mod index;
pub mod objdump;
pub mod run;
pub mod samples;
pub mod symbols;

#[cfg(test)]
mod samples_test;
