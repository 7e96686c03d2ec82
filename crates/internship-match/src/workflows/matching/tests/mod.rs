mod allocation;
mod common;
mod scoring;
