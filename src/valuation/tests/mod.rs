mod cache;
mod common;
mod screening;
