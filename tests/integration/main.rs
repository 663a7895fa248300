//! Integration tests for usbreplay

mod cli_test;
mod convert_test;
