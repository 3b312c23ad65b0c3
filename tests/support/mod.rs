#![allow(dead_code)]

pub mod airline;
pub mod data_env;
