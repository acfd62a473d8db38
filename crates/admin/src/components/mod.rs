//! Reusable UI building blocks shared by several pages.

pub mod data_table;
