pub mod membership;
pub mod pin_table;
pub mod voters;
