/// Test utility module
pub mod test;
