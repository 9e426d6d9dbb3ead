pub mod extractor;
pub mod input;
pub mod jwt;
pub mod test_utils;
