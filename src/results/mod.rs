pub mod normalize;
pub mod parser;
