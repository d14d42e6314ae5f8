mod feed;
mod match_record;

pub use feed::*;
pub use match_record::*;
