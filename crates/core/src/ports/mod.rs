mod flattener;
mod sink;
mod source;

pub use flattener::*;
pub use sink::*;
pub use source::*;
