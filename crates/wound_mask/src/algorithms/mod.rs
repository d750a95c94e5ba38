pub mod fallback;
pub mod periwound;
pub mod validation;

pub use fallback::*;
pub use periwound::*;
pub use validation::*;
