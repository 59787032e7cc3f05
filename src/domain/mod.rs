pub mod department;
pub mod principal;
pub mod assignment;
pub mod payment;
pub mod announcement;
pub mod report;

pub use department::*;
pub use principal::*;
pub use assignment::*;
pub use payment::*;
pub use announcement::*;
pub use report::*;
