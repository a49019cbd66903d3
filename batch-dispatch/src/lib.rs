//! ```rust
//! use batch_dispatch::{DispatchError, Dispatcher};
//!
//! fn main() -> Result<(), DispatchError> {
//!   let report = Dispatcher::new(2)?
//!     .with_label("times_ten")
//!     .dispatch(vec![1, 2, 3, 4, 5], |x: &i32| {
//!       if *x == 3 {
//!         Err(format!("{} is unlucky", x))
//!       } else {
//!         Ok(x * 10)
//!       }
//!     })?;
//!
//!   // worker 0 gets [1, 3, 5], worker 1 gets [2, 4]; item 3 is logged and dropped
//!   assert_eq!(report.succeeded(), 4);
//!   assert_eq!(report.failures[0].item, 3);
//!
//!   Ok(())
//! }
//! ```

pub mod batch;
mod dispatcher;
mod error;
mod item;
pub mod report;
pub mod task;
mod worker;

pub use batch::{partition, Batch};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use item::{RequestItem, ResponseItem};
pub use report::{DispatchReport, ItemFailure, WorkerFailure, WorkerFault};
pub use task::WorkerOutcome;
