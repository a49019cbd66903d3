use std::fmt::Debug;

/// Arguments for one remote call; [`Debug`] doubles as the item identifier in failure records
pub trait RequestItem: Send + Debug {}
impl<T: Send + Debug> RequestItem for T {}

/// Value produced by one successful remote call
pub trait ResponseItem: Send {}
impl<T: Send> ResponseItem for T {}
