mod partition;
mod unit;

pub(crate) use partition::Partition;
pub(crate) use unit::Unit;
