pub mod comparator;
pub mod projector;
pub mod schedule;
