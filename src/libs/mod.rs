pub mod error;
pub mod group;
pub mod io;
pub mod polish;
pub mod report;
pub mod select;
pub mod stream;
