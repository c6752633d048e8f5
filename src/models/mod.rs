pub mod distribution;
pub mod kpi;
pub mod pickup;
pub mod property;

pub use distribution::*;
pub use kpi::*;
pub use pickup::*;
pub use property::*;
