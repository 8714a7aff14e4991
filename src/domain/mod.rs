// Domain layer: dataset model and ports. No database or logging backends here.

pub mod model;
pub mod ports;
