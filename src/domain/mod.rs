// Domain layer: entities, the vehicle sum type and ports (interfaces).

pub mod model;
pub mod ports;
pub mod vehicle;
