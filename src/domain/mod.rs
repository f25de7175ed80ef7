// Domain layer: core models, provider response shapes and ports (interfaces).

pub mod model;
pub mod ports;
pub mod provider;
