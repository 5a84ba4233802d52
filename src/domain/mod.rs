// Domain layer: models, the cart, request/session types and ports (interfaces).

pub mod cart;
pub mod model;
pub mod ports;
pub mod request;
