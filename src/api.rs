pub mod client;
pub mod octopus;
pub mod tado;
