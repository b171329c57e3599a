// Interface adapters: marker store access, outbound clients and the HTTP surface.

pub mod clients;
pub mod routes;
pub mod source;
