pub use roost_core::*;
