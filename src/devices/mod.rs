pub mod mw100;
pub mod response;

pub use mw100::{Endpoint, ExchangeSettings, Mw100};
