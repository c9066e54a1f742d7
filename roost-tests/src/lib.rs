mod connection;
mod generated_keys;
mod mapping;
#[cfg(not(feature = "disable-composite-keys"))]
mod membership;
mod result_set;

use crate::{
    connection::reconnection, generated_keys::generated_keys, mapping::mapping,
    result_set::result_set,
};
#[cfg(not(feature = "disable-composite-keys"))]
use membership::membership;
use log::LevelFilter;
use roost::{Connection, Driver};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Connection url from `ROOST_TEST_URL`, or `default` when not set.
pub fn test_url(default: &str) -> String {
    env::var("ROOST_TEST_URL").unwrap_or_else(|_| default.to_owned())
}

pub async fn execute_tests<D: Driver>(mut connection: Connection<D>) {
    mapping(&mut connection).await;
    generated_keys(&mut connection).await;
    #[cfg(not(feature = "disable-composite-keys"))]
    membership(&mut connection).await;
    result_set(&mut connection).await;
    reconnection(&mut connection).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
