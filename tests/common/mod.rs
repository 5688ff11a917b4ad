#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use simple_auth::services::auth::{Claims, Clock, FrozenClock};

pub const RSA_A_PRIVATE: &str = include_str!("../fixtures/rsa_a_private.pem");
pub const RSA_A_PUBLIC: &str = include_str!("../fixtures/rsa_a_public.pem");
pub const RSA_B_PRIVATE: &str = include_str!("../fixtures/rsa_b_private.pem");
pub const RSA_B_PUBLIC: &str = include_str!("../fixtures/rsa_b_public.pem");
pub const EC_PRIVATE: &str = include_str!("../fixtures/ec_private.pem");
pub const EC_PUBLIC: &str = include_str!("../fixtures/ec_public.pem");

// 2021-02-06T03:36:00Z
pub const NOW: i64 = 1_612_582_560;

pub fn frozen_clock() -> (Arc<FrozenClock>, Arc<dyn Clock>) {
    let clock = Arc::new(FrozenClock::at_timestamp(NOW));
    let shared: Arc<dyn Clock> = clock.clone();
    (clock, shared)
}

pub fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        _ => panic!("claims must be an object"),
    }
}
