pub const CONFIG_ENV_PREFIX: &str = "ACCOUNTS";
pub const CONFIG_ENV_SEPARATOR: &str = "__";
pub const BASE_CONFIG_FILE: &str = "config/base";
pub const LOCAL_CONFIG_FILE: &str = "config/local";

pub mod env {
    pub const ACCESS_TOKEN_SECRET_ENV_VAR: &str = "ACCOUNTS__AUTH__ACCESS_TOKEN__SECRET";
    pub const REFRESH_TOKEN_SECRET_ENV_VAR: &str = "ACCOUNTS__AUTH__REFRESH_TOKEN__SECRET";
    pub const DATABASE_URL_ENV_VAR: &str = "ACCOUNTS__POSTGRES__URL";
    pub const POSTMARK_AUTH_TOKEN_ENV_VAR: &str = "ACCOUNTS__EMAIL_CLIENT__AUTH_TOKEN";
}

pub mod defaults {
    pub const ACCESS_TOKEN_TTL_IN_SECONDS: i64 = 15 * 60;
    pub const REFRESH_TOKEN_TTL_IN_SECONDS: i64 = 7 * 24 * 60 * 60;
    pub const VERIFICATION_TOKEN_TTL_IN_SECONDS: i64 = 24 * 60 * 60;
    pub const MAX_TIME_TO_LIVE_IN_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

    pub const HASH_MEMORY_COST_KIB: u32 = 15000;
    pub const HASH_ITERATIONS: u32 = 2;
    pub const HASH_PARALLELISM: u32 = 1;

    pub mod email_client {
        pub const BASE_URL: &str = "https://api.postmarkapp.com/";
        pub const TIMEOUT_IN_MILLIS: u64 = 10_000;
    }
}
