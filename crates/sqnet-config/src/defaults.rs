//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `sqnet_core::defaults`.

use sqnet_core::defaults;
use sqnet_pan::IsdAsn;

/// Generate default value functions that forward to sqnet_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_max_idle_timeout_secs => DEFAULT_MAX_IDLE_TIMEOUT_SECS: u64,
    default_keep_alive_secs       => DEFAULT_KEEP_ALIVE_SECS: u64,
    default_path_mtu              => DEFAULT_PATH_MTU: u16,
}

default_string_fns! {
    default_alpn => DEFAULT_ALPN,
}

pub(crate) fn default_local_ia() -> IsdAsn {
    defaults::DEFAULT_LOCAL_IA
        .parse()
        .unwrap_or(IsdAsn::WILDCARD)
}

pub(crate) fn default_listen() -> String {
    format!("{}:{}", defaults::DEFAULT_CLI_HOST, defaults::DEFAULT_CLI_PORT)
}
