pub mod resolv_conf;

pub use resolv_conf::{ResolvConf, RESOLV_CONF_PATH};
