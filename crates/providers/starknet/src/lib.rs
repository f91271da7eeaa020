#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod errors;
pub use errors::ProviderBuildError;

mod rpc;
pub use rpc::{FunctionCall, StarknetFieldProvider};

mod fixed;
pub use fixed::{DEFAULT_BASE_FEE, DEFAULT_GAS_LIMIT, StaticFieldProvider};
