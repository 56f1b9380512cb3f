//! Procedural macros for `struct-env`.
//!
//! All macros in this crate are re-exported from the `struct-env` crate. See its docs for more details
//! and the examples of usage.

// Documentation settings
#![doc(html_root_url = "https://docs.rs/struct-env-derive/0.1.0")]
// General settings
#![recursion_limit = "128"]
// Linter settings
#![allow(missing_docs)] // Adding docs here would interfere with docs in the main crate

extern crate proc_macro;

use proc_macro::TokenStream;

mod config;
mod describe;
mod utils;

#[proc_macro_derive(EnvConfig, attributes(env))]
pub fn env_config(input: TokenStream) -> TokenStream {
    describe::impl_env_config(input)
}
