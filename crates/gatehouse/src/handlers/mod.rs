pub mod identicon;
pub mod proxy;
pub mod response;
pub mod tracks;

#[cfg(test)]
mod integration_tests;
