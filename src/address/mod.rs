//! Email addresses and the SMTP envelope

mod envelope;
mod types;

pub use self::{
    envelope::Envelope,
    types::{Address, AddressError},
};
