pub mod participant;
pub mod request;
