pub mod client_addr;
