pub mod aio;
