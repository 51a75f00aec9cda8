pub mod elapsed;
