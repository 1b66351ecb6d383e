// Storage layer
// User documents live behind the PHP file-serving bridge.

pub mod php_bridge;

pub use php_bridge::*;
