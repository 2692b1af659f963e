//! Configuration access port trait.

use rust_decimal::Decimal;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Exact decimal value; `None` if missing or not a decimal.
    fn get_decimal(&self, section: &str, key: &str) -> Option<Decimal>;
}
