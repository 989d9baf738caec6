//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Optional numeric value with an explicit disabled state: an absent key
    /// yields `default`, the literal `off` yields `None`, anything else must
    /// parse as a number.
    fn get_opt_double(&self, section: &str, key: &str, default: Option<f64>) -> Option<f64>;
    fn get_opt_int(&self, section: &str, key: &str, default: Option<i64>) -> Option<i64>;
}
