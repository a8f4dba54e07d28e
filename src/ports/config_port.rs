//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
    /// All `key = value` pairs of `section` in file order; empty if absent.
    fn entries(&self, section: &str) -> Vec<(String, String)>;
}
