/// Prints only when the given config (or anything else with a `verbose` field) asks for it.
#[macro_export]
macro_rules! verbose {
    ($config:expr, $($arg:tt)*) => {
        if $config.verbose {
            println!($($arg)*);
        }
    };
}
