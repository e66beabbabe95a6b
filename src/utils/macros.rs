/// Runs `$block` and logs its wall time at debug level under `$block_name`.
#[macro_export]
macro_rules! time_block {
    ($block_name:expr, $block:block) => {{
        let start = ::std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        $crate::log_debug!("Stage '{}' finished in {:.2?}", $block_name, duration);
        result
    }};
}
