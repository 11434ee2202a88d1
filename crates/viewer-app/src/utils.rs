//! ユーティリティ

use env_logger::Env;

/// ロガーを初期化する。`RUST_LOG`未設定時は`info`
///
/// 二回目以降の呼び出しは何もしない
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        log::info!("logger ready");
    }
}
