//! RenderConfig - マネージャーの設定
//!
//! # 設定項目
//! - `cleanup_grace_period`: settle からレジストリ削除までの猶予（既定 3000ms、0 なら即削除）
//!
//! serde では `cleanup_grace_period_ms`（ミリ秒の整数）として読み書きします。
//! 環境変数 `AWAITUI_CLEANUP_GRACE_MS` からも読み込めます。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::BuildError;

pub const DEFAULT_CLEANUP_GRACE_PERIOD: Duration = Duration::from_millis(3000);

pub const CLEANUP_GRACE_ENV: &str = "AWAITUI_CLEANUP_GRACE_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(rename = "cleanup_grace_period_ms", with = "duration_ms")]
    pub cleanup_grace_period: Duration,
}

impl RenderConfig {
    pub fn with_cleanup_grace_period(mut self, grace: Duration) -> Self {
        self.cleanup_grace_period = grace;
        self
    }

    /// 環境変数から読み込む（未設定なら既定値）
    pub fn from_env() -> Result<Self, BuildError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` で変数を引いて設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BuildError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(CLEANUP_GRACE_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|e| {
                BuildError::InvalidConfig(format!("{CLEANUP_GRACE_ENV}={raw:?}: {e}"))
            })?;
            config.cleanup_grace_period = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cleanup_grace_period: DEFAULT_CLEANUP_GRACE_PERIOD,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, ser};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_grace_period_is_three_seconds() {
        assert_eq!(
            RenderConfig::default().cleanup_grace_period,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn deserializes_milliseconds() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"cleanup_grace_period_ms": 250}"#).unwrap();
        assert_eq!(config.cleanup_grace_period, Duration::from_millis(250));

        let empty: RenderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, RenderConfig::default());
    }

    #[test]
    fn serializes_milliseconds() {
        let config = RenderConfig::default().with_cleanup_grace_period(Duration::from_millis(250));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({ "cleanup_grace_period_ms": 250 }));
    }

    #[test]
    fn refuses_to_serialize_an_unrepresentable_grace_period() {
        let config = RenderConfig::default().with_cleanup_grace_period(Duration::MAX);
        assert!(serde_json::to_string(&config).is_err());
    }

    #[rstest]
    #[case::unset(None, Duration::from_millis(3000))]
    #[case::zero(Some("0"), Duration::ZERO)]
    #[case::padded(Some(" 1500 "), Duration::from_millis(1500))]
    fn reads_grace_period_from_lookup(#[case] value: Option<&str>, #[case] expected: Duration) {
        let config = RenderConfig::from_lookup(|key| {
            assert_eq!(key, CLEANUP_GRACE_ENV);
            value.map(str::to_string)
        })
        .unwrap();
        assert_eq!(config.cleanup_grace_period, expected);
    }

    #[test]
    fn rejects_non_numeric_grace_period() {
        let result = RenderConfig::from_lookup(|_| Some("soon".to_string()));
        assert!(matches!(result, Err(BuildError::InvalidConfig(msg)) if msg.contains(CLEANUP_GRACE_ENV)));
    }
}
