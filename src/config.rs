use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::workflow::{CoordinatorSettings, ProblemIdentifiers};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 根地址
    pub api_base_url: String,
    /// 后端访问令牌（Bearer）
    pub api_token: Option<String>,
    /// 自动保存的静默期（毫秒）
    pub autosave_debounce_ms: u64,
    /// 提交按钮防抖窗口（毫秒）
    pub submit_debounce_ms: u64,
    /// 被取代的加载请求是否直接中止网络请求
    pub abort_superseded: bool,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动无头浏览器（否则连接调试端口）
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 渲染表面事件轮询间隔（毫秒）
    pub event_poll_interval_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 启动时加载的题目 ---
    pub problem_id: Option<u64>,
    pub user_id: Option<u64>,
    pub workbook_id: Option<u64>,
    pub grade_id: Option<u64>,
    pub grade_instance_id: Option<u64>,
    pub read_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001/backend-api".to_string(),
            api_token: None,
            autosave_debounce_ms: 2000,
            submit_debounce_ms: 300,
            abort_superseded: true,
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            event_poll_interval_ms: 100,
            verbose_logging: false,
            problem_id: None,
            user_id: None,
            workbook_id: None,
            grade_id: None,
            grade_instance_id: None,
            read_only: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件加载，环境变量仍然优先
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let base: Config = toml::from_str(&text).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用查找函数覆盖配置项
    ///
    /// 拆出查找函数是为了测试时不必修改进程环境变量
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = self;
        let config = Self {
            api_base_url: lookup("API_BASE_URL").unwrap_or(d.api_base_url),
            api_token: lookup("API_TOKEN").or(d.api_token),
            autosave_debounce_ms: parse_var(&lookup, "AUTOSAVE_DEBOUNCE_MS", d.autosave_debounce_ms)?,
            submit_debounce_ms: parse_var(&lookup, "SUBMIT_DEBOUNCE_MS", d.submit_debounce_ms)?,
            abort_superseded: parse_var(&lookup, "ABORT_SUPERSEDED", d.abort_superseded)?,
            browser_debug_port: parse_var(&lookup, "BROWSER_DEBUG_PORT", d.browser_debug_port)?,
            headless: parse_var(&lookup, "HEADLESS", d.headless)?,
            chrome_executable: lookup("CHROME_EXECUTABLE").or(d.chrome_executable),
            event_poll_interval_ms: parse_var(&lookup, "EVENT_POLL_INTERVAL_MS", d.event_poll_interval_ms)?,
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", d.verbose_logging)?,
            problem_id: parse_opt_var(&lookup, "PROBLEM_ID", d.problem_id)?,
            user_id: parse_opt_var(&lookup, "USER_ID", d.user_id)?,
            workbook_id: parse_opt_var(&lookup, "WORKBOOK_ID", d.workbook_id)?,
            grade_id: parse_opt_var(&lookup, "GRADE_ID", d.grade_id)?,
            grade_instance_id: parse_opt_var(&lookup, "GRADE_INSTANCE_ID", d.grade_instance_id)?,
            read_only: parse_var(&lookup, "READ_ONLY", d.read_only)?,
        };
        config.validate()
    }

    /// 检查取值范围
    fn validate(self) -> Result<Self, ConfigError> {
        if self.event_poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_poll_interval_ms",
                reason: "轮询间隔必须大于 0".to_string(),
            });
        }
        Ok(self)
    }

    /// 协调器的时间与取消策略
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            autosave_debounce: Duration::from_millis(self.autosave_debounce_ms),
            submit_debounce: Duration::from_millis(self.submit_debounce_ms),
            abort_superseded: self.abort_superseded,
        }
    }

    /// 启动时要加载的题目（未配置 PROBLEM_ID 时为 None）
    pub fn startup_problem(&self) -> Option<ProblemIdentifiers> {
        let problem_id = self.problem_id?;
        Some(ProblemIdentifiers {
            user_id: self.user_id,
            workbook_id: self.workbook_id,
            grade_id: self.grade_id,
            grade_instance_id: self.grade_instance_id,
            read_only: self.read_only,
            ..ProblemIdentifiers::new(problem_id)
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: name.to_string(),
            value: raw,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_opt_var<T, F>(lookup: &F, name: &str, default: Option<T>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_debounce_windows() {
        let settings = Config::default().coordinator_settings();
        assert_eq!(settings.autosave_debounce, Duration::from_millis(2000));
        assert_eq!(settings.submit_debounce, Duration::from_millis(300));
        assert!(settings.abort_superseded);
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = Config::default()
            .with_overrides(lookup_from(&[
                ("AUTOSAVE_DEBOUNCE_MS", "500"),
                ("PROBLEM_ID", "42"),
                ("GRADE_INSTANCE_ID", "7"),
                ("READ_ONLY", "true"),
            ]))
            .unwrap();

        assert_eq!(config.autosave_debounce_ms, 500);
        let ids = config.startup_problem().unwrap();
        assert_eq!(ids.problem_id, 42);
        assert_eq!(ids.grade_instance_id, Some(7));
        assert!(ids.read_only);
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = Config::default()
            .with_overrides(lookup_from(&[("SUBMIT_DEBOUNCE_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "SUBMIT_DEBOUNCE_MS"
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = Config::default()
            .with_overrides(lookup_from(&[("EVENT_POLL_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field, .. } if field == "event_poll_interval_ms"
        ));

        let config: Config = toml::from_str("event_poll_interval_ms = 0").unwrap();
        assert!(config.with_overrides(lookup_from(&[])).is_err());
    }

    #[test]
    fn toml_fields_are_optional() {
        let config: Config = toml::from_str(
            r#"
            api_base_url = "https://example.test/api"
            problem_id = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://example.test/api");
        assert_eq!(config.submit_debounce_ms, 300);
        assert!(config.startup_problem().is_some());
    }
}
