//! 题目表单快照
//!
//! 渲染表面里表单字段的一次读取结果，用于脏检查和构造提交载荷

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::submit_action::SubmitControl;

/// 渲染器自己维护的 `previous_*` 簿记字段，不参与脏检查
static BOOKKEEPING_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^previous_").expect("合法的正则"));

/// 是否为 `previous_*` 簿记字段
pub fn is_bookkeeping_field(name: &str) -> bool {
    BOOKKEEPING_FIELD.is_match(name)
}

/// 表单字段快照
///
/// 字段名有序存储，因此比较时与字段在页面中的顺序无关；
/// 同名字段（复选框等）保留各自的取值顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (name, value) 列表构造
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut snapshot = Self::new();
        for (name, value) in pairs {
            snapshot.insert(name, value);
        }
        snapshot
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// 作答字段（去掉簿记字段）
    pub fn answers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .filter(|(name, _)| !is_bookkeeping_field(name))
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// 作答内容是否一致（忽略簿记字段）
    pub fn same_answers(&self, other: &FormSnapshot) -> bool {
        self.answers().eq(other.answers())
    }

    /// 附加被点击的提交控件，得到提交载荷
    pub fn with_control(&self, control: &SubmitControl) -> FormSnapshot {
        let mut payload = self.clone();
        payload.fields.insert(control.name.clone(), vec![control.value.clone()]);
        payload
    }

    /// 逐个 (name, value) 遍历，用于 multipart 表单
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// 转换为 JSON 对象：单值字段为字符串，多值字段为数组
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, values) in &self.fields {
            let value = match values.as_slice() {
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            map.insert(name.clone(), value);
        }
        Value::Object(map)
    }
}
