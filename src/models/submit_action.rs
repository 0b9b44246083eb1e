use phf::phf_map;

/// 提交控件的语义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SubmitAction {
    /// 提交评分（唯一会计入成绩的控件）
    SubmitForGrade,
    /// 预览答案
    PreviewAnswers,
    /// 检查答案
    CheckAnswers,
    /// 显示正确答案
    ShowCorrectAnswers,
    /// 其他控件：只保存当前作答状态
    SaveState,
}

static KNOWN_CONTROLS: phf::Map<&'static str, SubmitAction> = phf_map! {
    "submitAnswers" => SubmitAction::SubmitForGrade,
    "previewAnswers" => SubmitAction::PreviewAnswers,
    "checkAnswers" => SubmitAction::CheckAnswers,
    "showCorrectAnswers" => SubmitAction::ShowCorrectAnswers,
};

impl SubmitAction {
    /// 评分提交控件的表单字段名
    pub const GRADE_CONTROL_NAME: &'static str = "submitAnswers";

    /// 根据控件名解析（未知控件视为保存状态）
    pub fn from_control_name(name: &str) -> Self {
        KNOWN_CONTROLS
            .get(name)
            .copied()
            .unwrap_or(SubmitAction::SaveState)
    }

    /// 是否计入成绩
    pub fn is_grade_submission(self) -> bool {
        self == SubmitAction::SubmitForGrade
    }

    /// 日志里使用的名称
    pub fn name(self) -> &'static str {
        match self {
            SubmitAction::SubmitForGrade => "提交评分",
            SubmitAction::PreviewAnswers => "预览答案",
            SubmitAction::CheckAnswers => "检查答案",
            SubmitAction::ShowCorrectAnswers => "显示答案",
            SubmitAction::SaveState => "保存状态",
        }
    }
}

impl std::fmt::Display for SubmitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 用户触发的提交控件（name/value）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitControl {
    pub name: String,
    pub value: String,
}

impl SubmitControl {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn action(&self) -> SubmitAction {
        SubmitAction::from_control_name(&self.name)
    }
}
