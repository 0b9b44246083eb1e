//! 题目上下文
//!
//! 封装"当前显示的是哪道题、哪次作答"这一信息

use std::fmt::Display;

/// 预览参数（临时路径或源码，不对应已存储的题目）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewParams {
    /// 题目文件路径
    pub problem_path: Option<String>,
    /// 内联题目源码
    pub problem_source: Option<String>,
    /// 随机种子
    pub seed: u64,
    pub show_hints: bool,
    pub show_solutions: bool,
}

/// 自动保存写入的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    /// 单次作答（试卷 / 版本）
    GradeInstance(u64),
    /// 题目成绩
    Grade(u64),
}

/// 题目标识
///
/// 必须能唯一定位后端的一个资源：要么是已存储的题目，要么是预览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemIdentifiers {
    /// 题目ID
    pub problem_id: u64,
    /// 查看他人作答时的用户ID
    pub user_id: Option<u64>,
    /// 作答记录（workbook）ID
    pub workbook_id: Option<u64>,
    /// 成绩ID
    pub grade_id: Option<u64>,
    /// 作答版本（grade instance）ID
    pub grade_instance_id: Option<u64>,
    /// 只读
    pub read_only: bool,
    /// 显示正确答案
    pub show_correct_answers: bool,
    /// 预览参数，存在时走预览接口
    pub preview: Option<PreviewParams>,
}

impl ProblemIdentifiers {
    pub fn new(problem_id: u64) -> Self {
        Self {
            problem_id,
            user_id: None,
            workbook_id: None,
            grade_id: None,
            grade_instance_id: None,
            read_only: false,
            show_correct_answers: false,
            preview: None,
        }
    }

    /// 预览某个题目文件
    pub fn preview(problem_id: u64, params: PreviewParams) -> Self {
        Self {
            preview: Some(params),
            ..Self::new(problem_id)
        }
    }

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// 请求键的第二部分：作答版本优先，其次 workbook
    pub fn attempt_key(&self) -> Option<u64> {
        self.grade_instance_id.or(self.workbook_id)
    }

    /// 自动保存目标；预览和只读视图没有目标
    pub fn save_target(&self) -> Option<SaveTarget> {
        if self.read_only || self.is_preview() {
            return None;
        }
        self.grade_instance_id
            .map(SaveTarget::GradeInstance)
            .or(self.grade_id.map(SaveTarget::Grade))
    }
}

impl Display for ProblemIdentifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.preview, self.attempt_key()) {
            (Some(p), _) => write!(f, "[题目 #{} 预览 seed#{}]", self.problem_id, p.seed),
            (None, Some(attempt)) => write!(f, "[题目 #{} 作答#{}]", self.problem_id, attempt),
            (None, None) => write!(f, "[题目 #{}]", self.problem_id),
        }
    }
}
