//! 题目后端 API 客户端
//!
//! 封装所有与渲染 / 提交 / 保存相关的后端调用

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::wire::{Envelope, RendererPayload, UpdatePayload};
use crate::models::{FormSnapshot, RenderedProblem, SaveOutcome};
use crate::workflow::problem_ctx::{PreviewParams, ProblemIdentifiers, SaveTarget};

/// 协调器依赖的后端能力
#[async_trait]
pub trait ProblemApi: Send + Sync {
    /// 渲染已存储的题目
    async fn render_stored(&self, ids: &ProblemIdentifiers) -> AppResult<RenderedProblem>;

    /// 渲染预览，可附带已提交的表单
    async fn render_preview(
        &self,
        params: &PreviewParams,
        form: Option<&FormSnapshot>,
    ) -> AppResult<RenderedProblem>;

    /// 提交作答（multipart），返回重新渲染的题目
    async fn submit(
        &self,
        ids: &ProblemIdentifiers,
        payload: &FormSnapshot,
    ) -> AppResult<RenderedProblem>;

    /// 保存当前作答状态
    async fn save_state(&self, target: SaveTarget, form: &FormSnapshot) -> AppResult<SaveOutcome>;
}

/// 基于 reqwest 的实现
pub struct HttpProblemApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpProblemApi {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 发送请求并解析响应外壳
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> AppResult<Option<T>> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let envelope: Envelope<T> = parse_envelope(endpoint, response).await?;
        Ok(envelope.data)
    }

    async fn send_rendered(&self, endpoint: &str, builder: RequestBuilder) -> AppResult<RenderedProblem> {
        let payload: Option<RendererPayload> = self.send(endpoint, builder).await?;
        let markup = payload
            .and_then(RendererPayload::into_markup)
            .ok_or_else(|| {
                AppError::Api(ApiError::MissingField {
                    endpoint: endpoint.to_string(),
                    field: "rendererData.renderedHTML",
                })
            })?;
        debug!("{} 返回 {} 字节的题目内容", endpoint, markup.len());
        Ok(RenderedProblem::new(markup))
    }
}

#[async_trait]
impl ProblemApi for HttpProblemApi {
    async fn render_stored(&self, ids: &ProblemIdentifiers) -> AppResult<RenderedProblem> {
        let endpoint = format!("courses/question/{}", ids.problem_id);
        let builder = self
            .client
            .get(self.url(&endpoint))
            .query(&stored_query(ids, true));
        self.send_rendered(&endpoint, builder).await
    }

    async fn render_preview(
        &self,
        params: &PreviewParams,
        form: Option<&FormSnapshot>,
    ) -> AppResult<RenderedProblem> {
        let endpoint = "utility/problem-preview";
        let body = preview_body(params, form);
        let builder = self.client.post(self.url(endpoint)).json(&body);
        self.send_rendered(endpoint, builder).await
    }

    async fn submit(
        &self,
        ids: &ProblemIdentifiers,
        payload: &FormSnapshot,
    ) -> AppResult<RenderedProblem> {
        let endpoint = format!("courses/question/{}", ids.problem_id);
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in payload.pairs() {
            form = form.text(name.to_string(), value.to_string());
        }
        let builder = self
            .client
            .post(self.url(&endpoint))
            .query(&stored_query(ids, false))
            .multipart(form);
        self.send_rendered(&endpoint, builder).await
    }

    async fn save_state(&self, target: SaveTarget, form: &FormSnapshot) -> AppResult<SaveOutcome> {
        let endpoint = match target {
            SaveTarget::GradeInstance(id) => format!("courses/question/grade-instance/{}", id),
            SaveTarget::Grade(id) => format!("courses/question/grade/{}", id),
        };
        let builder = self
            .client
            .put(self.url(&endpoint))
            .json(&json!({ "currentProblemState": form.to_json() }));
        let payload: Option<UpdatePayload> = self.send(&endpoint, builder).await?;
        Ok(SaveOutcome {
            updates_count: payload.unwrap_or_default().updates_count,
        })
    }
}

/// 根据标识选择预览或已存储题目的渲染接口
pub async fn render_for(api: &dyn ProblemApi, ids: &ProblemIdentifiers) -> AppResult<RenderedProblem> {
    match &ids.preview {
        Some(params) => api.render_preview(params, None).await,
        None => api.render_stored(ids).await,
    }
}

/// 已存储题目的查询参数
fn stored_query(ids: &ProblemIdentifiers, rendering: bool) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(user_id) = ids.user_id {
        query.push(("userId", user_id.to_string()));
    }
    if let Some(workbook_id) = ids.workbook_id {
        query.push(("workbookId", workbook_id.to_string()));
    }
    if let Some(instance_id) = ids.grade_instance_id {
        query.push(("studentTopicAssessmentInfoId", instance_id.to_string()));
    }
    if rendering {
        query.push(("readonly", ids.read_only.to_string()));
        query.push(("showCorrectAnswers", ids.show_correct_answers.to_string()));
    }
    query
}

fn preview_body(params: &PreviewParams, form: Option<&FormSnapshot>) -> Value {
    let mut body = json!({
        "problemSeed": params.seed,
        "showHints": params.show_hints,
        "showSolutions": params.show_solutions,
    });
    if let Some(path) = &params.problem_path {
        body["problemPath"] = json!(path);
    }
    if let Some(source) = &params.problem_source {
        body["problemSource"] = json!(source);
    }
    if let Some(form) = form {
        body["formData"] = form.to_json();
    }
    body
}

/// 检查状态码并解析响应外壳
async fn parse_envelope<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<Envelope<T>> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AppError::api_request_failed(endpoint, e))?;

    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<Value>>(&text)
            .ok()
            .and_then(|e| e.message);
        return Err(AppError::bad_response(endpoint, status.as_u16(), message));
    }

    Ok(serde_json::from_str(&text)?)
}
