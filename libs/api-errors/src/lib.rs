//! Problem Details (RFC 9457) rendering and a static error catalog helper.
use axum::http::StatusCode;

pub mod problem;

pub use problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};

/// Static error definition from a module's error catalog.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Build a `Problem` for this definition with an occurrence-specific detail.
    #[inline]
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail.into(),
        )
        .with_code(self.code)
        .with_type(self.type_url)
    }

    /// Same as [`ErrDef::to_problem`], wrapped for direct use as an axum response.
    pub fn respond(&self, detail: impl Into<String>, instance: &str) -> ProblemResponse {
        let problem = self.to_problem(detail).with_instance(instance);
        let problem = match tracing::Span::current().id() {
            Some(id) => problem.with_trace_id(id.into_u64().to_string()),
            None => problem,
        };
        ProblemResponse(problem)
    }
}
