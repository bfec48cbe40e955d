//! Parameter binding: resolving named, typed handler parameters from request
//! data.
//!
//! A dynamically bound handler declares its parameters as [`ParamSpec`]s.
//! For each one the [`Binder`] walks an ordered list of [`BindSource`]s and
//! the first source to produce a value wins; the raw text is then converted
//! to the declared [`ParamKind`]. Built-in priority, highest first:
//!
//! 1. query-string or urlencoded-form-body value, by name
//! 2. named arguments extracted by the router from path segments, by name
//! 3. cookie, by name
//! 4. framework objects, by type — a [`ParamKind::Request`] parameter
//!    receives a clone of the current request
//!
//! Custom sources append after the built-ins and never disturb their
//! priority. A parameter no source resolves — or a value that does not
//! convert — is a [`BindError`]: the invocation fails loudly rather than
//! passing a default.

use std::fmt;
use std::sync::Arc;

use crate::request::Request;

// ── Parameter descriptors ────────────────────────────────────────────────────

/// The kind a parameter binds as.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamKind {
    Text,
    Int,
    Float,
    Bool,
    /// Bound by type, not name: a clone of the current request.
    Request,
}

impl ParamKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Request => "request",
        }
    }
}

/// A declared handler parameter: a name plus the kind it binds as.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
}

impl ParamSpec {
    pub fn text(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ParamKind::Text }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ParamKind::Int }
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ParamKind::Float }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ParamKind::Bool }
    }

    pub fn request(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ParamKind::Request }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// A resolved argument, converted to the parameter's declared kind.
#[derive(Debug)]
pub enum BoundArg {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Request(Request),
}

impl BoundArg {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Self::Request(request) => Some(request),
            _ => None,
        }
    }
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// What a source yields: raw text still to be converted, or an argument
/// already in its final form (the framework-object source).
pub enum BindValue {
    Raw(String),
    Ready(BoundArg),
}

/// One strategy for resolving a parameter from the incoming request.
///
/// Sources are stateless and queried in a fixed, explicitly ordered list, so
/// binding is reproducible; the first source to return `Some` wins.
pub trait BindSource: Send + Sync {
    /// Short identifier used in error messages.
    fn name(&self) -> &'static str;

    fn resolve(&self, request: &Request, param: &ParamSpec) -> Option<BindValue>;
}

/// Query-string value, then urlencoded form body. The body is parsed lazily,
/// only when this source runs and the query misses.
struct FormSource;

impl BindSource for FormSource {
    fn name(&self) -> &'static str {
        "form"
    }

    fn resolve(&self, request: &Request, param: &ParamSpec) -> Option<BindValue> {
        request
            .query_value(param.name())
            .or_else(|| request.form_value(param.name()))
            .map(BindValue::Raw)
    }
}

/// Named arguments attached by the router after matching path segments.
struct ArgsSource;

impl BindSource for ArgsSource {
    fn name(&self) -> &'static str {
        "args"
    }

    fn resolve(&self, request: &Request, param: &ParamSpec) -> Option<BindValue> {
        request
            .param(param.name())
            .map(|value| BindValue::Raw(value.to_owned()))
    }
}

struct CookieSource;

impl BindSource for CookieSource {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn resolve(&self, request: &Request, param: &ParamSpec) -> Option<BindValue> {
        request.cookie(param.name()).map(BindValue::Raw)
    }
}

/// Framework objects matched by type-compatibility, not name.
struct FrameworkSource;

impl BindSource for FrameworkSource {
    fn name(&self) -> &'static str {
        "framework"
    }

    fn resolve(&self, request: &Request, param: &ParamSpec) -> Option<BindValue> {
        match param.kind() {
            ParamKind::Request => Some(BindValue::Ready(BoundArg::Request(request.clone()))),
            _ => None,
        }
    }
}

// ── Binder ───────────────────────────────────────────────────────────────────

/// Resolves handler parameters by trying an ordered list of sources.
#[derive(Clone)]
pub struct Binder {
    sources: Vec<Arc<dyn BindSource>>,
}

impl Default for Binder {
    fn default() -> Self {
        Self {
            sources: vec![
                Arc::new(FormSource),
                Arc::new(ArgsSource),
                Arc::new(CookieSource),
                Arc::new(FrameworkSource),
            ],
        }
    }
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a custom source after the built-ins.
    pub fn push_source(&mut self, source: impl BindSource + 'static) {
        self.sources.push(Arc::new(source));
    }

    /// Resolves one parameter: first source to succeed wins, its raw value
    /// converted to the declared kind.
    pub fn bind(&self, request: &Request, param: &ParamSpec) -> Result<BoundArg, BindError> {
        for source in &self.sources {
            match source.resolve(request, param) {
                Some(BindValue::Ready(arg)) => return Ok(arg),
                Some(BindValue::Raw(raw)) => return convert(raw, param, source.name()),
                None => {}
            }
        }
        Err(BindError::unresolved(param))
    }

    /// Resolves every declared parameter, in declaration order.
    pub fn bind_all(
        &self,
        request: &Request,
        params: &[ParamSpec],
    ) -> Result<Vec<BoundArg>, BindError> {
        params.iter().map(|param| self.bind(request, param)).collect()
    }
}

fn convert(raw: String, param: &ParamSpec, source: &'static str) -> Result<BoundArg, BindError> {
    let converted = match param.kind() {
        ParamKind::Text => Some(BoundArg::Text(raw.clone())),
        ParamKind::Int => raw.parse().ok().map(BoundArg::Int),
        ParamKind::Float => raw.parse().ok().map(BoundArg::Float),
        ParamKind::Bool => raw.parse().ok().map(BoundArg::Bool),
        // A name collision resolved text for a by-type parameter.
        ParamKind::Request => None,
    };
    converted.ok_or_else(|| BindError::conversion(param, raw, source))
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// A required parameter could not be resolved or converted.
///
/// Surfaced loudly at the moment of invocation — a misconfigured handler
/// signature is a programmer error and is never papered over with a default
/// value.
#[derive(Debug)]
pub struct BindError {
    param: String,
    detail: Detail,
}

#[derive(Debug)]
enum Detail {
    Unresolved,
    Conversion {
        raw: String,
        kind: ParamKind,
        source: &'static str,
    },
}

impl BindError {
    fn unresolved(param: &ParamSpec) -> Self {
        Self { param: param.name().to_owned(), detail: Detail::Unresolved }
    }

    fn conversion(param: &ParamSpec, raw: String, source: &'static str) -> Self {
        Self {
            param: param.name().to_owned(),
            detail: Detail::Conversion { raw, kind: param.kind(), source },
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Detail::Unresolved => {
                write!(f, "no binding source resolved parameter `{}`", self.param)
            }
            Detail::Conversion { raw, kind, source } => write!(
                f,
                "source `{source}` resolved parameter `{}` to {raw:?}, which is not a valid {}",
                self.param,
                kind.as_str(),
            ),
        }
    }
}

impl std::error::Error for BindError {}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn query_beats_router_args_beats_cookie() {
        let binder = Binder::new();
        let param = ParamSpec::text("name");

        let all_three = Request::new(Method::GET, "/?name=query")
            .with_param("name", "args")
            .with_header("cookie", "name=cookie");
        let arg = binder.bind(&all_three, &param).unwrap();
        assert_eq!(arg.as_text(), Some("query"));

        let args_and_cookie = Request::new(Method::GET, "/")
            .with_param("name", "args")
            .with_header("cookie", "name=cookie");
        let arg = binder.bind(&args_and_cookie, &param).unwrap();
        assert_eq!(arg.as_text(), Some("args"));

        let cookie_only = Request::new(Method::GET, "/").with_header("cookie", "name=cookie");
        let arg = binder.bind(&cookie_only, &param).unwrap();
        assert_eq!(arg.as_text(), Some("cookie"));
    }

    #[test]
    fn values_convert_to_the_declared_kind() {
        let binder = Binder::new();
        let req = Request::new(Method::GET, "/?n=42&f=2.5&b=true");

        assert_eq!(binder.bind(&req, &ParamSpec::int("n")).unwrap().as_int(), Some(42));
        assert_eq!(binder.bind(&req, &ParamSpec::float("f")).unwrap().as_float(), Some(2.5));
        assert_eq!(binder.bind(&req, &ParamSpec::bool("b")).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn conversion_failure_is_an_error() {
        let binder = Binder::new();
        let req = Request::new(Method::GET, "/?n=forty-two");
        let err = binder.bind(&req, &ParamSpec::int("n")).unwrap_err();
        assert!(err.to_string().contains("`n`"));
    }

    #[test]
    fn unresolved_parameter_is_an_error() {
        let binder = Binder::new();
        let req = Request::new(Method::GET, "/");
        let err = binder.bind(&req, &ParamSpec::text("ghost")).unwrap_err();
        assert!(err.to_string().contains("`ghost`"));
    }

    #[test]
    fn request_parameters_bind_by_type() {
        let binder = Binder::new();
        let req = Request::new(Method::GET, "/somewhere");
        let arg = binder.bind(&req, &ParamSpec::request("req")).unwrap();
        assert_eq!(arg.as_request().map(Request::path), Some("/somewhere"));
    }

    struct FixedSource;

    impl BindSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn resolve(&self, _request: &Request, param: &ParamSpec) -> Option<BindValue> {
            Some(BindValue::Raw(format!("fixed-{}", param.name())))
        }
    }

    #[test]
    fn custom_sources_run_after_the_built_ins() {
        let mut binder = Binder::new();
        binder.push_source(FixedSource);

        // Built-in priority undisturbed: the query still wins.
        let req = Request::new(Method::GET, "/?name=query");
        assert_eq!(binder.bind(&req, &ParamSpec::text("name")).unwrap().as_text(), Some("query"));

        // With nothing else to answer, the appended source does.
        let bare = Request::new(Method::GET, "/");
        assert_eq!(
            binder.bind(&bare, &ParamSpec::text("name")).unwrap().as_text(),
            Some("fixed-name"),
        );
    }
}
