use std::collections::HashMap;

use http::{header::COOKIE, request::Parts, HeaderValue};
use url::form_urlencoded;

/// Path parameters captured by the router.
///
/// Routers keep matched path parameters to themselves, so whatever sits in
/// front of this middleware (or the router, via a route layer) is expected
/// to insert them as a request extension for `param:` lookups to work.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for PathParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Fields of an `application/x-www-form-urlencoded` request body.
///
/// When a field occurs more than once the first occurrence is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        let mut fields = HashMap::new();
        for (name, value) in form_urlencoded::parse(body) {
            fields
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self(fields)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Read-only view of the request handed to extractors, parsers, hooks
/// and context aware error handlers.
#[derive(Clone, Copy, Debug)]
pub struct RequestContext<'a> {
    parts: &'a Parts,
    form: Option<&'a FormFields>,
}

impl<'a> RequestContext<'a> {
    pub fn new(parts: &'a Parts, form: Option<&'a FormFields>) -> Self {
        Self { parts, form }
    }

    pub fn parts(&self) -> &'a Parts {
        self.parts
    }

    pub fn headers(&self, name: &str) -> impl Iterator<Item = &'a HeaderValue> {
        self.parts.headers.get_all(name).iter()
    }

    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.parts.uri.query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.parts.extensions.get::<PathParams>()?.get(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&'a str> {
        self.headers(COOKIE.as_str())
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim())
    }

    /// Only populated when the body was buffered, i.e. when a `form:` lookup
    /// is configured and the request carries a urlencoded body.
    pub fn form(&self, name: &str) -> Option<&'a str> {
        self.form?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use http::Request;

    use super::*;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn query_is_decoded() {
        let parts = parts(Request::get("/?a=b&jwt=x%2Ey&jwt=second").body(()).unwrap());
        let ctx = RequestContext::new(&parts, None);
        assert_eq!(ctx.query("jwt").as_deref(), Some("x.y"));
        assert_eq!(ctx.query("a").as_deref(), Some("b"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn cookie_across_headers() {
        let parts = parts(
            Request::get("/")
                .header(COOKIE, "theme=dark; lang=en")
                .header(COOKIE, "jwt=abc.def.ghi")
                .body(())
                .unwrap(),
        );
        let ctx = RequestContext::new(&parts, None);
        assert_eq!(ctx.cookie("lang"), Some("en"));
        assert_eq!(ctx.cookie("jwt"), Some("abc.def.ghi"));
        assert_eq!(ctx.cookie("session"), None);
    }

    #[test]
    fn param_from_extension() {
        let mut request = Request::get("/users/7").body(()).unwrap();
        request
            .extensions_mut()
            .insert(PathParams::new().insert("id", "7"));
        let parts = parts(request);
        let ctx = RequestContext::new(&parts, None);
        assert_eq!(ctx.param("id"), Some("7"));
        assert_eq!(ctx.param("jwt"), None);
    }

    #[test]
    fn form_keeps_first_value() {
        let form = FormFields::parse(b"jwt=first&jwt=second&name=a+b");
        let parts = parts(Request::post("/").body(()).unwrap());
        let ctx = RequestContext::new(&parts, Some(&form));
        assert_eq!(ctx.form("jwt"), Some("first"));
        assert_eq!(ctx.form("name"), Some("a b"));

        let without_form = RequestContext::new(&parts, None);
        assert_eq!(without_form.form("jwt"), None);
    }
}
