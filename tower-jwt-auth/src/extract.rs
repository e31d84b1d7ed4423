use http::HeaderValue;

use crate::{
    context::RequestContext,
    credential::RawCredential,
    error::AuthError,
    lookup::{LookupChain, TokenLookup, TokenSource},
};

/// Locates the raw credential of a request.
pub trait TokenExtractor: Send + Sync {
    fn extract(&self, request: &RequestContext<'_>) -> Result<RawCredential, AuthError>;

    /// The form field lookup of the extractor, if it has one.
    fn form_lookup(&self) -> Option<&TokenLookup> {
        None
    }

    /// Whether extraction from `request`, which carries no form fields yet,
    /// would consult the form lookup. Only then does the middleware buffer
    /// urlencoded request bodies.
    fn reads_form(&self, _request: &RequestContext<'_>) -> bool {
        self.form_lookup().is_some()
    }
}

/// Walks a [LookupChain] in order and returns the first non-empty value.
///
/// A header that is present but does not carry `<scheme> <token>` ends the
/// walk with [AuthError::MalformedCredential]; it is never skipped in favour
/// of a later source.
#[derive(Clone, Debug)]
pub struct LookupExtractor {
    lookups: LookupChain,
    auth_scheme: String,
}

impl LookupExtractor {
    pub fn new(lookups: LookupChain, auth_scheme: impl Into<String>) -> Self {
        Self {
            lookups,
            auth_scheme: auth_scheme.into(),
        }
    }

    fn lookup(
        &self,
        lookup: &TokenLookup,
        request: &RequestContext<'_>,
    ) -> Result<Option<String>, AuthError> {
        let value = match lookup.source {
            TokenSource::Header => return self.from_header(lookup, request),
            TokenSource::Query => request.query(&lookup.name),
            TokenSource::Param => request.param(&lookup.name).map(str::to_owned),
            TokenSource::Cookie => request.cookie(&lookup.name).map(str::to_owned),
            TokenSource::Form => request.form(&lookup.name).map(str::to_owned),
        };
        Ok(value.filter(|v| !v.is_empty()))
    }

    fn from_header(
        &self,
        lookup: &TokenLookup,
        request: &RequestContext<'_>,
    ) -> Result<Option<String>, AuthError> {
        // Only the first value counts, later ones never replace a malformed one.
        let Some(value) = request
            .headers(&lookup.name)
            .find(|value| !value.is_empty())
        else {
            return Ok(None);
        };
        strip_scheme(value, &self.auth_scheme)
            .map(|token| Some(token.to_owned()))
            .ok_or_else(|| AuthError::MalformedCredential(lookup.clone()))
    }
}

impl TokenExtractor for LookupExtractor {
    fn extract(&self, request: &RequestContext<'_>) -> Result<RawCredential, AuthError> {
        for lookup in self.lookups.iter() {
            if let Some(token) = self.lookup(lookup, request)? {
                return Ok(RawCredential::new(token, lookup.clone()));
            }
        }
        Err(AuthError::MissingCredential)
    }

    fn form_lookup(&self) -> Option<&TokenLookup> {
        self.lookups.find_source(TokenSource::Form)
    }

    /// `true` when every lookup ahead of the first form lookup comes up empty.
    fn reads_form(&self, request: &RequestContext<'_>) -> bool {
        for lookup in self.lookups.iter() {
            if lookup.source == TokenSource::Form {
                return true;
            }
            if !matches!(self.lookup(lookup, request), Ok(None)) {
                return false;
            }
        }
        false
    }
}

/// `Bearer abc` -> `abc`, scheme compared case-insensitively.
/// An empty scheme takes the whole value as token.
fn strip_scheme<'v>(value: &'v HeaderValue, scheme: &str) -> Option<&'v str> {
    let value = value.to_str().ok()?;
    let token = if scheme.is_empty() {
        value
    } else {
        let prefix = value.get(..scheme.len())?;
        if !prefix.eq_ignore_ascii_case(scheme) {
            return None;
        }
        value[scheme.len()..].strip_prefix(' ')?
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use http::{header::AUTHORIZATION, header::COOKIE, request::Parts, Request};

    use super::*;
    use crate::context::{FormFields, PathParams};

    fn extractor(lookups: &str) -> LookupExtractor {
        LookupExtractor::new(lookups.parse().unwrap(), "Bearer")
    }

    fn parts(request: http::request::Builder) -> Parts {
        request.body(()).unwrap().into_parts().0
    }

    fn extract(extractor: &LookupExtractor, parts: &Parts) -> Result<RawCredential, AuthError> {
        extractor.extract(&RequestContext::new(parts, None))
    }

    #[test]
    fn missing_authorization() {
        let parts = parts(Request::get("/"));
        let result = extract(&extractor("header:Authorization"), &parts);

        assert_eq!(result.unwrap_err(), AuthError::MissingCredential);
    }

    #[test]
    fn wrong_scheme() {
        let parts = parts(Request::get("/").header(AUTHORIZATION, "Boarer XXX"));
        let result = extract(&extractor("header:Authorization"), &parts);

        assert_eq!(
            result.unwrap_err(),
            AuthError::MalformedCredential(TokenLookup::new(TokenSource::Header, "Authorization"))
        );
    }

    #[test]
    fn no_scheme_separator() {
        let parts = parts(Request::get("/").header(AUTHORIZATION, "invalid-format"));
        let result = extract(&extractor("header:Authorization"), &parts);

        assert!(matches!(
            result.unwrap_err(),
            AuthError::MalformedCredential(_)
        ));
    }

    #[test]
    fn empty_token_after_scheme() {
        let parts = parts(Request::get("/").header(AUTHORIZATION, "Bearer "));
        let result = extract(&extractor("header:Authorization"), &parts);

        assert!(matches!(
            result.unwrap_err(),
            AuthError::MalformedCredential(_)
        ));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let parts = parts(Request::get("/").header(AUTHORIZATION, "bearer XXX"));
        let credential = extract(&extractor("header:Authorization"), &parts).unwrap();

        assert_eq!(credential.as_str(), "XXX");
    }

    #[test]
    fn custom_scheme() {
        let extractor = LookupExtractor::new("header:Authorization".parse().unwrap(), "Token");
        let parts = parts(Request::get("/").header(AUTHORIZATION, "Token XXX"));

        assert_eq!(extract(&extractor, &parts).unwrap().as_str(), "XXX");
    }

    #[test]
    fn empty_scheme_takes_raw_value() {
        let extractor = LookupExtractor::new("header:X-Api-Token".parse().unwrap(), "");
        let parts = parts(Request::get("/").header("X-Api-Token", "XXX"));

        assert_eq!(extract(&extractor, &parts).unwrap().as_str(), "XXX");
    }

    #[test]
    fn malformed_header_is_not_skipped() {
        let parts = parts(
            Request::get("/?jwt=from-query").header(AUTHORIZATION, "Basic dXNlcjpwYXNz"),
        );
        let result = extract(&extractor("header:Authorization,query:jwt"), &parts);

        assert!(matches!(
            result.unwrap_err(),
            AuthError::MalformedCredential(_)
        ));
    }

    #[test]
    fn only_first_header_value_counts() {
        let malformed_first = parts(
            Request::get("/")
                .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .header(AUTHORIZATION, "Bearer XXX"),
        );
        let result = extract(&extractor("header:Authorization"), &malformed_first);

        assert_eq!(
            result.unwrap_err(),
            AuthError::MalformedCredential(TokenLookup::new(TokenSource::Header, "Authorization"))
        );

        let valid_first = parts(
            Request::get("/")
                .header(AUTHORIZATION, "Bearer XXX")
                .header(AUTHORIZATION, "Bearer YYY"),
        );
        let credential = extract(&extractor("header:Authorization"), &valid_first).unwrap();
        assert_eq!(credential.as_str(), "XXX");
    }

    #[test]
    fn absent_header_falls_through() {
        let parts = parts(Request::get("/?jwt=from-query"));
        let credential = extract(&extractor("header:Authorization,query:jwt"), &parts).unwrap();

        assert_eq!(credential.as_str(), "from-query");
        assert_eq!(credential.lookup().source, TokenSource::Query);
    }

    #[test]
    fn first_source_wins() {
        let parts = parts(
            Request::get("/?jwt=from-query")
                .header(COOKIE, "jwt=from-cookie")
                .header(AUTHORIZATION, "Bearer from-header"),
        );

        let credential = extract(&extractor("query:jwt,cookie:jwt,header:Authorization"), &parts)
            .unwrap();
        assert_eq!(credential.as_str(), "from-query");

        let credential = extract(&extractor("cookie:jwt,query:jwt"), &parts).unwrap();
        assert_eq!(credential.as_str(), "from-cookie");

        let credential = extract(&extractor("header:Authorization,query:jwt"), &parts).unwrap();
        assert_eq!(credential.as_str(), "from-header");
    }

    #[test]
    fn empty_values_fall_through() {
        let parts = parts(Request::get("/?jwt=").header(COOKIE, "jwt=from-cookie"));
        let credential = extract(&extractor("query:jwt,cookie:jwt"), &parts).unwrap();

        assert_eq!(credential.as_str(), "from-cookie");
    }

    #[test]
    fn wrong_query_name() {
        let parts = parts(Request::get("/?a=b&jwtxyz=token"));
        let result = extract(&extractor("query:jwt"), &parts);

        assert_eq!(result.unwrap_err(), AuthError::MissingCredential);
    }

    #[test]
    fn path_param() {
        let mut request = Request::get("/token").body(()).unwrap();
        request
            .extensions_mut()
            .insert(PathParams::new().insert("jwt", "token"));
        let parts = request.into_parts().0;

        let credential = extract(&extractor("param:jwt"), &parts).unwrap();
        assert_eq!(credential.as_str(), "token");
    }

    #[test]
    fn earlier_source_spares_form() {
        let chain = extractor("header:Authorization,form:jwt,query:jwt");

        let with_header = parts(Request::post("/").header(AUTHORIZATION, "Bearer XXX"));
        assert!(!chain.reads_form(&RequestContext::new(&with_header, None)));

        let malformed_header = parts(Request::post("/").header(AUTHORIZATION, "invalid-format"));
        assert!(!chain.reads_form(&RequestContext::new(&malformed_header, None)));

        let without_header = parts(Request::post("/?jwt=from-query"));
        assert!(chain.reads_form(&RequestContext::new(&without_header, None)));

        assert!(!extractor("query:jwt")
            .reads_form(&RequestContext::new(&without_header, None)));
    }

    #[test]
    fn form_field() {
        let extractor = extractor("form:jwt");
        let parts = parts(Request::post("/"));
        let form = FormFields::parse(b"jwt=token");

        assert!(extractor.form_lookup().is_some());
        assert!(extractor.reads_form(&RequestContext::new(&parts, None)));
        let credential = extractor
            .extract(&RequestContext::new(&parts, Some(&form)))
            .unwrap();
        assert_eq!(credential.as_str(), "token");
        assert_eq!(
            extractor
                .extract(&RequestContext::new(&parts, None))
                .unwrap_err(),
            AuthError::MissingCredential
        );
    }
}
