#![doc = include_str!("../README.md")]

/// Builder used to construct a [JwtAuth](crate::middleware::JwtAuth) instance.
///
/// For further information on the different properties,
/// see [JwtAuthBuilder](crate::builder::JwtAuthBuilder).
///
/// # Example using [MapClaims](crate::claims::MapClaims)
///
/// ```
/// use jsonwebtoken::DecodingKey;
/// use tower_jwt_auth::middleware::JwtAuth;
///
/// let jwt_auth = <JwtAuth>::builder()
///     .signing_key(DecodingKey::from_secret(b"secret"))
///     .token_lookup("header:Authorization,cookie:jwt")
///     .build()
///     .expect("Failed to build JWT middleware");
/// ```
///
/// # Example using custom claims implementation
///
/// ```
/// use jsonwebtoken::DecodingKey;
/// use serde::Deserialize;
/// use tower_jwt_auth::{claims::VerifiedToken, middleware::JwtAuth};
///
/// #[derive(Clone, Debug, Deserialize)]
/// struct MyClaims {
///     pub sub: String,
///     pub admin: bool,
/// }
///
/// let jwt_auth = JwtAuth::<VerifiedToken<MyClaims>>::builder()
///     .signing_key(DecodingKey::from_secret(b"secret"))
///     .build()
///     .expect("Failed to build JWT middleware");
/// ```
pub mod builder;

/// Claims types and the [VerifiedToken](crate::claims::VerifiedToken)
/// stored for downstream handlers.
///
/// If you need other claims, an own struct can be provided
/// to [JwtAuth](crate::middleware::JwtAuth) as a generic parameter.
pub mod claims;

/// Read-only view of a request, as seen by extractors, parsers and hooks.
pub mod context;

/// [RawCredential](crate::credential::RawCredential) is a located,
/// not yet verified token.
///
/// Key resolvers and custom parsers may inspect its header.
pub mod credential;

pub mod error;

/// Mapping of authentication failures to responses.
///
/// Failures are mapped by the [DefaultErrorHandler](crate::error_handler::DefaultErrorHandler)
/// unless an [ErrorHandler](crate::error_handler::ErrorHandler) or a
/// [ContextErrorHandler](crate::error_handler::ContextErrorHandler) is
/// provided when creating the layer.
pub mod error_handler;

pub mod extract;

/// [KeyResolver](crate::key::KeyResolver) selects the key a token is
/// verified with.
///
/// A single key, a set of keys by `kid` (optionally fetched from a JWKS
/// endpoint) and a closure are supported out of the box.
pub mod key;

/// The actual tower middleware
///
/// Contains implementations of [Service](https://docs.rs/tower/latest/tower/trait.Service.html)
/// and [Layer](https://docs.rs/tower/latest/tower/trait.Layer.html)
/// from the tower library.
///
/// You shouldn't need to interact with these implementations, more than
/// calling [JwtAuth::into_layer()](crate::middleware::JwtAuth::into_layer).
pub mod layer;

pub mod lookup;

/// [JwtAuth](crate::middleware::JwtAuth) is what underpins the tower
/// middleware, and actually locates and verifies credentials.
///
/// It is cheap to clone, so a single instance may be shared between
/// the different routes where authentication is needed.
pub mod middleware;

/// [TokenParser](crate::parse::TokenParser) turns a credential into an identity.
pub mod parse;

pub mod settings;

/// [ClaimsValidationSpec](crate::validation::ClaimsValidationSpec) is used to
/// optionally customize what claims that are required in incoming JWTs.
///
/// Provided when constructing a [JwtAuth](crate::middleware::JwtAuth)
/// via [claims_validation](crate::builder::JwtAuthBuilder::claims_validation).
pub mod validation;
