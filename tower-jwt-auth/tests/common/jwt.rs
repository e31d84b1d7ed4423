use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

pub const SECRET: &[u8] = b"secret";

#[derive(Clone, Debug)]
pub struct JwtBuilder {
    secret: Vec<u8>,
    alg: Algorithm,
    kid: Option<String>,
    iss: Option<String>,
    sub: Option<String>,
    aud: Option<String>,
    nbf: Option<u64>,
    exp: Option<u64>,
    custom_claims: Vec<(String, Value)>,
}

impl JwtBuilder {
    pub fn new() -> Self {
        JwtBuilder::default()
    }

    /// The token used throughout the tests: `John Doe`, an admin.
    pub fn john_doe() -> Self {
        Self::new()
            .subject("1234567890")
            .custom_claim("name", json!("John Doe"))
            .custom_claim("admin", json!(true))
    }

    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = secret.to_vec();
        self
    }

    pub fn alg(mut self, alg: Algorithm) -> Self {
        self.alg = alg;
        self
    }

    pub fn kid<S: Into<String>>(mut self, kid: S) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn iss<S: Into<String>>(mut self, iss: S) -> Self {
        self.iss = Some(iss.into());
        self
    }

    pub fn subject<S: Into<String>>(mut self, sub: S) -> Self {
        self.sub = Some(sub.into());
        self
    }

    pub fn aud<S: Into<String>>(mut self, aud: S) -> Self {
        self.aud = Some(aud.into());
        self
    }

    pub fn nbf(mut self, nbf: u64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    pub fn exp(mut self, exp: u64) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn custom_claim<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.custom_claims.push((key.into(), value));
        self
    }

    pub fn build(&self) -> String {
        let mut header = Header::new(self.alg);
        header.kid = self.kid.clone();

        let mut claims = json!({});

        if let Some(ref iss) = self.iss {
            claims["iss"] = json!(iss);
        }
        if let Some(ref sub) = self.sub {
            claims["sub"] = json!(sub);
        }
        if let Some(ref aud) = self.aud {
            claims["aud"] = json!(aud);
        }
        if let Some(nbf) = self.nbf {
            claims["nbf"] = json!(nbf);
        }
        if let Some(exp) = self.exp {
            claims["exp"] = json!(exp);
        }

        for (key, value) in &self.custom_claims {
            claims[key] = value.clone();
        }

        encode(&header, &claims, &EncodingKey::from_secret(&self.secret)).unwrap()
    }
}

impl Default for JwtBuilder {
    fn default() -> Self {
        JwtBuilder {
            secret: SECRET.to_vec(),
            alg: Algorithm::HS256,
            kid: None,
            iss: None,
            sub: None,
            aud: None,
            nbf: None,
            exp: None,
            custom_claims: Vec::new(),
        }
    }
}
